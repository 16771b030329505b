/// Database models for FreelaCRM
///
/// Each model owns its row type, its enums and the SQL that reads and writes
/// it. Services never talk to these directly; they go through the storage
/// traits in [`crate::store`].
///
/// # Models
///
/// - `user`: accounts, plans, status and reset-token state
/// - `client`: the freelancer's customers
/// - `task`: billable work items for a client
/// - `payment`: amounts owed or paid by a client
///
/// Every row carries a `deleted_at` soft-delete marker; queries here only ever
/// see live rows.

pub mod client;
pub mod payment;
pub mod task;
pub mod user;
