//! # FreelaCRM Shared Library
//!
//! Domain types, persistence and business rules behind the FreelaCRM API.
//!
//! ## Module Organization
//!
//! - `models`: records and their PostgreSQL queries
//! - `store`: storage traits with PostgreSQL and in-memory implementations
//! - `auth`: password hashing, session tokens, reset tokens and ownership
//! - `quota`: plan ceilings on clients and tasks
//! - `services`: sessions, password resets, clients, tasks and payments
//! - `notify`: outbound mail
//! - `db`: connection pool and migrations
//! - `error`: service error type

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod quota;
pub mod services;
pub mod store;

/// Current version of the FreelaCRM shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
