/// PostgreSQL plumbing: connection pool and embedded migrations
///
/// Only the binary touches this module directly. Everything else goes through
/// [`crate::store::PgStore`].
///
/// ```no_run
/// use freelacrm_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

pub mod migrations;
pub mod pool;
