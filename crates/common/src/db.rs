use std::str::FromStr;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::error::AppError;

/// Name the pipeline's sessions show up under in `pg_stat_activity`.
const APPLICATION_NAME: &str = "sabana-runner";

/// Connect to the warehouse behind the logical connection `conn_id`.
///
/// The merge runs once per slot, so the pool stays small; idle connections are
/// closed between runs instead of being held for the whole interval.
pub async fn create_pool(
    conn_id: &str,
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, AppError> {
    let options = PgConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Config(format!("invalid URL for connection '{conn_id}': {e}")))?
        .application_name(APPLICATION_NAME);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .connect_with(options)
        .await?;

    tracing::info!(conn_id, max_connections, "Connected to warehouse");
    Ok(pool)
}
