use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sabana_common::error::AppError;
use sabana_common::types::CalculatedEvent;

use crate::sql::MERGE_SQL;

/// The body of the scheduled task.
///
/// Returns the number of target rows touched. Any error fails the run.
#[async_trait]
pub trait MergeJob: Send + Sync {
    async fn execute(&self) -> Result<u64, AppError>;
}

/// Runs [`MERGE_SQL`] against the warehouse.
#[derive(Clone)]
pub struct SqlMergeJob {
    pool: PgPool,
}

impl SqlMergeJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a single row of the calculated-events table.
    pub async fn load_event(
        &self,
        event_url: &str,
        event_time: DateTime<Utc>,
    ) -> Result<Option<CalculatedEvent>, AppError> {
        let row = sqlx::query_as::<_, CalculatedEvent>(
            r#"
            SELECT event_url, event_time, event_name, group_name, city_name, category_name,
                   yes_rsvp_count, rsvp_limit, fill_rate_pct::float8 AS fill_rate_pct, load_ts
            FROM data_gld.sbn_calculated_events
            WHERE event_url = $1 AND event_time = $2
            "#,
        )
        .bind(event_url)
        .bind(event_time)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl MergeJob for SqlMergeJob {
    async fn execute(&self) -> Result<u64, AppError> {
        let result = sqlx::query(MERGE_SQL).execute(&self.pool).await?;
        let rows = result.rows_affected();

        tracing::info!(rows_affected = rows, "Calculated events merged");
        Ok(rows)
    }
}
