//! Materializes `data_gld.sbn_calculated_events` from the silver tables.
//!
//! The whole transformation lives in one idempotent MERGE statement; this
//! crate only owns the statement text and the seam used to execute it.

pub mod job;
pub mod sql;

pub use job::{MergeJob, SqlMergeJob};
pub use sql::MERGE_SQL;
