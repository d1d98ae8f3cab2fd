pub mod schedule;
pub mod scheduler;
pub mod task;
