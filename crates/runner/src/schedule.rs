//! Cron schedule for the merge task.
//!
//! Accepts classic 5-field expressions (`MIN HOUR DOM MON DOW`, DOW 0-7 with
//! 0 and 7 = Sunday) and evaluates them in UTC with the `cron` crate, which
//! expects a leading seconds field and numbers weekdays 1-7 from Sunday.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use sabana_common::error::AppError;

const WEEKDAYS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// A parsed 5-field cron expression.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
}

impl CronSchedule {
    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }
}

impl FromStr for CronSchedule {
    type Err = AppError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(AppError::Schedule(format!(
                "invalid cron expression '{}' (need 5 fields: MIN HOUR DOM MON DOW)",
                expression
            )));
        }

        let day_of_week = weekday_field(parts[4])?;
        let with_seconds = format!(
            "0 {} {} {} {} {}",
            parts[0], parts[1], parts[2], parts[3], day_of_week
        );
        let schedule = Schedule::from_str(&with_seconds).map_err(|e| {
            AppError::Schedule(format!("invalid cron expression '{}': {}", expression, e))
        })?;

        Ok(Self {
            expression: parts.join(" "),
            schedule,
        })
    }
}

impl std::fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// Rewrite numeric weekdays as names so they mean the same thing to the
/// `cron` crate. Names and `*` pass through unchanged.
fn weekday_field(field: &str) -> Result<String, AppError> {
    let items = field
        .split(',')
        .map(|item| {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };

            let range = match range.split_once('-') {
                // "5-7" ends on Sunday, which the crate orders first
                Some((start, "7")) if step.is_none() && start != "0" && start != "7" => {
                    format!("{}-SAT,SUN", weekday_name(start)?)
                }
                Some((start, end)) => format!("{}-{}", weekday_name(start)?, weekday_name(end)?),
                None => weekday_name(range)?,
            };

            Ok(match step {
                Some(step) => format!("{}/{}", range, step),
                None => range,
            })
        })
        .collect::<Result<Vec<String>, AppError>>()?;

    Ok(items.join(","))
}

fn weekday_name(token: &str) -> Result<String, AppError> {
    match token.parse::<usize>() {
        Ok(n) if n <= 7 => Ok(WEEKDAYS[n % 7].to_string()),
        Ok(n) => Err(AppError::Schedule(format!(
            "day of week {} outside 0-7",
            n
        ))),
        Err(_) => Ok(token.to_string()),
    }
}
