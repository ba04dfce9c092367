//! Date bucketing
//!
//! This module partitions a time range into uniform buckets (hour, day, week,
//! month or year) and counts how many timestamps fall into each of them.
//!
//! Bucket boundaries are computed in the time zone of the timestamps handed
//! in, so `DateTime<Utc>` buckets on UTC midnights and `DateTime<FixedOffset>`
//! or any other `TimeZone` buckets on local boundaries.

mod map;
mod range;
mod unit;

use thiserror::Error;

pub use map::{assign_to_buckets, generate_buckets, AssignPolicy, BucketMap, BucketRow};
pub use range::TimeRange;
pub use unit::{reset_date, step, BucketUnit};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BucketError {
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("missing bucket unit")]
    MissingUnit,

    #[error("unknown date field: {0}")]
    UnknownDateField(String),

    #[error("local time {0} does not exist in the time zone")]
    InvalidLocalTime(String),

    #[error("timestamp {timestamp} falls into bucket {bucket} outside the generated range")]
    OutOfRange { timestamp: String, bucket: String },
}
