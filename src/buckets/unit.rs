use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::BucketError;

/// The width of a bucket.
///
/// Parses from the singular (`day`) and plural (`days`) spellings; anything
/// else is rejected with [`BucketError::UnknownUnit`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum BucketUnit {
    #[strum(to_string = "hour", serialize = "hours")]
    Hour,
    #[strum(to_string = "day", serialize = "days")]
    Day,
    #[strum(to_string = "week", serialize = "weeks")]
    Week,
    #[strum(to_string = "month", serialize = "months")]
    Month,
    #[strum(to_string = "year", serialize = "years")]
    Year,
}

impl BucketUnit {
    /// Parse a unit name, keeping the rejected value in the error.
    ///
    /// # Errors
    /// Will return [`BucketError::UnknownUnit`] for anything outside the five units.
    pub fn parse(value: &str) -> Result<Self, BucketError> {
        BucketUnit::from_str(value.trim()).map_err(|_| BucketError::UnknownUnit(value.to_string()))
    }
}

impl TryFrom<String> for BucketUnit {
    type Error = BucketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BucketUnit::parse(&value)
    }
}

/// Truncate `date` down to the start of the bucket that contains it.
///
/// Week buckets start on Monday at midnight. Day, week, month and year
/// boundaries are local midnights in the time zone of `date`.
///
/// # Errors
/// Will return [`BucketError::InvalidLocalTime`] when the boundary does not
/// exist in the time zone (a midnight skipped by a daylight saving change).
pub fn reset_date<Tz: TimeZone>(date: &DateTime<Tz>, unit: BucketUnit) -> Result<DateTime<Tz>, BucketError> {
    if unit == BucketUnit::Hour {
        // Subtract within the hour so the offset of the input is kept.
        let into_hour = TimeDelta::seconds(i64::from(date.minute() * 60 + date.second()))
            + TimeDelta::nanoseconds(i64::from(date.nanosecond()));
        return date
            .clone()
            .checked_sub_signed(into_hour)
            .ok_or_else(|| BucketError::InvalidLocalTime(date.naive_local().to_string()));
    }

    let local = date.naive_local().date();
    let start = match unit {
        BucketUnit::Week => local.checked_sub_days(Days::new(u64::from(local.weekday().num_days_from_monday()))),
        BucketUnit::Month => local.with_day(1),
        BucketUnit::Year => NaiveDate::from_ymd_opt(local.year(), 1, 1),
        BucketUnit::Day | BucketUnit::Hour => Some(local),
    };

    let midnight = start
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .ok_or_else(|| BucketError::InvalidLocalTime(local.to_string()))?;

    resolve_local(&date.timezone(), &midnight)
}

/// Advance a bucket boundary by one unit.
///
/// Hours are a fixed duration; days, weeks, months and years are calendar
/// steps on the local date so that daylight saving changes and month lengths
/// are respected.
///
/// # Errors
/// Will return [`BucketError::InvalidLocalTime`] if the next boundary is out of
/// range or does not exist in the time zone.
pub fn step<Tz: TimeZone>(date: &DateTime<Tz>, unit: BucketUnit) -> Result<DateTime<Tz>, BucketError> {
    let local = date.naive_local();
    let next = match unit {
        BucketUnit::Hour => {
            return date
                .clone()
                .checked_add_signed(TimeDelta::hours(1))
                .ok_or_else(|| BucketError::InvalidLocalTime(local.to_string()));
        }
        BucketUnit::Day => local.checked_add_days(Days::new(1)),
        BucketUnit::Week => local.checked_add_days(Days::new(7)),
        BucketUnit::Month => local.checked_add_months(Months::new(1)),
        BucketUnit::Year => local.checked_add_months(Months::new(12)),
    }
    .ok_or_else(|| BucketError::InvalidLocalTime(local.to_string()))?;

    resolve_local(&date.timezone(), &next)
}

// Map a local wall-clock time back into the time zone, taking the earlier
// instant when the local time is ambiguous.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: &NaiveDateTime) -> Result<DateTime<Tz>, BucketError> {
    tz.from_local_datetime(local)
        .earliest()
        .ok_or_else(|| BucketError::InvalidLocalTime(local.to_string()))
}

// -- Tests ----------------------------------------------------------------------------
