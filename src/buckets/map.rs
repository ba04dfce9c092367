use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};
use tracing_log::log::warn;

use super::{reset_date, step, BucketError, BucketUnit, TimeRange};

/// What to do with a timestamp whose bucket was not generated up front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignPolicy {
    /// Fail the whole assignment; no count is changed.
    #[default]
    Reject,
    /// Add the missing bucket, widening the histogram.
    Extend,
}

/// One rendered bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRow<Tz: TimeZone> {
    pub date: DateTime<Tz>,
    pub count: u64,
}

/// Counts keyed by bucket start, ordered chronologically.
///
/// Every key is a boundary of `unit`.
#[derive(Debug, Clone)]
pub struct BucketMap<Tz: TimeZone> {
    unit: BucketUnit,
    counts: BTreeMap<DateTime<Tz>, u64>,
}

impl<Tz: TimeZone> BucketMap<Tz> {
    /// A map with no buckets.
    #[must_use]
    pub fn empty(unit: BucketUnit) -> Self {
        Self {
            unit,
            counts: BTreeMap::new(),
        }
    }

    /// Generate zeroed buckets from the bucket containing `range.from` up to
    /// and including the last boundary not after `range.to`.
    ///
    /// # Errors
    /// Will return an error if a boundary cannot be represented in the time zone.
    pub fn generate(range: &TimeRange<Tz>, unit: BucketUnit) -> Result<Self, BucketError> {
        let mut map = Self::empty(unit);
        if range.is_empty() {
            return Ok(map);
        }

        let mut current = reset_date(&range.from, unit)?;
        while current <= range.to {
            let next = step(&current, unit)?;
            if next <= current {
                return Err(BucketError::InvalidLocalTime(current.naive_local().to_string()));
            }
            map.counts.insert(current, 0);
            current = next;
        }

        Ok(map)
    }

    /// Count each timestamp into the bucket that contains it.
    ///
    /// With [`AssignPolicy::Reject`] the map is left untouched when any
    /// timestamp lands outside the generated buckets.
    ///
    /// # Errors
    /// Will return [`BucketError::OutOfRange`] under [`AssignPolicy::Reject`],
    /// or an error if a timestamp cannot be truncated.
    pub fn assign<'a, I>(&mut self, timestamps: I, policy: AssignPolicy) -> Result<(), BucketError>
    where
        I: IntoIterator<Item = &'a DateTime<Tz>>,
        Tz: 'a,
    {
        let mut keys = Vec::new();
        for timestamp in timestamps {
            let key = reset_date(timestamp, self.unit)?;
            if policy == AssignPolicy::Reject && !self.counts.contains_key(&key) {
                return Err(BucketError::OutOfRange {
                    timestamp: timestamp.naive_local().to_string(),
                    bucket: key.naive_local().to_string(),
                });
            }
            keys.push(key);
        }

        for key in keys {
            let count = self.counts.entry(key).or_insert_with(|| {
                warn!("Extending histogram with a bucket outside the requested range");
                0
            });
            *count += 1;
        }

        Ok(())
    }

    #[must_use]
    pub fn unit(&self) -> BucketUnit {
        self.unit
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[must_use]
    pub fn get(&self, bucket: &DateTime<Tz>) -> Option<u64> {
        self.counts.get(bucket).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DateTime<Tz>> {
        self.counts.keys()
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The buckets in chronological order.
    #[must_use]
    pub fn rows(&self) -> Vec<BucketRow<Tz>> {
        self.counts
            .iter()
            .map(|(date, count)| BucketRow {
                date: date.clone(),
                count: *count,
            })
            .collect()
    }
}

impl<Tz: TimeZone> BucketMap<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    /// The buckets in chronological order, keyed by their RFC 3339 start.
    #[must_use]
    pub fn to_rfc3339_rows(&self) -> Vec<(String, u64)> {
        self.counts
            .iter()
            .map(|(date, count)| (date.to_rfc3339_opts(SecondsFormat::Secs, true), *count))
            .collect()
    }
}

/// Generate the zeroed buckets covering `range`.
///
/// # Errors
/// Will return an error if a boundary cannot be represented in the time zone.
pub fn generate_buckets<Tz: TimeZone>(range: &TimeRange<Tz>, unit: BucketUnit) -> Result<BucketMap<Tz>, BucketError> {
    BucketMap::generate(range, unit)
}

/// Count `timestamps` into `buckets` and hand the map back.
///
/// # Errors
/// Will return an error if a timestamp falls outside the buckets under
/// [`AssignPolicy::Reject`].
pub fn assign_to_buckets<Tz: TimeZone>(
    timestamps: &[DateTime<Tz>],
    mut buckets: BucketMap<Tz>,
    policy: AssignPolicy,
) -> Result<BucketMap<Tz>, BucketError> {
    buckets.assign(timestamps, policy)?;
    Ok(buckets)
}

// -- Tests ----------------------------------------------------------------------------
