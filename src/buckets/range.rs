use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// An inclusive span of time to bucket over.
///
/// A range whose `from` is after its `to` is empty and yields no buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "DateTime<Tz>: Serialize",
    deserialize = "DateTime<Tz>: Deserialize<'de>"
))]
pub struct TimeRange<Tz: TimeZone> {
    pub from: DateTime<Tz>,
    pub to: DateTime<Tz>,
}

impl<Tz: TimeZone> TimeRange<Tz> {
    #[must_use]
    pub fn new(from: DateTime<Tz>, to: DateTime<Tz>) -> Self {
        Self { from, to }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    #[must_use]
    pub fn contains(&self, date: &DateTime<Tz>) -> bool {
        &self.from <= date && date <= &self.to
    }

    /// The smallest range covering every timestamp, or `None` when there are none.
    ///
    /// The input does not need to be sorted.
    pub fn spanning<'a, I>(timestamps: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a DateTime<Tz>>,
        Tz: 'a,
    {
        let mut timestamps = timestamps.into_iter();
        let first = timestamps.next()?;
        let (from, to) = timestamps.fold((first, first), |(min, max), date| {
            (if date < min { date } else { min }, if date > max { date } else { max })
        });

        Some(Self::new(from.clone(), to.clone()))
    }

    /// The range to bucket over for a query.
    ///
    /// Unless `omit_time` is set, the requested range is replaced by the span of
    /// the timestamps actually present, so the histogram starts at the first
    /// event and ends at the last one.
    #[must_use]
    pub fn effective(self, omit_time: bool, timestamps: &[DateTime<Tz>]) -> Self {
        if omit_time {
            return self;
        }

        Self::spanning(timestamps).unwrap_or(self)
    }
}

// -- Tests ----------------------------------------------------------------------------
