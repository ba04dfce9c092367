//! Query descriptions
//!
//! A batch of [`DataQuery`] values is what a caller hands to
//! [`crate::datasource::Datasource::query_data`]; each one is answered under
//! its own `ref_id`.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::buckets::{BucketUnit, TimeRange};

/// Which issue timestamp a histogram counts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    Created,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// One row per issue.
    #[serde(alias = "issues_all")]
    Issues,
    /// Histogram of creation dates.
    IssuesCreated,
    /// Histogram of closing dates.
    IssuesClosed,
    /// One row per repository label.
    Labels,
}

impl QueryType {
    #[must_use]
    pub fn date_field(self) -> Option<DateField> {
        match self {
            QueryType::IssuesCreated => Some(DateField::Created),
            QueryType::IssuesClosed => Some(DateField::Closed),
            QueryType::Issues | QueryType::Labels => None,
        }
    }
}

/// How a histogram query is displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuesQueryOptions {
    #[serde(default)]
    pub date_display: Option<BucketUnit>,
    /// Overrides the timestamp implied by the query type.
    #[serde(default)]
    pub date_field: Option<DateField>,
    /// Keep the requested time range instead of spanning the data.
    #[serde(default)]
    pub omit_time: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    pub ref_id: String,
    pub query_type: QueryType,
    #[serde(default)]
    pub time_range: Option<TimeRange<Utc>>,
    #[serde(flatten)]
    pub options: IssuesQueryOptions,
    /// Search terms added to the configured ones.
    #[serde(default)]
    pub terms: Vec<String>,
}

impl DataQuery {
    /// The requested range, or the six months up to `now`.
    #[must_use]
    pub fn time_range_or_default(&self, now: DateTime<Utc>) -> TimeRange<Utc> {
        self.time_range
            .clone()
            .unwrap_or_else(|| default_time_range(now))
    }
}

#[must_use]
pub fn default_time_range(now: DateTime<Utc>) -> TimeRange<Utc> {
    let from = now.checked_sub_months(Months::new(6)).unwrap_or(now);
    TimeRange::new(from, now)
}

// -- Tests ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test::utc;

    #[test]
    fn batch_query_deserialises_from_camel_case_json() {
        let json = r#"{
            "refId": "A",
            "queryType": "issues_created",
            "timeRange": {"from": "2024-01-01T00:00:00Z", "to": "2024-03-01T00:00:00Z"},
            "dateDisplay": "weeks",
            "omitTime": true
        }"#;

        let query: DataQuery = serde_json::from_str(json).unwrap();

        assert_eq!(query.ref_id, "A");
        assert_eq!(query.query_type.date_field(), Some(DateField::Created));
        assert_eq!(query.options.date_display, Some(BucketUnit::Week));
        assert!(query.options.omit_time);
        assert_eq!(query.time_range.unwrap().to, utc("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn issues_all_is_an_alias_for_issues() {
        let query: DataQuery = serde_json::from_str(r#"{"refId": "B", "queryType": "issues_all"}"#).unwrap();

        assert_eq!(query.query_type, QueryType::Issues);
        assert_eq!(query.options, IssuesQueryOptions::default());
    }

    #[test]
    fn date_field_option_is_read() {
        let query: DataQuery = serde_json::from_str(
            r#"{"refId": "E", "queryType": "issues_created", "dateField": "closed", "dateDisplay": "day"}"#,
        )
        .unwrap();

        assert_eq!(query.options.date_field, Some(DateField::Closed));
    }

    #[test]
    fn unknown_date_display_is_rejected() {
        let result = serde_json::from_str::<DataQuery>(
            r#"{"refId": "C", "queryType": "issues_closed", "dateDisplay": "decade"}"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn default_range_is_the_last_six_months() {
        let query: DataQuery = serde_json::from_str(r#"{"refId": "D", "queryType": "labels"}"#).unwrap();

        let range = query.time_range_or_default(utc("2024-07-15T00:00:00Z"));

        assert_eq!(range.from, utc("2024-01-15T00:00:00Z"));
        assert_eq!(range.to, utc("2024-07-15T00:00:00Z"));
    }
}
