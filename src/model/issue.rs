//! Models for the issue search endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DateField, Label};

#[derive(Deserialize, Debug)]
pub struct SearchIssuesResponse {
    pub items: Vec<Issue>,
}

#[allow(clippy::module_name_repetitions)]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Issue {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub state: String,
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub login: String,
}

impl Issue {
    /// The timestamp of `field`; open issues have no closed date.
    #[must_use]
    pub fn date(&self, field: DateField) -> Option<DateTime<Utc>> {
        match field {
            DateField::Created => Some(self.created_at),
            DateField::Closed => self.closed_at,
        }
    }

    #[must_use]
    pub fn label_names(&self) -> String {
        self.labels
            .iter()
            .map(|label| label.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Collect the `field` timestamps of `issues`, skipping issues without one.
#[must_use]
pub fn timestamps(issues: &[Issue], field: DateField) -> Vec<DateTime<Utc>> {
    issues.iter().filter_map(|issue| issue.date(field)).collect()
}

// -- Tests ----------------------------------------------------------------------------
