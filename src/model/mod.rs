//! Records decoded from the GitHub API and the queries run against them

pub mod issue;
pub mod label;
pub mod query;

pub use issue::{Issue, SearchIssuesResponse, User};
pub use label::Label;
pub use query::{DataQuery, DateField, IssuesQueryOptions, QueryType};
