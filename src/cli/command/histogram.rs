//! Histogram
//!
//! This command fetches the matching issues and prints how many were created
//! (or closed) in each hour, day, week, month or year.

use chrono::Utc;

use super::github_datasource;
use crate::configuration::Settings;
use crate::datasource::HistogramRequest;
use crate::error::AppErrors as Error;
use crate::frame::{Frame, OutputFormat};
use crate::model::query::default_time_range;

pub async fn histogram(
    settings: &Settings,
    format: OutputFormat,
    cancel: tokio_util::sync::CancellationToken,
    request: HistogramRequest,
) -> Result<(), Error> {
    if request.range.is_empty() {
        return Err(Error::Error(format!(
            "--from {} is after --to {}",
            request.range.from, request.range.to
        )));
    }

    let datasource = github_datasource(settings, cancel)?;
    let buckets = datasource.histogram(&request).await?;

    Frame::buckets(request.field, &buckets).write(format, std::io::stdout().lock())
}

/// Fill in the default range ends: six months ago and now.
#[must_use]
pub fn resolve_range(
    from: Option<chrono::DateTime<Utc>>,
    to: Option<chrono::DateTime<Utc>>,
) -> crate::buckets::TimeRange<Utc> {
    let to = to.unwrap_or_else(Utc::now);
    let mut range = default_time_range(to);
    if let Some(from) = from {
        range.from = from;
    }
    range
}
