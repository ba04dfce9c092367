//! Issues
//!
//! This command lists every issue matching the configured search.

use super::github_datasource;
use crate::configuration::Settings;
use crate::error::AppErrors as Error;
use crate::frame::{Frame, OutputFormat};

pub async fn issues(
    settings: &Settings,
    format: OutputFormat,
    cancel: tokio_util::sync::CancellationToken,
    terms: &[String],
) -> Result<(), Error> {
    let datasource = github_datasource(settings, cancel)?;
    let mut issues = datasource.issues(terms).await?;

    // sort by date
    issues.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    Frame::issues(&issues).write(format, std::io::stdout().lock())
}
