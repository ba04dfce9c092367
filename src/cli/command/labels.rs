//! Labels
//!
//! This command lists the labels of the configured repository.

use super::github_datasource;
use crate::configuration::Settings;
use crate::error::AppErrors as Error;
use crate::frame::{Frame, OutputFormat};

pub async fn labels(
    settings: &Settings,
    format: OutputFormat,
    cancel: tokio_util::sync::CancellationToken,
) -> Result<(), Error> {
    let datasource = github_datasource(settings, cancel)?;
    let labels = datasource.labels().await?;

    Frame::labels(labels).write(format, std::io::stdout().lock())
}
