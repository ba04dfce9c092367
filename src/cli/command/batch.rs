//! Batch
//!
//! This command reads an array of queries from a JSON file, answers them
//! concurrently and prints each result under its ref id.

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use tracing_log::log::info;

use super::github_datasource;
use crate::configuration::Settings;
use crate::error::AppErrors as Error;
use crate::frame::OutputFormat;
use crate::model::DataQuery;

pub async fn batch(
    settings: &Settings,
    format: OutputFormat,
    cancel: tokio_util::sync::CancellationToken,
    file: &Path,
) -> Result<(), Error> {
    let contents = std::fs::read_to_string(file)?;
    let queries: Vec<DataQuery> = crate::client::decode_page(contents.as_bytes())?;
    info!("Running {} queries from {}", queries.len(), file.display());

    let datasource = github_datasource(settings, cancel)?;
    let responses = datasource.query_data(queries).await;

    let mut out = std::io::stdout().lock();
    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut out, &responses)?;
        writeln!(out)?;
        return Ok(());
    }

    for (ref_id, response) in &responses {
        writeln!(out, "# {ref_id}")?;
        match (&response.frame, &response.error) {
            (Some(frame), _) => frame.write(format, &mut out)?,
            (None, Some(error)) => writeln!(out, "{} {}", "ERROR".red(), error)?,
            (None, None) => writeln!(out, "(no result)")?,
        }
        writeln!(out)?;
    }

    Ok(())
}
