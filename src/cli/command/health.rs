//! Health
//!
//! This command fetches one page of the configured search and reports whether
//! the datasource is working.

use colored::Colorize;

use super::github_datasource;
use crate::configuration::Settings;
use crate::datasource::HealthState;
use crate::error::AppErrors as Error;
use crate::frame::OutputFormat;

pub async fn health(settings: &Settings, format: OutputFormat, cancel: tokio_util::sync::CancellationToken) -> Result<(), Error> {
    let datasource = github_datasource(settings, cancel)?;
    let status = datasource.check_health().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Csv => println!("status,message\n{:?},{}", status.status, status.message),
        OutputFormat::Table => match status.status {
            HealthState::Ok => println!("{} {}", "OK".green(), status.message),
            HealthState::Error => println!("{} {}", "ERROR".red(), status.message.bold()),
        },
    }

    match status.status {
        HealthState::Ok => Ok(()),
        HealthState::Error => Err(Error::Error(status.message)),
    }
}
