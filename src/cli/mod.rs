//! Issue Buckets Command Line Interface

pub mod command;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{command, Parser, Subcommand};

use crate::buckets::BucketUnit;
use crate::configuration::DEFAULT_CONFIG_FILE;
use crate::frame::OutputFormat;
use crate::model::DateField;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the GitHub search can be reached
    Health {},

    /// List the matching issues
    Issues {
        /// Extra search terms, e.g. `state:open`
        #[arg(long = "term", value_name = "TERM")]
        terms: Vec<String>,
    },

    /// List the repository labels
    Labels {},

    /// Count issues per time bucket
    Histogram {
        /// Date to count
        #[arg(long, value_enum, default_value_t = DateField::Created)]
        field: DateField,

        /// Bucket width: hour, day, week, month or year
        #[arg(long, value_parser = BucketUnit::parse, default_value = "month")]
        unit: BucketUnit,

        /// Start of the range (RFC 3339 or YYYY-MM-DD), six months ago by default
        #[arg(long, value_parser = parse_datetime)]
        from: Option<DateTime<Utc>>,

        /// End of the range (RFC 3339 or YYYY-MM-DD), now by default
        #[arg(long, value_parser = parse_datetime)]
        to: Option<DateTime<Utc>>,

        /// Keep the given range instead of spanning the first and last issue
        #[arg(long)]
        omit_time: bool,

        /// Extra search terms, e.g. `state:closed`
        #[arg(long = "term", value_name = "TERM")]
        terms: Vec<String>,
    },

    /// Run a JSON file of queries and print each result under its ref id
    Batch {
        /// File holding an array of queries
        file: PathBuf,
    },
}

/// Parse an RFC 3339 timestamp or a plain date (taken as UTC midnight).
///
/// # Errors
/// Will return an error if the input is neither.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(input) {
        Ok(date) => Ok(date.with_timezone(&Utc)),
        Err(_) => {
            let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")?;
            Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use crate::tests::test::utc;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn histogram_arguments_parse() {
        let cli = Cli::parse_from([
            "issue-buckets",
            "histogram",
            "--field",
            "closed",
            "--unit",
            "weeks",
            "--from",
            "2024-01-01",
            "--to",
            "2024-02-01T12:00:00Z",
            "--format",
            "csv",
        ]);

        assert_eq!(cli.format, OutputFormat::Csv);
        match cli.command {
            Commands::Histogram {
                field, unit, from, to, ..
            } => {
                assert_eq!(field, DateField::Closed);
                assert_eq!(unit, BucketUnit::Week);
                assert_eq!(from, Some(utc("2024-01-01T00:00:00Z")));
                assert_eq!(to, Some(utc("2024-02-01T12:00:00Z")));
            }
            _ => panic!("expected the histogram command"),
        }
    }

    #[test]
    fn unknown_unit_is_refused() {
        let result = Cli::try_parse_from(["issue-buckets", "histogram", "--unit", "fortnight"]);

        assert!(result.is_err());
    }
}
