//! Tabular output
//!
//! Query results are flattened into frames of ordered rows and written out as
//! an aligned table, CSV or JSON.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::buckets::BucketMap;
use crate::error::AppErrors as Error;
use crate::model::{DateField, Issue, Label};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRow {
    pub title: String,
    pub created_at: String,
    pub closed_at: String,
    pub updated_at: String,
    pub author: String,
    pub state: String,
    pub labels: String,
}

impl From<&Issue> for IssueRow {
    fn from(issue: &Issue) -> Self {
        IssueRow {
            title: issue.title.clone(),
            created_at: rfc3339(&issue.created_at),
            closed_at: issue.closed_at.as_ref().map(rfc3339).unwrap_or_default(),
            updated_at: rfc3339(&issue.updated_at),
            author: issue.user.login.clone(),
            state: issue.state.clone(),
            labels: issue.label_names(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketRecord {
    pub date: String,
    pub count: u64,
}

/// The rows answering one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", content = "rows", rename_all = "snake_case")]
pub enum Frame {
    Issues(Vec<IssueRow>),
    Labels(Vec<Label>),
    Buckets { field: DateField, rows: Vec<BucketRecord> },
}

impl Frame {
    #[must_use]
    pub fn issues(issues: &[Issue]) -> Self {
        Frame::Issues(issues.iter().map(IssueRow::from).collect())
    }

    #[must_use]
    pub fn labels(labels: Vec<Label>) -> Self {
        Frame::Labels(labels)
    }

    /// Bucket rows in chronological order.
    #[must_use]
    pub fn buckets(field: DateField, buckets: &BucketMap<Utc>) -> Self {
        let rows = buckets
            .to_rfc3339_rows()
            .into_iter()
            .map(|(date, count)| BucketRecord { date, count })
            .collect();
        Frame::Buckets { field, rows }
    }

    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Frame::Issues(_) => "issues".to_string(),
            Frame::Labels(_) => "labels".to_string(),
            Frame::Buckets { field, .. } => field.to_string(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Frame::Issues(rows) => rows.len(),
            Frame::Labels(rows) => rows.len(),
            Frame::Buckets { rows, .. } => rows.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        match self {
            Frame::Issues(_) => ["title", "createdAt", "closedAt", "updatedAt", "author", "state", "labels"]
                .map(String::from)
                .to_vec(),
            Frame::Labels(_) => vec!["title".to_string(), "color".to_string()],
            Frame::Buckets { field, .. } => vec!["date".to_string(), format!("Issues {field}")],
        }
    }

    #[must_use]
    pub fn records(&self) -> Vec<Vec<String>> {
        match self {
            Frame::Issues(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        row.title.clone(),
                        row.created_at.clone(),
                        row.closed_at.clone(),
                        row.updated_at.clone(),
                        row.author.clone(),
                        row.state.clone(),
                        row.labels.clone(),
                    ]
                })
                .collect(),
            Frame::Labels(rows) => rows
                .iter()
                .map(|label| vec![label.name.clone(), label.color.clone()])
                .collect(),
            Frame::Buckets { rows, .. } => rows
                .iter()
                .map(|row| vec![row.date.clone(), row.count.to_string()])
                .collect(),
        }
    }

    /// Write the frame in `format`.
    ///
    /// # Errors
    /// Will return an error if the writer fails or serialisation fails.
    pub fn write<W: Write>(&self, format: OutputFormat, writer: W) -> Result<(), Error> {
        match format {
            OutputFormat::Table => self.write_table(writer),
            OutputFormat::Csv => self.write_csv(writer),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(writer, self)?;
                Ok(())
            }
        }
    }

    fn write_csv<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.headers())?;
        for record in self.records() {
            csv_writer.write_record(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    fn write_table<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let headers = self.headers();
        let records = self.records();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for record in &records {
            for (width, cell) in widths.iter_mut().zip(record) {
                *width = (*width).max(cell.chars().count());
            }
        }

        writeln!(writer, "{}", format_line(&headers, &widths))?;
        writeln!(writer, "{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)))?;
        for record in &records {
            writeln!(writer, "{}", format_line(record, &widths))?;
        }

        Ok(())
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn rfc3339(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// -- Tests ----------------------------------------------------------------------------
