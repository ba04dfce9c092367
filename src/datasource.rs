//! Query orchestration
//!
//! [`Datasource`] ties the paginated fetcher, the decoders and the bucketing
//! engine together. Each query of a batch runs as its own task and its
//! outcome lands in the slot for its `ref_id`; a failed query gets an error
//! entry and no frame.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_log::log::{error, info, warn};

use crate::buckets::{AssignPolicy, BucketError, BucketMap, BucketUnit, TimeRange};
use crate::client::{construct_url, Paginator, Transport};
use crate::configuration::Settings;
use crate::error::AppErrors as Error;
use crate::frame::Frame;
use crate::model::issue::timestamps;
use crate::model::{DataQuery, DateField, Issue, Label, QueryType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub message: String,
}

/// The answer to one query of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub ref_id: String,
    pub frame: Option<Frame>,
    pub error: Option<String>,
}

impl QueryResponse {
    fn from_result(ref_id: String, result: Result<Frame, Error>) -> Self {
        match result {
            Ok(frame) => QueryResponse {
                ref_id,
                frame: Some(frame),
                error: None,
            },
            Err(e) => QueryResponse {
                ref_id,
                frame: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// The parameters of one histogram.
#[derive(Debug, Clone)]
pub struct HistogramRequest {
    pub field: DateField,
    pub unit: BucketUnit,
    pub range: TimeRange<Utc>,
    pub omit_time: bool,
    pub terms: Vec<String>,
}

impl HistogramRequest {
    /// The extra search terms, narrowed to `range` when the requested range is kept.
    #[must_use]
    pub fn search_terms(&self) -> Vec<String> {
        let mut terms = self.terms.clone();
        if self.omit_time {
            terms.push(date_qualifier(self.field, &self.range));
        }
        terms
    }
}

/// A search qualifier such as `created:2024-01-01T00:00:00Z..2024-06-30T00:00:00Z`.
#[must_use]
pub fn date_qualifier(field: DateField, range: &TimeRange<Utc>) -> String {
    format!(
        "{field}:{}..{}",
        range.from.to_rfc3339_opts(SecondsFormat::Secs, true),
        range.to.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

pub struct Datasource<T: Transport> {
    transport: Arc<T>,
    settings: Settings,
    cancel: CancellationToken,
}

impl<T: Transport + 'static> Datasource<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, settings: Settings, cancel: CancellationToken) -> Self {
        Self {
            transport,
            settings,
            cancel,
        }
    }

    fn paginator(&self) -> Paginator<'_, T> {
        Paginator::new(self.transport.as_ref(), self.cancel.clone())
            .with_max_pages(self.settings.pagination.max_pages)
            .with_max_duration(self.settings.pagination.max_duration())
    }

    /// Get every issue matching the configured search plus `extra_terms`
    ///
    /// # Errors
    /// Will return errors if any page cannot be fetched or decoded.
    pub async fn issues(&self, extra_terms: &[String]) -> Result<Vec<Issue>, Error> {
        let terms = self.settings.github.query_terms(extra_terms);
        self.paginator()
            .issues(&self.settings.github.search_url(), &terms)
            .await
    }

    /// Get every label of the configured repository
    ///
    /// # Errors
    /// Will return errors if any page cannot be fetched or decoded.
    pub async fn labels(&self) -> Result<Vec<Label>, Error> {
        self.paginator().labels(&self.settings.github.labels_url()).await
    }

    /// Fetch the matching issues and bucket them
    ///
    /// # Errors
    /// Will return errors if fetching, decoding or bucketing fails.
    #[tracing::instrument(name = "Issue histogram", skip(self), fields(field = %request.field, unit = %request.unit))]
    pub async fn histogram(&self, request: &HistogramRequest) -> Result<BucketMap<Utc>, Error> {
        let issues = self.issues(&request.search_terms()).await?;
        let buckets = issue_histogram(
            &issues,
            request,
            self.settings.histogram.out_of_range,
        )?;
        info!("Counted {} issues into {} buckets", buckets.total(), buckets.len());

        Ok(buckets)
    }

    /// Answer a single query
    ///
    /// # Errors
    /// Will return errors if the query is incomplete or any step fails.
    #[tracing::instrument(name = "Run query", skip(self, query), fields(ref_id = %query.ref_id, query_type = %query.query_type))]
    pub async fn run_query(&self, query: &DataQuery, now: DateTime<Utc>) -> Result<Frame, Error> {
        match query.query_type {
            QueryType::Issues => Ok(Frame::issues(&self.issues(&query.terms).await?)),
            QueryType::Labels => Ok(Frame::labels(self.labels().await?)),
            QueryType::IssuesCreated | QueryType::IssuesClosed => {
                let field = query
                    .options
                    .date_field
                    .or_else(|| query.query_type.date_field())
                    .ok_or_else(|| BucketError::UnknownDateField(query.query_type.to_string()))?;
                let unit = query.options.date_display.ok_or(BucketError::MissingUnit)?;
                let request = HistogramRequest {
                    field,
                    unit,
                    range: query.time_range_or_default(now),
                    omit_time: query.options.omit_time,
                    terms: query.terms.clone(),
                };
                let buckets = self.histogram(&request).await?;
                Ok(Frame::buckets(field, &buckets))
            }
        }
    }

    /// Answer a batch of queries concurrently, keyed by `ref_id`
    pub async fn query_data(self: &Arc<Self>, queries: Vec<DataQuery>) -> BTreeMap<String, QueryResponse> {
        let now = Utc::now();
        let mut responses = BTreeMap::new();
        let mut tasks = JoinSet::new();

        for query in queries {
            let ref_id = query.ref_id.clone();
            if responses.contains_key(&ref_id) {
                warn!("Duplicate ref id {}, keeping the first query", ref_id);
                continue;
            }
            // Placeholder until the task reports back.
            responses.insert(
                ref_id.clone(),
                QueryResponse::from_result(ref_id, Err(Error::Error("query did not complete".to_string()))),
            );

            let datasource = Arc::clone(self);
            tasks.spawn(async move {
                let result = datasource.run_query(&query, now).await;
                (query.ref_id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((ref_id, result)) => {
                    if let Err(e) = &result {
                        error!("Query {} failed: {}", ref_id, e);
                    }
                    responses.insert(ref_id.clone(), QueryResponse::from_result(ref_id, result));
                }
                Err(e) => error!("Query task failed: {}", e),
            }
        }

        responses
    }

    /// Check that a representative search can be fetched
    #[tracing::instrument(name = "Check health", skip(self))]
    pub async fn check_health(&self) -> HealthStatus {
        let terms = self.settings.github.query_terms(&[]);
        let result = match construct_url(&self.settings.github.search_url(), &terms) {
            Ok(url) => tokio::select! {
                biased;
                () = self.cancel.cancelled() => Err(Error::Canceled),
                response = self.transport.fetch(&url) => response.map(|_| ()),
            },
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => HealthStatus {
                status: HealthState::Ok,
                message: "Datasource is working".to_string(),
            },
            Err(e) => {
                error!("Health check failed: {}", e);
                HealthStatus {
                    status: HealthState::Error,
                    message: format!("Datasource is NOT working: {e}"),
                }
            }
        }
    }
}

/// Bucket the `request.field` timestamps of `issues`.
///
/// Issues without the field (open issues for `closed`) are skipped, and no
/// timestamps at all gives an empty histogram. When the requested range is
/// kept, timestamps outside it are left out of the count.
///
/// # Errors
/// Will return an error if a timestamp falls outside the range under
/// [`AssignPolicy::Reject`].
pub fn issue_histogram(
    issues: &[Issue],
    request: &HistogramRequest,
    policy: AssignPolicy,
) -> Result<BucketMap<Utc>, BucketError> {
    let mut timestamps = timestamps(issues, request.field);
    if request.omit_time {
        let before = timestamps.len();
        timestamps.retain(|date| request.range.contains(date));
        if timestamps.len() < before {
            info!("Left {} issues outside the requested range uncounted", before - timestamps.len());
        }
    }
    if timestamps.is_empty() {
        return Ok(BucketMap::empty(request.unit));
    }

    let range = request.range.clone().effective(request.omit_time, &timestamps);
    let mut buckets = BucketMap::generate(&range, request.unit)?;
    buckets.assign(&timestamps, policy)?;

    Ok(buckets)
}

// -- Tests ----------------------------------------------------------------------------
