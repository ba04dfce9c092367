use std::path::Path;
use std::time::Duration;

use secrecy::Secret;
use serde::Deserialize;

use crate::buckets::AssignPolicy;
use crate::error::AppErrors as Error;

pub const DEFAULT_CONFIG_FILE: &str = "configuration.yaml";
const ENV_PREFIX: &str = "ISSUE_BUCKETS";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub github: GithubSettings,
    pub pagination: PaginationSettings,
    pub histogram: HistogramSettings,
}

/// Where and how to reach the GitHub REST API
#[derive(Debug, Clone, Deserialize)]
pub struct GithubSettings {
    pub api_key: Secret<String>,
    pub base_url: String,
    pub api_version: String,
    pub timeout_secs: u64,
    pub repository: String,
    pub search_terms: Vec<String>,
}

impl GithubSettings {
    #[must_use]
    pub fn search_url(&self) -> String {
        format!("{}/search/issues", self.base_url.trim_end_matches('/'))
    }

    #[must_use]
    pub fn labels_url(&self) -> String {
        format!(
            "{}/repos/{}/labels",
            self.base_url.trim_end_matches('/'),
            self.repository
        )
    }

    /// The configured search terms scoped to the repository, followed by `extra`.
    #[must_use]
    pub fn query_terms(&self, extra: &[String]) -> Vec<String> {
        let mut terms = self.search_terms.clone();
        terms.push(format!("repo:{}", self.repository));
        terms.extend(extra.iter().cloned());
        terms
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bounds on a single pagination traversal
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationSettings {
    pub max_pages: usize,
    pub max_duration_secs: Option<u64>,
}

impl PaginationSettings {
    #[must_use]
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistogramSettings {
    pub out_of_range: AssignPolicy,
}

/// Get the configuration from `configuration.yaml` and the environment
///
/// # Errors
/// Will return errors if the config can't be read or deserialised.
pub fn get_configuration() -> Result<Settings, Error> {
    get_configuration_from(Path::new(DEFAULT_CONFIG_FILE))
}

/// Get the configuration, layering defaults, the given file (if it exists) and
/// `ISSUE_BUCKETS__*` environment variables
///
/// # Errors
/// Will return errors if the config can't be read or deserialised.
pub fn get_configuration_from(path: &Path) -> Result<Settings, Error> {
    let settings = config::Config::builder()
        .set_default("github.api_key", "")?
        .set_default("github.base_url", "https://api.github.com")?
        .set_default("github.api_version", "2022-11-28")?
        .set_default("github.timeout_secs", 30)?
        .set_default("github.repository", "grafana/grafana")?
        .set_default("github.search_terms", vec!["is:issue", "label:type/accessibility"])?
        .set_default("pagination.max_pages", 100)?
        .set_default("pagination.max_duration_secs", 300)?
        .set_default("histogram.out_of_range", "reject")?
        .add_source(config::File::from(path).format(config::FileFormat::Yaml).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize::<Settings>()?)
}

// -- Tests ----------------------------------------------------------------------------
