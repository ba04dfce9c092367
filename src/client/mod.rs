//! GitHub REST client
//!
//! [`Transport`] is the seam between the pagination logic and the network:
//! [`GithubClient`] implements it over `reqwest`, tests implement it in memory.

use core::fmt;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Response;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing_log::log::{info, warn};
use url::Url;

use crate::configuration::GithubSettings;
use crate::error::AppErrors as Error;

pub mod issues;
pub mod labels;
pub mod pagination;

pub use pagination::{construct_url, next_link, Page, Paginator};

const USER_AGENT: &str = concat!("issue-buckets/", env!("CARGO_PKG_VERSION"));
const API_VERSION_HEADER: &str = "x-github-api-version";

/// The body of one response and its raw `Link` header, if any.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub body: Vec<u8>,
    pub link: Option<String>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a single GET for `url`.
    async fn fetch(&self, url: &Url) -> Result<RawResponse, Error>;
}

#[derive(Debug, Deserialize, thiserror::Error)]
pub struct ErrorJson {
    message: String,
    documentation_url: Option<String>,
}

impl fmt::Display for ErrorJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.documentation_url {
            Some(docs) => write!(f, "{} ({})", self.message, docs),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
}

impl GithubClient {
    /// Build a client sending the GitHub headers on every request.
    ///
    /// # Errors
    /// Will return an error if a header value is invalid or the client cannot be built.
    pub fn new(settings: &GithubSettings) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(API_VERSION_HEADER, HeaderValue::from_str(&settings.api_version)?);

        let api_key = settings.api_key.expose_secret();
        if api_key.is_empty() {
            warn!("No GitHub API key configured, requests are unauthenticated");
        } else {
            let mut auth_header_value = HeaderValue::from_str(&format!("Bearer {api_key}"))?;
            auth_header_value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth_header_value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(settings.timeout())
            .build()?;

        Ok(GithubClient { client })
    }

    async fn handle_response(url: &Url, response: Response) -> Result<RawResponse, Error> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorJson>(&body) {
                Ok(error_json) => error_json.to_string(),
                Err(_) => body,
            };
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
                message,
            });
        }

        let link = response
            .headers()
            .get(header::LINK)
            .map(|value| value.to_str().map(str::to_owned))
            .transpose()
            .map_err(|e| Error::TransportError(format!("unreadable Link header: {e}")))?;
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { body, link })
    }
}

#[async_trait]
impl Transport for GithubClient {
    #[tracing::instrument(name = "Fetch page", skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<RawResponse, Error> {
        info!("url: {}", url);
        let response = self.client.get(url.clone()).send().await?;
        Self::handle_response(url, response).await
    }
}

/// Decode one page body, reporting the JSON path on failure.
///
/// # Errors
/// Will return [`Error::Decode`] if the body does not match `T`.
pub fn decode_page<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    let deserializer = &mut serde_json::Deserializer::from_slice(body);
    serde_path_to_error::deserialize(deserializer).map_err(|e| Error::Decode {
        path: e.path().to_string(),
        message: e.into_inner().to_string(),
    })
}

// -- Tests ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use secrecy::Secret;
    use serde::Deserialize;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::model::issue::Issue;
    use crate::tests::test::init_tracing;

    #[derive(Deserialize)]
    struct PageQuery {
        page: Option<u32>,
    }

    // Three search pages chained by `Link` headers, like GitHub's search API.
    async fn search(State(addr): State<SocketAddr>, Query(query): Query<PageQuery>) -> impl IntoResponse {
        let page = query.page.unwrap_or(1);
        let body = format!(
            r#"{{"total_count": 3, "items": [{{"title": "issue {page}", "created_at": "2024-01-0{page}T10:00:00Z", "closed_at": null, "updated_at": "2024-01-0{page}T10:00:00Z", "state": "open", "user": {{"login": "octocat"}}, "labels": []}}]}}"#
        );
        let link = if page < 3 {
            format!(
                r#"<http://{addr}/search/issues?page={}>; rel="next", <http://{addr}/search/issues?page=3>; rel="last""#,
                page + 1
            )
        } else {
            format!(r#"<http://{addr}/search/issues?page=1>; rel="first""#)
        };

        ([(axum::http::header::LINK, link)], body)
    }

    async fn forbidden() -> impl IntoResponse {
        (
            StatusCode::FORBIDDEN,
            r#"{"message": "API rate limit exceeded", "documentation_url": "https://docs.github.com/rest"}"#,
        )
    }

    async fn serve() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/search/issues", get(search))
            .route("/limited", get(forbidden))
            .with_state(addr);
        tokio::spawn(async move { axum::serve(listener, app).await });
        addr
    }

    fn settings(base_url: String) -> GithubSettings {
        GithubSettings {
            api_key: Secret::new("test-token".to_string()),
            base_url,
            api_version: "2022-11-28".to_string(),
            timeout_secs: 5,
            repository: "grafana/grafana".to_string(),
            search_terms: vec!["is:issue".to_string()],
        }
    }

    #[tokio::test]
    async fn http_client_follows_link_headers() {
        // Arrange
        init_tracing();
        let addr = serve().await;
        let client = GithubClient::new(&settings(format!("http://{addr}"))).unwrap();
        let paginator = Paginator::new(&client, CancellationToken::new());

        // Act
        let issues = paginator
            .issues(&format!("http://{addr}/search/issues"), &["is:issue".to_string()])
            .await
            .unwrap();

        // Assert
        let titles: Vec<_> = issues.iter().map(|issue: &Issue| issue.title.as_str()).collect();
        assert_eq!(titles, vec!["issue 1", "issue 2", "issue 3"]);
    }

    #[tokio::test]
    async fn non_success_status_carries_the_github_message() {
        // Arrange
        init_tracing();
        let addr = serve().await;
        let client = GithubClient::new(&settings(format!("http://{addr}"))).unwrap();
        let url = Url::parse(&format!("http://{addr}/limited")).unwrap();

        // Act
        let result = client.fetch(&url).await;

        // Assert
        match result {
            Err(Error::Status { status, message, .. }) => {
                assert_eq!(status, 403);
                assert!(message.starts_with("API rate limit exceeded"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[test]
    fn decode_reports_the_failing_path() {
        let body = br#"{"items": [{"title": 42}]}"#;

        let result = decode_page::<crate::model::issue::SearchIssuesResponse>(body);

        match result {
            Err(Error::Decode { path, .. }) => assert_eq!(path, "items[0].title"),
            other => panic!("expected a decode error, got {other:?}"),
        }
    }
}
