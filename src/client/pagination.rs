//! Cursor-following pagination
//!
//! GitHub signals further pages through a `Link` header of the form
//! `<url>; rel="next", <url>; rel="last"`. [`Paginator::fetch_all`] keeps
//! following the `next` relation until a page has none.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing_log::log::{error, info};
use url::Url;

use super::Transport;
use crate::error::AppErrors as Error;

pub const PER_PAGE: u32 = 100;
pub const DEFAULT_MAX_PAGES: usize = 100;

static LINK_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<([^>]*)>$").expect("link target pattern is valid"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("malformed Link entry `{0}`: no <url> target")]
    MalformedLink(String),

    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("pagination limit exceeded: more than {max_pages} pages")]
    PageLimitExceeded { max_pages: usize },

    #[error("pagination time limit of {0:?} exceeded")]
    TimeLimitExceeded(Duration),
}

/// One fetched page: its raw body and the cursor to its successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub body: Vec<u8>,
    pub next: Option<Url>,
}

/// Build the first-page url: `base_url?per_page=100&q=term+term`.
///
/// The `q` parameter is left out when there are no terms.
///
/// # Errors
/// Will return [`PaginationError::InvalidUrl`] if `base_url` does not parse.
pub fn construct_url(base_url: &str, terms: &[String]) -> Result<Url, PaginationError> {
    let mut url = Url::parse(base_url).map_err(|e| PaginationError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("per_page", &PER_PAGE.to_string());
        if !terms.is_empty() {
            // Form encoding turns the spaces into `+`.
            pairs.append_pair("q", &terms.join(" "));
        }
    }

    Ok(url)
}

/// Find the `rel="next"` target in a `Link` header value.
///
/// # Errors
/// Will return an error if the `next` entry has no `<url>` target or the
/// target is not a valid url.
pub fn next_link(header: &str) -> Result<Option<Url>, PaginationError> {
    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let target = parts.next().unwrap_or_default().trim();
        if !parts.any(is_next_relation) {
            continue;
        }

        let captures = LINK_TARGET
            .captures(target)
            .ok_or_else(|| PaginationError::MalformedLink(entry.trim().to_string()))?;
        let url = Url::parse(&captures[1]).map_err(|e| PaginationError::InvalidUrl {
            url: captures[1].to_string(),
            reason: e.to_string(),
        })?;

        return Ok(Some(url));
    }

    Ok(None)
}

fn is_next_relation(param: &str) -> bool {
    match param.split_once('=') {
        Some((key, value)) => {
            key.trim().eq_ignore_ascii_case("rel") && value.trim().trim_matches('"') == "next"
        }
        None => false,
    }
}

/// Walks the pages of one listing, one request at a time.
pub struct Paginator<'a, T: Transport + ?Sized> {
    transport: &'a T,
    max_pages: usize,
    max_duration: Option<Duration>,
    cancel: CancellationToken,
}

impl<'a, T: Transport + ?Sized> Paginator<'a, T> {
    pub fn new(transport: &'a T, cancel: CancellationToken) -> Self {
        Self {
            transport,
            max_pages: DEFAULT_MAX_PAGES,
            max_duration: None,
            cancel,
        }
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    #[must_use]
    pub fn with_max_duration(mut self, max_duration: Option<Duration>) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Fetch every page of `base_url` searched with `terms`.
    ///
    /// # Errors
    /// Any transport failure, malformed `Link` header, exceeded limit or
    /// cancellation aborts the traversal; no partial result is returned.
    #[tracing::instrument(name = "Fetch all pages", skip(self))]
    pub async fn fetch_all(&self, base_url: &str, terms: &[String]) -> Result<Vec<Page>, Error> {
        let url = construct_url(base_url, terms)?;
        self.fetch_from(url).await
    }

    /// Fetch `url` and every page after it.
    ///
    /// # Errors
    /// As [`Paginator::fetch_all`].
    pub async fn fetch_from(&self, url: Url) -> Result<Vec<Page>, Error> {
        let result = match self.max_duration {
            Some(limit) => tokio::time::timeout(limit, self.traverse(url))
                .await
                .unwrap_or_else(|_| Err(PaginationError::TimeLimitExceeded(limit).into())),
            None => self.traverse(url).await,
        };

        if let Err(e) = &result {
            error!("Pagination aborted: {}", e);
        }
        result
    }

    async fn traverse(&self, first: Url) -> Result<Vec<Page>, Error> {
        let mut pages = Vec::new();
        let mut url = Some(first);

        while let Some(current) = url.take() {
            if pages.len() >= self.max_pages {
                return Err(PaginationError::PageLimitExceeded {
                    max_pages: self.max_pages,
                }
                .into());
            }

            let response = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(Error::Canceled),
                response = self.transport.fetch(&current) => response?,
            };

            let next = match response.link.as_deref() {
                Some(header) => next_link(header)?,
                None => None,
            };
            info!("Fetched page {} from {}", pages.len() + 1, current);

            url.clone_from(&next);
            pages.push(Page {
                body: response.body,
                next,
            });
        }

        Ok(pages)
    }
}

// -- Tests ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test::{init_tracing, ScriptedTransport, StalledTransport};

    const BASE: &str = "https://api.github.com/search/issues";

    fn link_to(url: &str) -> String {
        format!(r#"<{url}>; rel="next", <https://api.github.com/search/issues?page=9>; rel="last""#)
    }

    #[test]
    fn construct_url_appends_page_size_and_query() {
        let terms = vec!["is:issue".to_string(), "label:type/accessibility".to_string()];

        let url = construct_url(BASE, &terms).unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.github.com/search/issues?per_page=100&q=is%3Aissue+label%3Atype%2Faccessibility"
        );
        let q: Vec<_> = url.query_pairs().filter(|(k, _)| k == "q").map(|(_, v)| v.into_owned()).collect();
        assert_eq!(q, vec!["is:issue label:type/accessibility".to_string()]);
    }

    #[test]
    fn construct_url_without_terms_has_no_query() {
        let url = construct_url("https://api.github.com/repos/grafana/grafana/labels", &[]).unwrap();

        assert_eq!(url.as_str(), "https://api.github.com/repos/grafana/grafana/labels?per_page=100");
    }

    #[test]
    fn next_link_finds_the_next_relation() {
        let header = r#"<https://api.github.com/search/issues?q=x&page=1>; rel="prev", <https://api.github.com/search/issues?q=x&page=3>; rel="next", <https://api.github.com/search/issues?q=x&page=5>; rel="last""#;

        let next = next_link(header).unwrap().unwrap();

        assert_eq!(next.as_str(), "https://api.github.com/search/issues?q=x&page=3");
    }

    #[test]
    fn next_link_is_none_without_a_next_relation() {
        let header = r#"<https://api.github.com/search/issues?page=1>; rel="first", <https://api.github.com/search/issues?page=2>; rel="prev""#;

        assert_eq!(next_link(header).unwrap(), None);
        assert_eq!(next_link("").unwrap(), None);
    }

    #[test]
    fn next_relation_must_match_exactly() {
        let header = r#"<https://api.github.com/search/issues?page=2>; rel="nextish""#;

        assert_eq!(next_link(header).unwrap(), None);
    }

    #[test]
    fn next_link_without_angle_brackets_is_malformed() {
        let header = r#"https://api.github.com/search/issues?page=2; rel="next""#;

        let result = next_link(header);

        assert!(matches!(result, Err(PaginationError::MalformedLink(_))));
    }

    #[tokio::test]
    async fn follows_next_links_in_page_order() {
        // Arrange
        init_tracing();
        let first = construct_url(BASE, &["is:issue".to_string()]).unwrap();
        let transport = ScriptedTransport::new()
            .page(first.as_str(), b"one", Some(link_to("https://api.github.com/p2")))
            .page("https://api.github.com/p2", b"two", Some(link_to("https://api.github.com/p3")))
            .page("https://api.github.com/p3", b"three", None);
        let paginator = Paginator::new(&transport, CancellationToken::new());

        // Act
        let pages = paginator.fetch_all(BASE, &["is:issue".to_string()]).await.unwrap();

        // Assert
        let bodies: Vec<_> = pages.iter().map(|page| page.body.as_slice()).collect();
        assert_eq!(bodies, vec![&b"one"[..], &b"two"[..], &b"three"[..]]);
        assert_eq!(pages[2].next, None);
        assert_eq!(
            transport.requested(),
            vec![
                first.to_string(),
                "https://api.github.com/p2".to_string(),
                "https://api.github.com/p3".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn single_page_without_link_header() {
        init_tracing();
        let first = construct_url(BASE, &[]).unwrap();
        let transport = ScriptedTransport::new().page(first.as_str(), b"[]", None);
        let paginator = Paginator::new(&transport, CancellationToken::new());

        let pages = paginator.fetch_all(BASE, &[]).await.unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(transport.requested().len(), 1);
    }

    #[tokio::test]
    async fn malformed_link_fails_the_traversal() {
        init_tracing();
        let first = construct_url(BASE, &[]).unwrap();
        let transport = ScriptedTransport::new().page(
            first.as_str(),
            b"[]",
            Some(r#"https://api.github.com/p2; rel="next""#.to_string()),
        );
        let paginator = Paginator::new(&transport, CancellationToken::new());

        let result = paginator.fetch_all(BASE, &[]).await;

        assert!(matches!(
            result,
            Err(Error::Pagination(PaginationError::MalformedLink(_)))
        ));
    }

    #[tokio::test]
    async fn transport_failure_discards_fetched_pages() {
        init_tracing();
        let first = construct_url(BASE, &[]).unwrap();
        let transport = ScriptedTransport::new().page(first.as_str(), b"[]", Some(link_to("https://api.github.com/gone")));
        let paginator = Paginator::new(&transport, CancellationToken::new());

        let result = paginator.fetch_all(BASE, &[]).await;

        assert!(matches!(result, Err(Error::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn page_limit_fails_closed() {
        init_tracing();
        let first = construct_url(BASE, &[]).unwrap();
        let transport = ScriptedTransport::new()
            .page(first.as_str(), b"1", Some(link_to("https://api.github.com/p2")))
            .page("https://api.github.com/p2", b"2", Some(link_to("https://api.github.com/p3")))
            .page("https://api.github.com/p3", b"3", None);
        let paginator = Paginator::new(&transport, CancellationToken::new()).with_max_pages(2);

        let result = paginator.fetch_all(BASE, &[]).await;

        assert!(matches!(
            result,
            Err(Error::Pagination(PaginationError::PageLimitExceeded { max_pages: 2 }))
        ));
        assert_eq!(transport.requested().len(), 2);
    }

    #[tokio::test]
    async fn page_limit_allows_exactly_max_pages() {
        init_tracing();
        let first = construct_url(BASE, &[]).unwrap();
        let transport = ScriptedTransport::new()
            .page(first.as_str(), b"1", Some(link_to("https://api.github.com/p2")))
            .page("https://api.github.com/p2", b"2", None);
        let paginator = Paginator::new(&transport, CancellationToken::new()).with_max_pages(2);

        let pages = paginator.fetch_all(BASE, &[]).await.unwrap();

        assert_eq!(pages.len(), 2);
    }

    #[tokio::test]
    async fn cancellation_aborts_the_traversal() {
        init_tracing();
        let cancel = CancellationToken::new();
        let transport = StalledTransport;
        let paginator = Paginator::new(&transport, cancel.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });
        let result = paginator.fetch_all(BASE, &[]).await;
        canceller.await.unwrap();

        assert!(matches!(result, Err(Error::Canceled)));
    }

    #[tokio::test]
    async fn time_limit_fails_closed() {
        init_tracing();
        let transport = StalledTransport;
        let paginator = Paginator::new(&transport, CancellationToken::new())
            .with_max_duration(Some(Duration::from_millis(20)));

        let result = paginator.fetch_all(BASE, &[]).await;

        assert!(matches!(
            result,
            Err(Error::Pagination(PaginationError::TimeLimitExceeded(_)))
        ));
    }
}
