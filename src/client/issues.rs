//! Issue search
//!
//! Fetches every page of a GitHub issue search and decodes the issues.

use tracing_log::log::info;

use super::{decode_page, Page, Paginator, Transport};
use crate::error::AppErrors as Error;
use crate::model::issue::{Issue, SearchIssuesResponse};

impl<T: Transport + ?Sized> Paginator<'_, T> {
    /// Get every issue matching `terms`
    ///
    /// # Errors
    /// Will return errors if any page cannot be fetched or decoded.
    #[tracing::instrument(name = "Search issues", skip(self))]
    pub async fn issues(&self, search_url: &str, terms: &[String]) -> Result<Vec<Issue>, Error> {
        let pages = self.fetch_all(search_url, terms).await?;
        let issues = decode_issues(&pages)?;
        info!("Fetched {} issues from {} pages", issues.len(), pages.len());

        Ok(issues)
    }
}

/// Decode search pages into issues, in page order.
///
/// # Errors
/// Will return [`Error::Decode`] on the first page that does not decode.
pub fn decode_issues(pages: &[Page]) -> Result<Vec<Issue>, Error> {
    let mut issues = Vec::new();
    for page in pages {
        let response: SearchIssuesResponse = decode_page(&page.body)?;
        issues.extend(response.items);
    }

    Ok(issues)
}

// -- Tests ----------------------------------------------------------------------------
