//! Repository labels

use tracing_log::log::info;

use super::{decode_page, Page, Paginator, Transport};
use crate::error::AppErrors as Error;
use crate::model::label::Label;

impl<T: Transport + ?Sized> Paginator<'_, T> {
    /// Get every label of a repository
    ///
    /// # Errors
    /// Will return errors if any page cannot be fetched or decoded.
    #[tracing::instrument(name = "Get labels", skip(self))]
    pub async fn labels(&self, labels_url: &str) -> Result<Vec<Label>, Error> {
        let pages = self.fetch_all(labels_url, &[]).await?;
        let labels = decode_labels(&pages)?;
        info!("Fetched {} labels", labels.len());

        Ok(labels)
    }
}

/// Decode label list pages, in page order.
///
/// # Errors
/// Will return [`Error::Decode`] on the first page that does not decode.
pub fn decode_labels(pages: &[Page]) -> Result<Vec<Label>, Error> {
    let mut labels = Vec::new();
    for page in pages {
        let page_labels: Vec<Label> = decode_page(&page.body)?;
        labels.extend(page_labels);
    }

    Ok(labels)
}
