use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::GithubClient;
use crate::configuration::Settings;
use crate::datasource::Datasource;
use crate::error::AppErrors as Error;

pub mod batch;
pub mod health;
pub mod histogram;
pub mod issues;
pub mod labels;

pub use batch::batch;
pub use health::health;
pub use histogram::histogram;
pub use issues::issues;
pub use labels::labels;

// Build a datasource talking to GitHub over HTTP.
fn github_datasource(settings: &Settings, cancel: CancellationToken) -> Result<Arc<Datasource<GithubClient>>, Error> {
    let client = GithubClient::new(&settings.github)?;
    Ok(Arc::new(Datasource::new(Arc::new(client), settings.clone(), cancel)))
}
