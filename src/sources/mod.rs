//! Remote data sources consumed by the monitor
//!
//! Both sources are plain request/response clients without state. Loosely
//! shaped JSON is validated here and converted into strict types, so the
//! engine only ever sees a [`Sample`] or a [`FetchError`].

pub mod defillama;
pub mod directory;
pub mod error;

use async_trait::async_trait;

use crate::state::Sample;

pub use error::{FetchError, FetchResult};

/// Fetches the current metric value for a protocol
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch(&self, protocol: &str) -> FetchResult<Sample>;
}

/// Fetches the current list of notification recipients
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    async fn fetch(&self) -> FetchResult<Vec<String>>;
}

/// Build the HTTP client shared by the remote sources
pub fn http_client(timeout: std::time::Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}
