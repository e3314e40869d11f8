//! Recipient directory served as a JSON array over HTTP

use async_trait::async_trait;
use serde_json::Value;
use tracing::{instrument, trace};

use super::{FetchError, FetchResult, RecipientDirectory};

#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: reqwest::Client,
    url: String,
    skip_header: bool,
}

impl HttpDirectory {
    pub fn new(client: reqwest::Client, url: impl Into<String>, skip_header: bool) -> Self {
        Self {
            client,
            url: url.into(),
            skip_header,
        }
    }
}

/// Convert a directory response into a list of addresses.
///
/// Spreadsheet-backed directories return the column header as the first
/// entry; it is dropped when `skip_header` is set. Blank entries are
/// ignored, any non-string entry rejects the whole list.
pub fn parse_recipients(body: &str, skip_header: bool) -> FetchResult<Vec<String>> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Array(entries) = value else {
        return Err(FetchError::Malformed(
            "expected a JSON array of addresses".to_string(),
        ));
    };

    let skip = usize::from(skip_header);
    entries
        .into_iter()
        .skip(skip)
        .filter_map(|entry| match entry {
            Value::String(address) => {
                let address = address.trim();
                (!address.is_empty()).then(|| Ok(address.to_string()))
            }
            other => Some(Err(FetchError::Malformed(format!(
                "unexpected recipient entry: {other}"
            )))),
        })
        .collect()
}

#[async_trait]
impl RecipientDirectory for HttpDirectory {
    #[instrument(skip(self))]
    async fn fetch(&self) -> FetchResult<Vec<String>> {
        trace!("requesting recipients from {}", self.url);

        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let recipients = parse_recipients(&body, self.skip_header)?;

        trace!("received {} recipients", recipients.len());
        Ok(recipients)
    }
}
