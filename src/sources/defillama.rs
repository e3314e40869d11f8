//! TVL source backed by the DeFiLlama protocol API

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, trace};

use crate::state::Sample;

use super::{FetchError, FetchResult, MetricSource};

/// The `tvl` field is either a plain number or a time series of which
/// the last entry is the most recent one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TvlField {
    Value(f64),
    Series(Vec<TvlEntry>),
}

#[derive(Debug, Deserialize)]
struct TvlEntry {
    #[serde(rename = "totalLiquidityUSD")]
    total_liquidity_usd: f64,
}

#[derive(Debug, Deserialize)]
struct ProtocolResponse {
    tvl: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct DefiLlamaSource {
    client: reqwest::Client,
    base_url: String,
}

impl DefiLlamaSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, protocol: &str) -> String {
        format!("{}/protocol/{protocol}", self.base_url)
    }
}

/// Extract the current TVL from a protocol response body
pub fn parse_tvl(body: &str) -> FetchResult<Sample> {
    let response: ProtocolResponse = serde_json::from_str(body)?;
    let tvl = response
        .tvl
        .ok_or_else(|| FetchError::Malformed("'tvl' field is missing".to_string()))?;

    let value = match serde_json::from_value::<TvlField>(tvl.clone()) {
        Ok(TvlField::Value(value)) => value,
        Ok(TvlField::Series(series)) => {
            let Some(latest) = series.last() else {
                return Err(FetchError::Malformed("'tvl' series is empty".to_string()));
            };
            latest.total_liquidity_usd
        }
        Err(_) => {
            return Err(FetchError::Malformed(format!("unexpected 'tvl' format: {tvl}")));
        }
    };

    Ok(Sample::new(value)?)
}

#[async_trait]
impl MetricSource for DefiLlamaSource {
    #[instrument(skip(self))]
    async fn fetch(&self, protocol: &str) -> FetchResult<Sample> {
        let url = self.url(protocol);
        trace!("requesting TVL from {url}");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let sample = parse_tvl(&body)?;

        trace!("received TVL {}", sample.value());
        Ok(sample)
    }
}
