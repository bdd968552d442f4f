use crate::{Config, ForecastPayload, client::weatherapi::WeatherApiClient};
use async_trait::async_trait;
use thiserror::Error;

pub mod weatherapi;

/// Failure of a single forecast round trip.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a readable response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body is not the expected forecast document.
    #[error("failed to decode forecast response: {0}")]
    Decode(String),
}

/// What came back from the provider when the round trip itself worked.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResponse {
    pub status: u16,
    /// `None` for non-success statuses and for empty bodies.
    pub payload: Option<ForecastPayload>,
}

impl ForecastResponse {
    pub fn success(payload: ForecastPayload) -> Self {
        Self { status: 200, payload: Some(payload) }
    }

    pub fn failed(status: u16) -> Self {
        Self { status, payload: None }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One HTTP GET against the forecast endpoint. No retry, no caching.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastClient: Send + Sync {
    async fn fetch(
        &self,
        api_key: &str,
        query: &str,
        horizon_days: u32,
    ) -> Result<ForecastResponse, ClientError>;
}

/// Construct the WeatherAPI.com client described by `config`.
pub fn client_from_config(config: &Config) -> WeatherApiClient {
    WeatherApiClient::with_base_url(config.base_url.clone())
}
