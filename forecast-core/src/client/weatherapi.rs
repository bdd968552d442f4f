use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::{
    Condition, CurrentConditions, DayForecast, ForecastPayload, HourForecast, LocationInfo,
};

use super::{ClientError, ForecastClient, ForecastResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

const FORECAST_PATH: &str = "/v1/forecast.json";

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    base_url: String,
    http: Client,
}

impl WeatherApiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: Client::new() }
    }

    pub fn forecast_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), FORECAST_PATH)
    }
}

impl Default for WeatherApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForecastClient for WeatherApiClient {
    async fn fetch(
        &self,
        api_key: &str,
        query: &str,
        horizon_days: u32,
    ) -> Result<ForecastResponse, ClientError> {
        debug!(query, horizon_days, "requesting forecast from WeatherAPI.com");

        let days = horizon_days.to_string();
        let res = self
            .http
            .get(self.forecast_url())
            .query(&[
                ("key", api_key),
                ("q", query),
                ("days", days.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| ClientError::Transport(format!("failed to read response body: {e}")))?;

        read_response(status, &body)
    }
}

/// Turn a raw status and body into a [`ForecastResponse`].
fn read_response(status: u16, body: &str) -> Result<ForecastResponse, ClientError> {
    if !(200..300).contains(&status) {
        warn!(status, body = %truncate_body(body), "WeatherAPI forecast request failed");
        return Ok(ForecastResponse::failed(status));
    }

    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        warn!(status, "WeatherAPI returned an empty forecast body");
        return Ok(ForecastResponse { status, payload: None });
    }

    let parsed: WaForecastResponse =
        serde_json::from_str(trimmed).map_err(|e| ClientError::Decode(e.to_string()))?;

    let payload = ForecastPayload::from(parsed);
    debug!(
        location = %payload.location.name,
        days = payload.forecast.len(),
        "decoded forecast"
    );

    Ok(ForecastResponse { status, payload: Some(payload) })
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    #[serde(default)]
    icon: String,
    code: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    #[serde(default)]
    region: String,
    country: String,
    localtime: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    wind_kph: f64,
    uv: f64,
    precip_mm: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    avgtemp_c: f64,
    maxtemp_c: f64,
    mintemp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    time: String,
    temp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
    #[serde(default)]
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    #[serde(default)]
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: WaForecast,
}

impl From<WaCondition> for Condition {
    fn from(c: WaCondition) -> Self {
        Condition { text: c.text, icon: c.icon, code: c.code }
    }
}

impl From<WaForecastResponse> for ForecastPayload {
    fn from(parsed: WaForecastResponse) -> Self {
        let location = LocationInfo {
            name: parsed.location.name,
            region: parsed.location.region,
            country: parsed.location.country,
            localtime: parsed.location.localtime,
        };

        let current = CurrentConditions {
            temperature_c: parsed.current.temp_c,
            feels_like_c: parsed.current.feelslike_c,
            humidity_pct: parsed.current.humidity,
            wind_kph: parsed.current.wind_kph,
            uv: parsed.current.uv,
            precip_mm: parsed.current.precip_mm,
            condition: parsed.current.condition.into(),
        };

        let forecast = parsed
            .forecast
            .forecastday
            .into_iter()
            .map(|d| DayForecast {
                date: d.date,
                avg_temp_c: d.day.avgtemp_c,
                max_temp_c: d.day.maxtemp_c,
                min_temp_c: d.day.mintemp_c,
                condition: d.day.condition.into(),
                hours: d
                    .hour
                    .into_iter()
                    .map(|h| HourForecast {
                        time: h.time,
                        temperature_c: h.temp_c,
                        condition: h.condition.into(),
                    })
                    .collect(),
            })
            .collect();

        ForecastPayload { location, current, forecast }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
