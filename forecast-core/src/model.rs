use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved position, produced by the location acquisition flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Provider query form, e.g. `"12.34,56.78"`. Whole degrees keep one decimal (`"10.0"`).
    pub fn as_query(&self) -> String {
        format!("{},{}", degrees(self.latitude), degrees(self.longitude))
    }
}

fn degrees(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_query())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// City name, or any free-form string the provider understands.
    Text(String),
    Coordinates(Coordinates),
}

/// One forecast request. Built per user action and dropped once issued.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastQuery {
    pub location: LocationQuery,
    pub horizon_days: u32,
}

impl ForecastQuery {
    pub fn new(location: LocationQuery, horizon_days: u32) -> Self {
        Self { location, horizon_days }
    }

    /// Value sent as the provider's `q` parameter.
    pub fn query_string(&self) -> String {
        match &self.location {
            LocationQuery::Text(text) => text.clone(),
            LocationQuery::Coordinates(coords) => coords.as_query(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    /// Protocol-relative icon path as sent by the provider (`//cdn.weatherapi.com/...`).
    pub icon: String,
    pub code: Option<u32>,
}

impl Condition {
    /// Absolute URL of the large variant of the condition icon.
    pub fn icon_url(&self) -> String {
        let icon = self.icon.replace("64x64", "128x128");
        if icon.starts_with("//") {
            format!("https:{icon}")
        } else {
            icon
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub name: String,
    pub region: String,
    pub country: String,
    /// Provider local time, `"YYYY-MM-DD HH:MM"`.
    pub localtime: String,
}

impl LocationInfo {
    pub fn local_date(&self) -> Option<&str> {
        self.localtime.split_once(' ').map(|(date, _)| date)
    }

    pub fn local_time(&self) -> Option<&str> {
        self.localtime.split_once(' ').map(|(_, time)| time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub uv: f64,
    pub precip_mm: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourForecast {
    /// `"YYYY-MM-DD HH:MM"`, provider local time.
    pub time: String,
    pub temperature_c: f64,
    pub condition: Condition,
}

impl HourForecast {
    pub fn hour_label(&self) -> &str {
        self.time
            .split_once(' ')
            .map(|(_, hour)| hour)
            .unwrap_or(self.time.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub avg_temp_c: f64,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub condition: Condition,
    pub hours: Vec<HourForecast>,
}

impl DayForecast {
    /// Abbreviated weekday and day of month, e.g. `"Mon 7"`.
    pub fn short_label(&self) -> String {
        self.date.format("%a %-d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub location: LocationInfo,
    pub current: CurrentConditions,
    pub forecast: Vec<DayForecast>,
}

impl ForecastPayload {
    /// First forecast day. The provider may return fewer days than requested.
    pub fn today(&self) -> Option<&DayForecast> {
        self.forecast.first()
    }
}

/// Tri-state outcome of a forecast request.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastResult {
    Loading,
    Success(ForecastPayload),
    Error(String),
}

impl ForecastResult {
    pub fn is_loading(&self) -> bool {
        matches!(self, ForecastResult::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ForecastResult::Success(_))
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_loading()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_use_shortest_float_form() {
        assert_eq!(Coordinates::new(12.34, 56.78).as_query(), "12.34,56.78");
        assert_eq!(Coordinates::new(-33.8688, 151.2093).to_string(), "-33.8688,151.2093");
    }

    #[test]
    fn whole_degrees_keep_one_decimal() {
        assert_eq!(Coordinates::new(10.0, -20.0).as_query(), "10.0,-20.0");
        assert_eq!(Coordinates::new(0.0, 151.5).as_query(), "0.0,151.5");
    }

    #[test]
    fn query_string_for_text_and_coordinates() {
        let by_city = ForecastQuery::new(LocationQuery::Text("Paris".into()), 10);
        assert_eq!(by_city.query_string(), "Paris");

        let by_coords =
            ForecastQuery::new(LocationQuery::Coordinates(Coordinates::new(48.85, 2.35)), 3);
        assert_eq!(by_coords.query_string(), "48.85,2.35");
        assert_eq!(by_coords.horizon_days, 3);
    }

    #[test]
    fn icon_url_is_absolute_and_upscaled() {
        let condition = fixtures::condition("Sunny");
        assert_eq!(
            condition.icon_url(),
            "https://cdn.weatherapi.com/weather/128x128/day/116.png"
        );
    }

    #[test]
    fn localtime_splits_into_date_and_time() {
        let payload = fixtures::payload(1);
        assert_eq!(payload.location.local_date(), Some("2024-10-07"));
        assert_eq!(payload.location.local_time(), Some("13:45"));

        let odd = LocationInfo { localtime: "unknown".into(), ..payload.location };
        assert_eq!(odd.local_date(), None);
        assert_eq!(odd.local_time(), None);
    }

    #[test]
    fn day_and_hour_labels() {
        let payload = fixtures::payload(2);
        let today = payload.today().expect("one day present");
        assert_eq!(today.short_label(), "Mon 7");
        assert_eq!(today.hours[9].hour_label(), "09:00");
        assert_eq!(payload.forecast[1].short_label(), "Tue 8");
    }

    #[test]
    fn today_tolerates_empty_forecast() {
        let payload = fixtures::payload(0);
        assert!(payload.today().is_none());
    }

    #[test]
    fn result_predicates() {
        assert!(ForecastResult::Loading.is_loading());
        assert!(!ForecastResult::Loading.is_terminal());
        assert!(ForecastResult::Error("x".into()).is_terminal());
        assert!(ForecastResult::Success(fixtures::payload(1)).is_success());
    }
}
