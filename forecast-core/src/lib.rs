//! Core library for the `forecast` weather client.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The forecast client for WeatherAPI.com
//! - The repository owning the current forecast result, and the controller in front of it
//! - The location acquisition flow that feeds device coordinates into the controller
//!
//! It is used by `forecast-cli`, but can also back other front ends.

pub mod client;
pub mod config;
pub mod controller;
pub mod location;
pub mod model;
pub mod repository;

pub use client::{ClientError, ForecastClient, ForecastResponse};
pub use config::{Config, LocationSettings};
pub use controller::WeatherController;
pub use location::{
    AcquisitionOutcome, AcquisitionState, LocationFlow, LocationRequest, LocationServices,
    Permission, ProviderKind, UserPrompt, VisibilityEvent,
};
pub use model::{
    Condition, Coordinates, CurrentConditions, DayForecast, ForecastPayload, ForecastQuery,
    ForecastResult, HourForecast, LocationInfo, LocationQuery,
};
pub use repository::ForecastRepository;
