use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_core::{
    AcquisitionOutcome, Config, ForecastResult, LocationFlow, VisibilityEvent, WeatherController,
};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode};
use tracing::debug;

use crate::{
    device::{ConfiguredLocation, TerminalPrompt},
    render::render,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Weather forecast CLI")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com key and an optional fixed location.
    Configure,

    /// Show the forecast for a city, or for explicit coordinates.
    Show {
        /// City or any location string the provider accepts. Omit it to use the
        /// configured location.
        #[arg(conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Resolve the configured location and show its forecast.
    Locate,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, lat, lon } => show(city, lat.zip(lon)).await,
            Command::Locate => locate().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("WeatherAPI.com key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    cfg.set_api_key(api_key.trim().to_string());

    let allow = Confirm::new("Allow `forecast locate` to use a fixed location?")
        .with_default(cfg.location.allow.unwrap_or(true))
        .prompt()
        .context("Failed to read location permission")?;
    cfg.location.allow = Some(allow);

    if allow {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a decimal number")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a decimal number")
            .prompt()
            .context("Failed to read longitude")?;
        cfg.location.latitude = Some(latitude);
        cfg.location.longitude = Some(longitude);
    }

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: Option<String>, coords: Option<(f64, f64)>) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let controller = WeatherController::from_config(&cfg)?;

    let fetch = match coords {
        Some((lat, lon)) => controller.request_by_coordinates(lat, lon),
        None => controller.request_by_city(city.as_deref().unwrap_or_default().trim()),
    };
    println!("{}", render(Some(&ForecastResult::Loading)));
    fetch.await.context("Forecast task failed")?;

    println!("{}", render(controller.result().as_ref()));
    Ok(())
}

async fn locate() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let controller = Arc::new(WeatherController::from_config(&cfg)?);
    let flow = LocationFlow::new(
        Arc::new(ConfiguredLocation::new(cfg.location.clone())),
        Arc::new(TerminalPrompt),
        Arc::clone(&controller),
    )
    .with_settings(&cfg.location);

    let mut results = controller.subscribe_result();

    match flow.handle(VisibilityEvent::Started).await {
        Some(AcquisitionOutcome::Resolved(coordinates)) => {
            debug!(%coordinates, "waiting for forecast");
            println!("{}", render(Some(&ForecastResult::Loading)));
            let result = results
                .wait_for(|r| r.as_ref().is_some_and(|r| r.is_terminal()))
                .await
                .context("Forecast repository closed")?
                .clone();
            println!("{}", render(result.as_ref()));
        }
        Some(AcquisitionOutcome::NoFix) | Some(AcquisitionOutcome::TimedOut) => {
            println!("No location fix available. Try `forecast show <city>`.");
        }
        Some(AcquisitionOutcome::PermissionDenied)
        | Some(AcquisitionOutcome::ServicesDisabled)
        | None => {}
    }

    Ok(())
}
