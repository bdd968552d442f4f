//! Terminal stand-ins for the platform location services and user prompts.

use async_trait::async_trait;
use forecast_core::{
    Config, Coordinates, LocationRequest, LocationServices, LocationSettings, Permission,
    ProviderKind, UserPrompt,
};
use inquire::Confirm;
use tracing::debug;

/// Location source backed by the `[location]` section of the config file.
#[derive(Debug, Clone)]
pub struct ConfiguredLocation {
    settings: LocationSettings,
}

impl ConfiguredLocation {
    pub fn new(settings: LocationSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl LocationServices for ConfiguredLocation {
    fn check_permission(&self) -> Permission {
        match self.settings.allow {
            Some(true) => Permission::Granted,
            _ => Permission::Denied,
        }
    }

    async fn request_permission(&self) -> Permission {
        // An explicit "no" in the config is remembered.
        if self.settings.allow == Some(false) {
            return Permission::Denied;
        }

        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new("Allow forecast to use your configured location?")
                .with_default(true)
                .prompt()
        })
        .await;

        match answer {
            Ok(Ok(true)) => Permission::Granted,
            _ => Permission::Denied,
        }
    }

    fn is_provider_enabled(&self, kind: ProviderKind) -> bool {
        // A configured position is the only provider a terminal has.
        kind == ProviderKind::Gps && self.settings.coordinates().is_some()
    }

    async fn request_one_shot_location(&self, request: LocationRequest) -> Option<Coordinates> {
        debug!(?request, "reading configured location");
        self.settings.coordinates()
    }
}

/// Prints notices to stderr.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt;

impl UserPrompt for TerminalPrompt {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }

    fn open_location_settings(&self) {
        match Config::config_file_path() {
            Ok(path) => eprintln!(
                "Set [location] latitude and longitude in {} or run `forecast configure`.",
                path.display()
            ),
            Err(_) => eprintln!("Run `forecast configure` to set a location."),
        }
    }
}
