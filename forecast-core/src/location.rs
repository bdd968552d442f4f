//! Location acquisition: permission, provider check and a one-shot fix, feeding
//! the resolved coordinates into [`WeatherController::request_by_coordinates`].
//!
//! The flow is driven by [`VisibilityEvent`]s from whatever hosts the UI. Once a
//! forecast has loaded successfully in this session, further `Started` events
//! are ignored. A pause before that point schedules another attempt on resume.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{config::LocationSettings, controller::WeatherController, model::Coordinates};

pub const PERMISSION_DENIED_MESSAGE: &str = "Location permission denied";
pub const SERVICES_DISABLED_MESSAGE: &str = "Please enable location services";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Satellite, device precision.
    Gps,
    /// Cell and Wi-Fi, network precision.
    Network,
}

/// Parameters for a single location update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub interval: Duration,
    pub min_update_interval: Duration,
    pub max_updates: u32,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            min_update_interval: Duration::from_secs(5),
            max_updates: 1,
        }
    }
}

/// Platform location services.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationServices: Send + Sync {
    fn check_permission(&self) -> Permission;

    /// Ask the user for permission and wait for the answer.
    async fn request_permission(&self) -> Permission;

    fn is_provider_enabled(&self, kind: ProviderKind) -> bool;

    /// Deliver at most one fix. `None` when the source gave up without one.
    async fn request_one_shot_location(&self, request: LocationRequest) -> Option<Coordinates>;
}

/// Transient user-facing notices raised by the flow.
#[cfg_attr(test, mockall::automock)]
pub trait UserPrompt: Send + Sync {
    fn notify(&self, message: &str);

    fn open_location_settings(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    PermissionRequested,
    ProviderChecked,
    LocationRequested,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcquisitionOutcome {
    PermissionDenied,
    ServicesDisabled,
    Resolved(Coordinates),
    /// The source finished without a fix. Nothing was published.
    NoFix,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityEvent {
    Started,
    Paused,
    Resumed,
}

#[derive(Debug, Default)]
struct Session {
    location_fetched: bool,
    relaunch: bool,
}

pub struct LocationFlow {
    services: Arc<dyn LocationServices>,
    prompt: Arc<dyn UserPrompt>,
    controller: Arc<WeatherController>,
    request: LocationRequest,
    fix_timeout: Option<Duration>,
    start_delay: Duration,
    state: watch::Sender<AcquisitionState>,
    session: Mutex<Session>,
}

impl LocationFlow {
    pub fn new(
        services: Arc<dyn LocationServices>,
        prompt: Arc<dyn UserPrompt>,
        controller: Arc<WeatherController>,
    ) -> Self {
        let (state, _) = watch::channel(AcquisitionState::Idle);
        Self {
            services,
            prompt,
            controller,
            request: LocationRequest::default(),
            fix_timeout: None,
            start_delay: Duration::from_millis(500),
            state,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn with_settings(self, settings: &LocationSettings) -> Self {
        Self {
            request: settings.request(),
            fix_timeout: settings.fix_timeout(),
            start_delay: settings.start_delay(),
            ..self
        }
    }

    pub fn with_fix_timeout(self, fix_timeout: Option<Duration>) -> Self {
        Self { fix_timeout, ..self }
    }

    pub fn with_start_delay(self, start_delay: Duration) -> Self {
        Self { start_delay, ..self }
    }

    pub fn state(&self) -> AcquisitionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AcquisitionState> {
        self.state.subscribe()
    }

    /// React to a visibility change. Returns the outcome when a cycle ran.
    pub async fn handle(&self, event: VisibilityEvent) -> Option<AcquisitionOutcome> {
        let run = {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            if self.controller.result().is_some_and(|r| r.is_success()) {
                session.location_fetched = true;
            }

            match event {
                VisibilityEvent::Started => !session.location_fetched,
                VisibilityEvent::Paused => {
                    if !session.location_fetched {
                        session.relaunch = true;
                    }
                    false
                }
                VisibilityEvent::Resumed => std::mem::take(&mut session.relaunch),
            }
        };

        debug!(?event, run, "visibility event");
        if !run {
            return None;
        }

        if event == VisibilityEvent::Started {
            tokio::time::sleep(self.start_delay).await;
        }

        Some(self.acquire().await)
    }

    /// Run one acquisition cycle from `Idle`.
    pub async fn acquire(&self) -> AcquisitionOutcome {
        self.transition(AcquisitionState::Idle);

        if self.services.check_permission() != Permission::Granted {
            self.transition(AcquisitionState::PermissionRequested);

            if self.services.request_permission().await != Permission::Granted {
                info!("location permission denied");
                self.prompt.notify(PERMISSION_DENIED_MESSAGE);
                self.transition(AcquisitionState::Idle);
                return AcquisitionOutcome::PermissionDenied;
            }
        }

        self.locate().await
    }

    async fn locate(&self) -> AcquisitionOutcome {
        self.transition(AcquisitionState::ProviderChecked);

        let gps = self.services.is_provider_enabled(ProviderKind::Gps);
        let network = self.services.is_provider_enabled(ProviderKind::Network);

        if !(gps || network) {
            info!("no location provider enabled");
            self.prompt.notify(SERVICES_DISABLED_MESSAGE);
            self.prompt.open_location_settings();
            self.transition(AcquisitionState::Idle);
            return AcquisitionOutcome::ServicesDisabled;
        }

        self.controller.set_loading(true);
        self.transition(AcquisitionState::LocationRequested);

        let pending = self.services.request_one_shot_location(self.request);
        let fix = match self.fix_timeout {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(fix) => fix,
                Err(_) => {
                    warn!(?limit, "timed out waiting for a location fix");
                    self.controller.set_loading(false);
                    self.transition(AcquisitionState::Idle);
                    return AcquisitionOutcome::TimedOut;
                }
            },
            None => pending.await,
        };

        let outcome = match fix {
            Some(coordinates) => {
                debug!(%coordinates, "location resolved");
                self.transition(AcquisitionState::Resolved);
                // The fetch runs on its own; its result arrives through the repository.
                drop(
                    self.controller
                        .request_by_coordinates(coordinates.latitude, coordinates.longitude),
                );
                AcquisitionOutcome::Resolved(coordinates)
            }
            None => {
                warn!("location source finished without a fix");
                self.transition(AcquisitionState::Idle);
                AcquisitionOutcome::NoFix
            }
        };

        self.controller.set_loading(false);
        outcome
    }

    fn transition(&self, next: AcquisitionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(?prev, ?next, "location flow transition");
        }
    }
}

impl std::fmt::Debug for LocationFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationFlow")
            .field("state", &self.state())
            .field("request", &self.request)
            .field("fix_timeout", &self.fix_timeout)
            .field("start_delay", &self.start_delay)
            .finish_non_exhaustive()
    }
}
