use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

use crate::{
    Config,
    client::client_from_config,
    model::{Coordinates, ForecastQuery, ForecastResult, LocationQuery},
    repository::ForecastRepository,
};

/// Mediates between the presentation layer and the [`ForecastRepository`].
///
/// Besides forwarding commands it keeps two pieces of UI state the repository
/// does not own: a loading flag raised while a location fix is pending, and the
/// last coordinates used for a query. Commands are fire-and-forget; each returns
/// the handle of the spawned fetch so callers may await it if they care.
#[derive(Debug)]
pub struct WeatherController {
    repository: Arc<ForecastRepository>,
    loading: watch::Sender<bool>,
    coordinates: watch::Sender<Option<String>>,
}

impl WeatherController {
    pub fn new(repository: Arc<ForecastRepository>) -> Self {
        let (loading, _) = watch::channel(false);
        let (coordinates, _) = watch::channel(None);
        Self { repository, loading, coordinates }
    }

    /// Wire the WeatherAPI.com client, repository and controller from `config`.
    ///
    /// A configured location the user allowed becomes the stored coordinates, so an
    /// empty search falls back to it.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.api_key()?;
        let client = Arc::new(client_from_config(config));
        let repository = ForecastRepository::new(client, api_key, config.horizon_days);

        let known = match config.location.allow {
            Some(true) => config.location.coordinates(),
            _ => None,
        };
        Ok(Self::new(Arc::new(repository)).with_coordinates(known))
    }

    /// Seed the last known coordinates.
    pub fn with_coordinates(self, coordinates: Option<Coordinates>) -> Self {
        self.coordinates.send_replace(coordinates.map(|c| c.as_query()));
        self
    }

    /// Search by free text. An empty name falls back to the stored coordinates.
    pub fn request_by_city(&self, name: &str) -> JoinHandle<()> {
        let text = if name.is_empty() {
            // With nothing stored the empty string goes out as-is and the
            // provider's rejection becomes the visible error.
            self.coordinates.borrow().clone().unwrap_or_default()
        } else {
            name.to_string()
        };

        self.dispatch(ForecastQuery::new(
            LocationQuery::Text(text),
            self.repository.horizon_days(),
        ))
    }

    pub fn request_by_coordinates(&self, latitude: f64, longitude: f64) -> JoinHandle<()> {
        let query = ForecastQuery::new(
            LocationQuery::Coordinates(Coordinates::new(latitude, longitude)),
            self.repository.horizon_days(),
        );
        self.coordinates.send_replace(Some(query.query_string()));

        self.dispatch(query)
    }

    pub fn set_loading(&self, flag: bool) {
        self.loading.send_replace(flag);
    }

    pub fn result(&self) -> Option<ForecastResult> {
        self.repository.current()
    }

    pub fn subscribe_result(&self) -> watch::Receiver<Option<ForecastResult>> {
        self.repository.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn coordinates(&self) -> Option<String> {
        self.coordinates.borrow().clone()
    }

    pub fn subscribe_coordinates(&self) -> watch::Receiver<Option<String>> {
        self.coordinates.subscribe()
    }

    /// True while either a fetch is in flight or a location fix is pending.
    pub fn is_busy(&self) -> bool {
        self.is_loading() || self.result().is_some_and(|r| r.is_loading())
    }

    fn dispatch(&self, query: ForecastQuery) -> JoinHandle<()> {
        debug!(?query, "dispatching forecast request");
        let q = query.query_string();
        let repository = Arc::clone(&self.repository);
        tokio::spawn(async move { repository.fetch_weather_data(&q).await })
    }
}
