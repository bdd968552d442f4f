use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    client::ForecastClient,
    model::ForecastResult,
};

pub const EXCEPTION_MESSAGE: &str = "Failed to load data due to exception";
pub const FAILURE_MESSAGE: &str = "Failed to load data";

/// Sole owner and writer of the current [`ForecastResult`].
///
/// The slot holds `None` until the first request. Every call to
/// [`fetch_weather_data`](Self::fetch_weather_data) publishes `Loading` followed by
/// exactly one terminal value. Overlapping calls are not coordinated; whichever
/// finishes last leaves its result in the slot.
pub struct ForecastRepository {
    client: Arc<dyn ForecastClient>,
    api_key: String,
    horizon_days: u32,
    state: watch::Sender<Option<ForecastResult>>,
}

impl ForecastRepository {
    pub fn new(client: Arc<dyn ForecastClient>, api_key: String, horizon_days: u32) -> Self {
        let (state, _) = watch::channel(None);
        Self { client, api_key, horizon_days, state }
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// Read-only view of the result slot.
    pub fn subscribe(&self) -> watch::Receiver<Option<ForecastResult>> {
        self.state.subscribe()
    }

    pub fn current(&self) -> Option<ForecastResult> {
        self.state.borrow().clone()
    }

    pub async fn fetch_weather_data(&self, query: &str) {
        self.publish(ForecastResult::Loading);

        let outcome = self.client.fetch(&self.api_key, query, self.horizon_days).await;

        let result = match outcome {
            Ok(response) if response.is_success() => match response.payload {
                Some(payload) => {
                    info!(
                        query,
                        location = %payload.location.name,
                        days = payload.forecast.len(),
                        "forecast loaded"
                    );
                    ForecastResult::Success(payload)
                }
                None => {
                    warn!(query, status = response.status, "forecast response had no payload");
                    ForecastResult::Error(FAILURE_MESSAGE.to_string())
                }
            },
            Ok(response) => {
                warn!(query, status = response.status, "forecast request was rejected");
                ForecastResult::Error(FAILURE_MESSAGE.to_string())
            }
            Err(err) => {
                warn!(query, error = %err, "forecast request failed");
                ForecastResult::Error(EXCEPTION_MESSAGE.to_string())
            }
        };

        self.publish(result);
    }

    fn publish(&self, result: ForecastResult) {
        debug!(?result, "publishing forecast result");
        // Keeps the value even with no subscribers attached.
        self.state.send_replace(Some(result));
    }
}

impl std::fmt::Debug for ForecastRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastRepository")
            .field("horizon_days", &self.horizon_days)
            .field("current", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, ForecastResponse, MockForecastClient};
    use crate::model::fixtures;
    use mockall::predicate::eq;

    fn repository_with(client: MockForecastClient) -> ForecastRepository {
        ForecastRepository::new(Arc::new(client), "KEY".into(), 10)
    }

    #[tokio::test]
    async fn starts_empty() {
        let repo = repository_with(MockForecastClient::new());
        assert_eq!(repo.current(), None);
    }

    #[tokio::test]
    async fn success_publishes_payload_with_requested_horizon() {
        let mut client = MockForecastClient::new();
        client
            .expect_fetch()
            .with(eq("KEY"), eq("London"), eq(10))
            .times(1)
            .returning(|_, _, days| Ok(ForecastResponse::success(fixtures::payload(days as usize))));

        let repo = repository_with(client);
        repo.fetch_weather_data("London").await;

        match repo.current() {
            Some(ForecastResult::Success(payload)) => assert_eq!(payload.forecast.len(), 10),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_publishes_exception_message() {
        let mut client = MockForecastClient::new();
        client
            .expect_fetch()
            .returning(|_, _, _| Err(ClientError::Transport("connection reset".into())));

        let repo = repository_with(client);
        repo.fetch_weather_data("London").await;

        assert_eq!(
            repo.current(),
            Some(ForecastResult::Error("Failed to load data due to exception".into()))
        );
    }

    #[tokio::test]
    async fn decode_failure_publishes_exception_message() {
        let mut client = MockForecastClient::new();
        client
            .expect_fetch()
            .returning(|_, _, _| Err(ClientError::Decode("expected value".into())));

        let repo = repository_with(client);
        repo.fetch_weather_data("London").await;

        assert_eq!(repo.current(), Some(ForecastResult::Error(EXCEPTION_MESSAGE.into())));
    }

    #[tokio::test]
    async fn rejected_status_publishes_failure_message() {
        let mut client = MockForecastClient::new();
        client.expect_fetch().returning(|_, _, _| Ok(ForecastResponse::failed(400)));

        let repo = repository_with(client);
        repo.fetch_weather_data("nowhere").await;

        assert_eq!(repo.current(), Some(ForecastResult::Error("Failed to load data".into())));
    }

    #[tokio::test]
    async fn empty_payload_publishes_failure_message() {
        let mut client = MockForecastClient::new();
        client
            .expect_fetch()
            .returning(|_, _, _| Ok(ForecastResponse { status: 200, payload: None }));

        let repo = repository_with(client);
        repo.fetch_weather_data("London").await;

        assert_eq!(repo.current(), Some(ForecastResult::Error(FAILURE_MESSAGE.into())));
    }

    #[tokio::test]
    async fn short_forecast_is_still_success() {
        let mut client = MockForecastClient::new();
        client
            .expect_fetch()
            .returning(|_, _, _| Ok(ForecastResponse::success(fixtures::payload(3))));

        let repo = repository_with(client);
        repo.fetch_weather_data("London").await;

        assert!(repo.current().is_some_and(|r| r.is_success()));
    }

    #[tokio::test]
    async fn loading_precedes_exactly_one_terminal_publish() {
        let (client, release) = testing::GatedClient::new();
        let repo = Arc::new(ForecastRepository::new(Arc::new(client), "KEY".into(), 10));
        let mut rx = repo.subscribe();

        let task = tokio::spawn({
            let repo = Arc::clone(&repo);
            async move { repo.fetch_weather_data("London").await }
        });

        rx.changed().await.expect("repository alive");
        assert_eq!(*rx.borrow_and_update(), Some(ForecastResult::Loading));

        release
            .send(Ok(ForecastResponse::success(fixtures::payload(10))))
            .expect("fetch is waiting");

        rx.changed().await.expect("repository alive");
        assert!(rx.borrow_and_update().as_ref().is_some_and(|r| r.is_success()));

        task.await.expect("fetch task completes");
        assert!(!rx.has_changed().expect("repository alive"));
    }

    #[tokio::test]
    async fn subscribers_share_the_same_slot() {
        let mut client = MockForecastClient::new();
        client.expect_fetch().times(2).returning(|_, query, _| {
            if query == "bad" {
                Ok(ForecastResponse::failed(400))
            } else {
                Ok(ForecastResponse::success(fixtures::payload(1)))
            }
        });

        let repo = repository_with(client);
        let first = repo.subscribe();
        let second = repo.subscribe();

        repo.fetch_weather_data("London").await;
        repo.fetch_weather_data("bad").await;

        let expected = Some(ForecastResult::Error(FAILURE_MESSAGE.into()));
        assert_eq!(*first.borrow(), expected);
        assert_eq!(*second.borrow(), expected);
    }
}
