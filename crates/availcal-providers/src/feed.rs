//! HTTP source for a remote ICS feed.

use availcal_core::Event;
use reqwest::Client;
use tracing::{debug, info, trace};

use crate::config::FeedConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::ics::parse_ics_content;
use crate::source::{BoxFuture, CalendarSource};

const PROVIDER_NAME: &str = "ics";

/// Fetches a calendar with a single `GET` and parses it.
pub struct IcsFeedSource {
    client: Client,
    config: FeedConfig,
}

impl IcsFeedSource {
    /// Creates a new feed source with the given configuration.
    pub fn new(config: FeedConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_provider(PROVIDER_NAME)
            })?;

        Ok(Self { client, config })
    }

    async fn fetch_body(&self) -> ProviderResult<String> {
        let url = self.config.url.as_str();
        trace!(host = %self.config.host(), "Sending feed request");

        let response = self
            .client
            .get(url)
            .header("Accept", "text/calendar, */*;q=0.5")
            .send()
            .await
            .map_err(|e| {
                // The feed URL carries an access token.
                let e = e.without_url();
                let message = if e.is_timeout() {
                    format!("request to {} timed out", self.config.host())
                } else {
                    format!("request to {} failed: {}", self.config.host(), e)
                };
                ProviderError::network(message)
                    .with_provider(PROVIDER_NAME)
                    .with_source(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                ProviderError::http_status(status.as_u16(), self.config.host())
                    .with_provider(PROVIDER_NAME),
            );
        }

        response.text().await.map_err(|e| {
            let e = e.without_url();
            ProviderError::network(format!("failed to read feed body: {}", e))
                .with_provider(PROVIDER_NAME)
                .with_source(e)
        })
    }
}

impl CalendarSource for IcsFeedSource {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn fetch_events(&self) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        Box::pin(async move {
            let body = self.fetch_body().await?;
            debug!(bytes = body.len(), "Fetched feed body");

            let events =
                parse_ics_content(&body).map_err(|e| e.with_provider(PROVIDER_NAME))?;
            info!(
                host = %self.config.host(),
                events = events.len(),
                "Parsed calendar feed"
            );
            Ok(events)
        })
    }
}
