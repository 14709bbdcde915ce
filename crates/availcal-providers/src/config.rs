//! Remote feed configuration.

use std::time::Duration;
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Configuration for an [`IcsFeedSource`](crate::IcsFeedSource).
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// URL of the ICS feed. Always `http` or `https`.
    pub url: Url,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl FeedConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Creates a feed configuration for the given URL.
    ///
    /// `webcal://` URLs, as handed out by most booking platforms, are
    /// rewritten to `https://`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL does not parse or uses a
    /// scheme other than `http`, `https` or `webcal`.
    pub fn new(url: impl AsRef<str>) -> ProviderResult<Self> {
        let raw = url.as_ref().trim();
        let mut parsed = Url::parse(raw).map_err(|e| {
            ProviderError::configuration(format!("invalid calendar URL '{raw}': {e}"))
                .with_source(e)
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            "webcal" => {
                let rewritten = format!("https{}", &parsed.as_str()["webcal".len()..]);
                parsed = Url::parse(&rewritten).map_err(|e| {
                    ProviderError::configuration(format!("invalid calendar URL '{raw}': {e}"))
                })?;
            }
            other => {
                return Err(ProviderError::configuration(format!(
                    "unsupported calendar URL scheme '{other}' (expected http, https or webcal)"
                )));
            }
        }

        Ok(Self {
            url: parsed,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("availcal/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Host of the feed, for logs. The full URL usually embeds a secret token.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("<none>")
    }
}
