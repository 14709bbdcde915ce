//! Server configuration and command line.
//!
//! Every option can come from a flag or from the environment. A `.env` file
//! in the working directory is loaded before parsing, so a deployment only
//! needs `ICAL_URL=...` next to the binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use availcal_core::TracingOutputFormat;
use availcal_providers::FeedConfig;
use clap::Parser;

use crate::error::{ServerError, ServerResult};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,

    /// Remote calendar feed.
    pub feed: FeedConfig,

    /// How long a fetched snapshot is served before refreshing.
    pub cache_ttl: Duration,

    /// Upper bound on one refresh.
    pub fetch_timeout: Duration,
}

impl ServerConfig {
    /// Snapshot lifetime.
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

    /// Listening port.
    pub const DEFAULT_PORT: u16 = 4000;

    /// Creates a configuration for the given feed with default settings.
    pub fn new(feed: FeedConfig) -> Self {
        let fetch_timeout = feed.timeout;
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, Self::DEFAULT_PORT)),
            feed,
            cache_ttl: Self::DEFAULT_CACHE_TTL,
            fetch_timeout,
        }
    }

    /// Builder: set bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Builder: set cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Builder: set fetch timeout. Also bounds the HTTP request itself.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self.feed = self.feed.with_timeout(timeout);
        self
    }
}

/// availcal-server - calendar availability for a rental booking page
#[derive(Debug, Parser)]
#[command(name = "availcal-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// URL of the rental's ICS calendar feed (http, https or webcal)
    #[arg(long, env = "ICAL_URL")]
    pub ical_url: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = ServerConfig::DEFAULT_PORT)]
    pub port: u16,

    /// Address to listen on
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Seconds to wait for the feed before failing the request
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = FeedConfig::DEFAULT_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Log output format: pretty, compact or json
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: TracingOutputFormat,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

impl Cli {
    /// Builds the server configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the feed URL is missing or invalid,
    /// or if the fetch timeout is zero.
    pub fn server_config(&self) -> ServerResult<ServerConfig> {
        let url = self
            .ical_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ServerError::config("ICAL_URL is not set"))?;

        if self.fetch_timeout_secs == 0 {
            return Err(ServerError::config("fetch timeout must be at least one second"));
        }

        let feed = FeedConfig::new(url).map_err(|e| ServerError::config(e.message()))?;

        Ok(ServerConfig::new(feed)
            .with_bind_addr(SocketAddr::new(self.host, self.port))
            .with_fetch_timeout(Duration::from_secs(self.fetch_timeout_secs)))
    }
}
