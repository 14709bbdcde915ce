//! Availability service: TTL cache over a remote calendar feed.
//!
//! This crate provides the HTTP service behind the rental booking page:
//! - `GET /api/availability` returning the occupied periods as JSON
//! - An [`AvailabilityCache`] bounding calls to the remote feed to one per TTL
//! - Configuration from flags, environment and `.env`
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Example
//!
//! ```rust,no_run
//! use availcal_providers::FeedConfig;
//! use availcal_server::{ServerConfig, SignalHandler, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let feed = FeedConfig::new("https://example.com/calendar.ics")?;
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener();
//!
//!     serve(ServerConfig::new(feed), signals.shutdown()).await?;
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod error;
pub mod routes;
mod server;
mod signals;
mod state;

pub use cache::{Availability, AvailabilityCache, CacheEntry, Source};
pub use config::{Cli, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::serve;
pub use signals::{ShutdownSignal, SignalHandler};
pub use state::AppState;
