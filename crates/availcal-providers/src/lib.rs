//! Calendar Fetch/Parse Adapter.
//!
//! This crate turns a remote calendar feed into availability events:
//!
//! - [`CalendarSource`] - the fetch-and-parse capability the cache wraps
//! - [`IcsFeedSource`] - `GET` an ICS feed over HTTP and parse it
//! - [`parse_ics_content`] - iCalendar text to sorted [`availcal_core::Event`]s
//! - [`ProviderError`] - error type for every failure of the above
//!
//! ```text
//!   remote .ics ──GET──▶ IcsFeedSource ──parse_ics_content──▶ Vec<Event>
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod ics;
pub mod source;

pub use config::FeedConfig;
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use feed::IcsFeedSource;
pub use ics::{parse_duration, parse_ics_content};
pub use source::{BoxFuture, CalendarSource};
