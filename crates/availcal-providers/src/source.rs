//! CalendarSource trait definition.
//!
//! A [`CalendarSource`] is the fetch-and-parse capability the availability
//! cache wraps: one call retrieves the whole remote calendar and returns it
//! as an ordered list of [`Event`]s, or fails.

use std::future::Future;
use std::pin::Pin;

use availcal_core::Event;

use crate::error::ProviderResult;

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A remote calendar that can be fetched and normalized in one step.
///
/// Implementations must return events sorted with
/// [`availcal_core::sort_events`] and must not return partial results: either
/// the whole feed was fetched and parsed, or an error is returned.
pub trait CalendarSource: Send + Sync {
    /// Returns a short name for logs (e.g. "ics").
    fn name(&self) -> &str;

    /// Fetches and parses the calendar.
    ///
    /// # Errors
    ///
    /// Returns a `ProviderError` on network failures, non-success statuses
    /// and payloads that are not calendars.
    fn fetch_events(&self) -> BoxFuture<'_, ProviderResult<Vec<Event>>>;
}
