//! Availability event model.
//!
//! An [`Event`] is one occupied period taken from the rental's calendar feed.
//! Events are produced once per successful fetch, stored in the availability
//! cache and served as-is to the booking page.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "uid": "a1",
//!   "summary": "Reserved",
//!   "start": "2025-07-10T00:00:00.000Z",
//!   "end": "2025-07-12T00:00:00.000Z",
//!   "allDay": true,
//!   "raw": { "location": null, "description": null }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Passthrough fields kept from the source entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Free-form location text.
    pub location: Option<String>,
    /// Free-form description text.
    pub description: Option<String>,
}

/// A normalized calendar entry.
///
/// `start` and `end` describe the half-open interval `[start, end)`: the
/// checkout day itself is not occupied. Either bound may be missing when the
/// source entry was incomplete; such events are kept but never block a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Opaque identifier, unique within a feed when present.
    pub uid: Option<String>,
    /// Human-readable title.
    pub summary: Option<String>,
    /// Start of the occupied period (inclusive), UTC.
    #[serde(with = "iso_millis")]
    pub start: Option<DateTime<Utc>>,
    /// End of the occupied period (exclusive), UTC.
    #[serde(with = "iso_millis")]
    pub end: Option<DateTime<Utc>>,
    /// Whether the source start value was date-only.
    pub all_day: bool,
    /// Passthrough location and description.
    pub raw: EventDetails,
}

impl Event {
    /// Creates an event covering `[start, end)`.
    ///
    /// An `end` earlier than `start` is clamped to `start`.
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, all_day: bool) -> Self {
        let end = match (start, end) {
            (Some(s), Some(e)) if e < s => {
                warn!(start = %s, end = %e, "Event ends before it starts, clamping end");
                Some(s)
            }
            _ => end,
        };

        Self {
            uid: None,
            summary: None,
            start,
            end,
            all_day,
            raw: EventDetails::default(),
        }
    }

    /// Builder method to set the uid.
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.raw.location = Some(location.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.raw.description = Some(description.into());
        self
    }

    /// Returns the occupied interval when both bounds are known.
    pub fn interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.start?, self.end?))
    }

    /// Returns true if the instant falls inside `[start, end)`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.interval()
            .is_some_and(|(start, end)| start <= at && at < end)
    }
}

/// Sorts events ascending by start.
///
/// Events without a start are placed last. The sort is stable, so entries
/// with equal keys keep their feed order and sorting twice is a no-op.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by_key(|event| (event.start.is_none(), event.start));
}

/// ISO-8601 timestamps with millisecond precision and a `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<DateTime<Utc>>::deserialize(deserializer)
    }
}
