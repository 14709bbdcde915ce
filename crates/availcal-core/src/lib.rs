//! Core types: availability events, blocked days, tracing

pub mod event;
pub mod time;
pub mod tracing;

pub use event::{Event, EventDetails, sort_events};
pub use time::{blocked_days, is_range_free};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
