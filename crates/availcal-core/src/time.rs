//! Day-level availability derived from events.
//!
//! Every event covers the half-open interval `[start, end)`. A day is blocked
//! when the walk `start, start + 1 day, ...` visits it before reaching `end`,
//! which leaves the checkout day free for the next arrival.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

use crate::event::Event;

/// Returns the set of UTC days occupied by the given events.
///
/// Events missing either bound are skipped.
pub fn blocked_days<'a, I>(events: I) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut days = BTreeSet::new();

    for (start, end) in events.into_iter().filter_map(Event::interval) {
        let mut cursor = start;
        while cursor < end {
            days.insert(cursor.date_naive());
            cursor += Duration::days(1);
        }
    }

    days
}

/// Returns true if no night between `check_in` (inclusive) and `check_out`
/// (exclusive) is blocked.
///
/// An empty or inverted range is trivially free.
pub fn is_range_free(events: &[Event], check_in: NaiveDate, check_out: NaiveDate) -> bool {
    if check_out <= check_in {
        return true;
    }

    let blocked = blocked_days(events);
    blocked.range(check_in..check_out).next().is_none()
}
