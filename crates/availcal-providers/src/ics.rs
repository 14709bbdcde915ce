//! ICS/iCalendar parsing utilities.
//!
//! This module parses iCalendar (RFC 5545) data and converts every `VEVENT`
//! into an [`Event`]. Parsing is lenient per entry: missing or malformed
//! properties become `None`, they never abort the whole document.

use availcal_core::{Event, sort_events};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, EventLike,
};
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

/// Parses ICS content into events sorted by start.
///
/// # Errors
///
/// Returns an `invalid_response` error if the content is not an iCalendar
/// document at all, or if it is rejected and holds no VEVENT block.
/// Malformed content lines and unparsable VEVENTs are skipped with a warning.
pub fn parse_ics_content(ics: &str) -> ProviderResult<Vec<Event>> {
    if !ics
        .trim_start_matches('\u{feff}')
        .trim_start()
        .to_ascii_uppercase()
        .starts_with("BEGIN:VCALENDAR")
    {
        return Err(ProviderError::invalid_response(
            "payload is not an iCalendar document",
        ));
    }

    let cleaned = drop_malformed_lines(ics);
    let mut events = match cleaned.parse::<Calendar>() {
        Ok(calendar) => events_in(&calendar),
        Err(e) => {
            warn!(error = %e, "Calendar rejected as a whole, parsing events one by one");
            parse_each_event(&cleaned).ok_or_else(|| {
                ProviderError::invalid_response(format!("failed to parse ICS content: {e}"))
            })?
        }
    };

    sort_events(&mut events);
    Ok(events)
}

fn events_in(calendar: &Calendar) -> Vec<Event> {
    calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => Some(parse_event(event)),
            _ => None,
        })
        .collect()
}

/// Unfolds content lines and drops the ones without a `name:value` shape.
fn drop_malformed_lines(ics: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for raw in ics.trim_start_matches('\u{feff}').split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if let (Some(rest), Some(last)) = (line.strip_prefix([' ', '\t']), lines.last_mut()) {
            last.push_str(rest);
            continue;
        }
        lines.push(line.to_string());
    }

    let mut cleaned = String::with_capacity(ics.len());
    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if !line.contains(':') {
            warn!(line = index + 1, "Skipping malformed ICS content line");
            continue;
        }
        cleaned.push_str(line);
        cleaned.push_str("\r\n");
    }
    cleaned
}

/// Parses every VEVENT block on its own, skipping the ones that fail.
///
/// Returns `None` when the content holds no VEVENT block at all.
fn parse_each_event(ics: &str) -> Option<Vec<Event>> {
    let mut events = Vec::new();
    let mut blocks = 0usize;
    let mut block: Option<String> = None;

    for line in ics.lines() {
        let marker = line.trim().to_ascii_uppercase();
        if marker == "BEGIN:VEVENT" {
            block = Some(String::new());
        }
        if let Some(current) = block.as_mut() {
            current.push_str(line);
            current.push_str("\r\n");
        }
        if marker != "END:VEVENT" {
            continue;
        }
        if let Some(current) = block.take() {
            blocks += 1;
            let wrapped = format!(
                "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//availcal//EN\r\n{current}END:VCALENDAR\r\n"
            );
            match wrapped.parse::<Calendar>() {
                Ok(calendar) => events.extend(events_in(&calendar)),
                Err(e) => warn!(error = %e, "Skipping unparsable VEVENT"),
            }
        }
    }

    (blocks > 0).then_some(events)
}

/// Parses a single VEVENT component.
fn parse_event(event: &icalendar::Event) -> Event {
    let start = event.get_start().map(convert_date_time);
    let end = event
        .get_end()
        .map(convert_date_time)
        .or_else(|| implied_end(event, start));

    let all_day = start.is_some_and(|(_, date_only)| date_only);
    let mut parsed = Event::new(start.map(|(dt, _)| dt), end.map(|(dt, _)| dt), all_day);

    if let Some(uid) = non_empty(event.get_uid()) {
        parsed = parsed.with_uid(uid);
    }
    if let Some(summary) = non_empty(event.get_summary()) {
        parsed = parsed.with_summary(summary);
    }
    if let Some(location) = non_empty(event.get_location()) {
        parsed = parsed.with_location(location);
    }
    if let Some(description) = non_empty(event.get_description()) {
        parsed = parsed.with_description(description);
    }

    debug!(
        uid = ?parsed.uid,
        start = ?parsed.start,
        end = ?parsed.end,
        all_day = parsed.all_day,
        "Parsed event from ICS"
    );

    parsed
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// End of an event that has no DTEND.
///
/// Uses DURATION when present, otherwise the RFC 5545 defaults: one day for
/// a date-only start, zero length for a date-time start.
fn implied_end(
    event: &icalendar::Event,
    start: Option<(DateTime<Utc>, bool)>,
) -> Option<(DateTime<Utc>, bool)> {
    let (start, date_only) = start?;

    if let Some(raw) = event.property_value("DURATION") {
        match parse_duration(raw).and_then(|duration| start.checked_add_signed(duration)) {
            Some(end) => return Some((end, date_only)),
            None => warn!(duration = %raw, "Ignoring malformed DURATION"),
        }
    }

    if date_only {
        start.checked_add_signed(Duration::days(1)).map(|end| (end, true))
    } else {
        Some((start, false))
    }
}

/// Converts an icalendar value to UTC, flagging date-only values.
///
/// Dates map to midnight UTC. Floating times are taken as UTC.
fn convert_date_time(dt: DatePerhapsTime) -> (DateTime<Utc>, bool) {
    match dt {
        DatePerhapsTime::Date(date) => (date.and_time(chrono::NaiveTime::MIN).and_utc(), true),
        DatePerhapsTime::DateTime(cdt) => {
            let utc = match cdt {
                CalendarDateTime::Utc(dt) => dt,
                CalendarDateTime::Floating(naive) => Utc.from_utc_datetime(&naive),
                CalendarDateTime::WithTimezone { date_time, tzid } => {
                    resolve_in_zone(&date_time, &tzid)
                }
            };
            (utc, false)
        }
    }
}

/// Resolves a wall-clock time in an IANA zone to UTC.
///
/// Unknown zones fall back to UTC. Ambiguous times (DST fold) take the
/// earlier instant; nonexistent ones (DST gap) are read as UTC.
fn resolve_in_zone(naive: &NaiveDateTime, tzid: &str) -> DateTime<Utc> {
    let Ok(tz) = tzid.parse::<Tz>() else {
        warn!(tzid = %tzid, "Unknown TZID, assuming UTC");
        return Utc.from_utc_datetime(naive);
    };

    match tz.from_local_datetime(naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => {
            warn!(tzid = %tzid, time = %naive, "Local time does not exist, assuming UTC");
            Utc.from_utc_datetime(naive)
        }
    }
}

/// Parses an RFC 5545 DURATION value such as `P1D`, `PT1H30M` or `-P1W`.
///
/// Values outside chrono's range are rejected like malformed ones.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (negative, rest) = match value.as_bytes().first()? {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };
    let rest = rest.strip_prefix('P').or_else(|| rest.strip_prefix('p'))?;

    let mut total = Duration::zero();
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_unit = false;

    for c in rest.chars() {
        match c.to_ascii_uppercase() {
            '0'..='9' => number.push(c),
            'T' if number.is_empty() && !in_time => in_time = true,
            unit => {
                let n: i64 = number.parse().ok()?;
                number.clear();
                let part = match (unit, in_time) {
                    ('W', false) => Duration::try_weeks(n),
                    ('D', false) => Duration::try_days(n),
                    ('H', true) => Duration::try_hours(n),
                    ('M', true) => Duration::try_minutes(n),
                    ('S', true) => Duration::try_seconds(n),
                    _ => return None,
                }?;
                total = total.checked_add(&part)?;
                saw_unit = true;
            }
        }
    }

    if !number.is_empty() || !saw_unit {
        return None;
    }
    Some(if negative { -total } else { total })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n{body}END:VCALENDAR\r\n"
        )
    }

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn parse_all_day_event() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:a1\r\n\
             DTSTART;VALUE=DATE:20250710\r\n\
             DTEND;VALUE=DATE:20250712\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_ics_content(&ics).unwrap();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.uid.as_deref(), Some("a1"));
        assert_eq!(event.summary, None);
        assert_eq!(event.start, Some(utc("2025-07-10T00:00:00Z")));
        assert_eq!(event.end, Some(utc("2025-07-12T00:00:00Z")));
        assert!(event.all_day);
        assert_eq!(event.raw.location, None);
        assert_eq!(event.raw.description, None);
    }

    #[test]
    fn parse_timed_event_with_details() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:stay-42@example.com\r\n\
             DTSTART:20250801T150000Z\r\n\
             DTEND:20250805T100000Z\r\n\
             SUMMARY:Reserved\r\n\
             LOCATION:Chalet des Pins\r\n\
             DESCRIPTION:Guest arriving late\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_ics_content(&ics).unwrap();
        let event = &events[0];

        assert_eq!(event.summary.as_deref(), Some("Reserved"));
        assert_eq!(event.start, Some(utc("2025-08-01T15:00:00Z")));
        assert_eq!(event.end, Some(utc("2025-08-05T10:00:00Z")));
        assert!(!event.all_day);
        assert_eq!(event.raw.location.as_deref(), Some("Chalet des Pins"));
        assert_eq!(event.raw.description.as_deref(), Some("Guest arriving late"));
    }

    #[test]
    fn tzid_is_resolved_to_utc() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:paris\r\n\
             DTSTART;TZID=Europe/Paris:20250710T160000\r\n\
             DTEND;TZID=Europe/Paris:20250712T110000\r\n\
             END:VEVENT\r\n",
        );

        let event = &parse_ics_content(&ics).unwrap()[0];
        // CEST is UTC+2 in July
        assert_eq!(event.start, Some(utc("2025-07-10T14:00:00Z")));
        assert_eq!(event.end, Some(utc("2025-07-12T09:00:00Z")));
    }

    #[test]
    fn unknown_tzid_falls_back_to_utc() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:odd\r\n\
             DTSTART;TZID=Mars/Olympus:20250710T160000\r\n\
             DTEND;TZID=Mars/Olympus:20250710T170000\r\n\
             END:VEVENT\r\n",
        );

        let event = &parse_ics_content(&ics).unwrap()[0];
        assert_eq!(event.start, Some(utc("2025-07-10T16:00:00Z")));
    }

    #[test]
    fn missing_end_uses_defaults() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:day\r\n\
             DTSTART;VALUE=DATE:20250901\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:instant\r\n\
             DTSTART:20250902T090000Z\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:duration\r\n\
             DTSTART;VALUE=DATE:20250903\r\n\
             DURATION:P3D\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_ics_content(&ics).unwrap();
        assert_eq!(events[0].end, Some(utc("2025-09-02T00:00:00Z")));
        assert_eq!(events[1].end, Some(utc("2025-09-02T09:00:00Z")));
        assert_eq!(events[2].end, Some(utc("2025-09-06T00:00:00Z")));
    }

    #[test]
    fn missing_fields_are_tolerated() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             SUMMARY:Owner block\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:dated\r\n\
             DTSTART;VALUE=DATE:20250710\r\n\
             DTEND;VALUE=DATE:20250711\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_ics_content(&ics).unwrap();
        assert_eq!(events.len(), 2);

        // dated entries first, the one without DTSTART last
        assert_eq!(events[0].uid.as_deref(), Some("dated"));
        let undated = &events[1];
        assert_eq!(undated.uid, None);
        assert_eq!(undated.summary.as_deref(), Some("Owner block"));
        assert_eq!(undated.start, None);
        assert_eq!(undated.end, None);
        assert!(!undated.all_day);
    }

    #[test]
    fn events_are_sorted_by_start() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:late\r\n\
             DTSTART;VALUE=DATE:20251220\r\n\
             DTEND;VALUE=DATE:20251227\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:early\r\n\
             DTSTART;VALUE=DATE:20250301\r\n\
             DTEND;VALUE=DATE:20250305\r\n\
             END:VEVENT\r\n",
        );

        let first = parse_ics_content(&ics).unwrap();
        let second = parse_ics_content(&ics).unwrap();

        let uids: Vec<_> = first.iter().map(|e| e.uid.clone().unwrap()).collect();
        assert_eq!(uids, ["early", "late"]);
        assert_eq!(first, second);
    }

    #[test]
    fn non_event_components_are_skipped() {
        let ics = wrap(
            "BEGIN:VTODO\r\n\
             UID:todo-1\r\n\
             SUMMARY:Clean the chalet\r\n\
             END:VTODO\r\n\
             BEGIN:VEVENT\r\n\
             UID:stay\r\n\
             DTSTART;VALUE=DATE:20250710\r\n\
             DTEND;VALUE=DATE:20250711\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_ics_content(&ics).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid.as_deref(), Some("stay"));
    }

    #[test]
    fn empty_calendar_has_no_events() {
        let events = parse_ics_content(&wrap("")).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn html_payload_is_rejected() {
        let err = parse_ics_content("<html><body>Sign in</body></html>").unwrap_err();
        assert_eq!(
            err.code(),
            crate::error::ProviderErrorCode::InvalidResponse
        );
    }

    #[test]
    fn parse_duration_values() {
        assert_eq!(parse_duration("P1D"), Some(Duration::days(1)));
        assert_eq!(parse_duration("P2W"), Some(Duration::weeks(2)));
        assert_eq!(
            parse_duration("PT1H30M"),
            Some(Duration::hours(1) + Duration::minutes(30))
        );
        assert_eq!(
            parse_duration("P1DT12H"),
            Some(Duration::days(1) + Duration::hours(12))
        );
        assert_eq!(parse_duration("-PT15M"), Some(-Duration::minutes(15)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("1D"), None);
        assert_eq!(parse_duration("P"), None);
        assert_eq!(parse_duration("PT"), None);
        assert_eq!(parse_duration("P1H"), None);
        assert_eq!(parse_duration("P1X"), None);
        assert_eq!(parse_duration("P12"), None);
    }

    #[test]
    fn parse_duration_rejects_out_of_range() {
        assert_eq!(parse_duration("P999999999999999W"), None);
        assert_eq!(parse_duration("PT9223372036854775807S"), None);
        assert_eq!(parse_duration("P99999999999999999999D"), None);
    }

    #[test]
    fn huge_duration_falls_back_to_default_end() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:days\r\n\
             DTSTART;VALUE=DATE:20250710\r\n\
             DURATION:P9999999999D\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:weeks\r\n\
             DTSTART;VALUE=DATE:20250801\r\n\
             DURATION:P999999999999999W\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_ics_content(&ics).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].uid.as_deref(), Some("days"));
        assert_eq!(events[0].end, Some(utc("2025-07-11T00:00:00Z")));
        assert_eq!(events[1].uid.as_deref(), Some("weeks"));
        assert_eq!(events[1].end, Some(utc("2025-08-02T00:00:00Z")));
    }

    #[test]
    fn malformed_line_does_not_drop_other_events() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:broken\r\n\
             this line has no colon\r\n\
             DTSTART;VALUE=DATE:20250701\r\n\
             DTEND;VALUE=DATE:20250703\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:good\r\n\
             DTSTART;VALUE=DATE:20250710\r\n\
             DTEND;VALUE=DATE:20250712\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_ics_content(&ics).unwrap();
        let good = events
            .iter()
            .find(|e| e.uid.as_deref() == Some("good"))
            .unwrap();
        assert_eq!(good.start, Some(utc("2025-07-10T00:00:00Z")));
        assert_eq!(good.end, Some(utc("2025-07-12T00:00:00Z")));
    }

    #[test]
    fn folded_lines_are_unfolded() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:folded\r\n\
             DTSTART;VALUE=DATE:20250710\r\n\
             DTEND;VALUE=DATE:20250712\r\n\
             DESCRIPTION:Guest arriving\r\n  late\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_ics_content(&ics).unwrap();
        assert_eq!(events[0].raw.description.as_deref(), Some("Guest arriving late"));
    }

    #[test]
    fn each_event_block_is_parsed_separately() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:first\r\n\
             DTSTART;VALUE=DATE:20250710\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:second\r\n\
             DTSTART;VALUE=DATE:20250720\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_each_event(&ics).unwrap();
        let uids: Vec<_> = events.iter().filter_map(|e| e.uid.as_deref()).collect();
        assert_eq!(uids, ["first", "second"]);

        assert!(parse_each_event(&wrap("")).is_none());
    }

    #[test]
    fn empty_text_fields_are_null() {
        let ics = wrap(
            "BEGIN:VEVENT\r\n\
             UID:\r\n\
             SUMMARY:\r\n\
             LOCATION:\r\n\
             DESCRIPTION:\r\n\
             DTSTART;VALUE=DATE:20250710\r\n\
             DTEND;VALUE=DATE:20250712\r\n\
             END:VEVENT\r\n",
        );

        let event = &parse_ics_content(&ics).unwrap()[0];
        assert_eq!(event.uid, None);
        assert_eq!(event.summary, None);
        assert_eq!(event.raw.location, None);
        assert_eq!(event.raw.description, None);
    }
}
