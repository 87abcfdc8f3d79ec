//! Event detection and de-duplication.
//!
//! [`EventDetector`] turns per-second aggregates into START/END transitions;
//! [`EventLog`] applies cooldowns and merging before anything is recorded.

pub mod detector;
pub mod log;

pub use detector::{classify_look_away, energy_reference, DetectionContext, EventDetector, ToggleWindow};
pub use log::{AppendOutcome, EventLog};

use mirror_models::{Event, EventKind, EventSegment};

/// Pair START/END kinds in log order into closed segments.
///
/// A START without a later END is ignored; a second START replaces an
/// unclosed one.
pub fn find_segments<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    start: EventKind,
    end: EventKind,
) -> Vec<EventSegment> {
    let mut segments = Vec::new();
    let mut open: Option<i64> = None;

    for event in events {
        if event.kind == start {
            open = Some(event.timestamp_ms);
        } else if event.kind == end {
            if let Some(start_ms) = open.take() {
                segments.push(EventSegment {
                    start_ms,
                    end_ms: event.timestamp_ms,
                    duration_secs: (event.timestamp_ms - start_ms) as f64 / 1000.0,
                });
            }
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_models::EventMeta;

    #[test]
    fn test_find_segments_pairs_in_order() {
        let events = vec![
            Event::new(EventKind::FocusStreakEnd, 500, EventMeta::default()),
            Event::new(EventKind::FocusStreakStart, 1_000, EventMeta::default()),
            Event::new(EventKind::Yawn, 2_000, EventMeta::default()),
            Event::new(EventKind::FocusStreakEnd, 61_000, EventMeta::default()),
            Event::new(EventKind::FocusStreakStart, 70_000, EventMeta::default()),
        ];
        let segments = find_segments(&events, EventKind::FocusStreakStart, EventKind::FocusStreakEnd);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_ms, 1_000);
        assert_eq!(segments[0].duration_secs, 60.0);
    }
}
