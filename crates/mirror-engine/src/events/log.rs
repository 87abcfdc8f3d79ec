//! Bounded event log with cooldown and merge de-duplication.

use std::collections::{HashMap, VecDeque};

use mirror_models::{Event, EventKind, EventMeta};
use tracing::debug;

use crate::config::{EngineConfig, EventCooldowns};
use crate::metrics::{self, SuppressReason};

/// What happened to an append attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A new entry was logged
    Logged,
    /// A recent same-kind entry was flagged as extended instead
    Merged,
    /// Dropped; the kind fired too recently
    Cooldown,
}

/// Ordered event log.
///
/// Cooldowns are tracked per kind, so a START and its END never block each
/// other, while the interval itself is looked up by family.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<Event>,
    last_emitted: HashMap<EventKind, i64>,
    cooldowns: EventCooldowns,
    capacity: usize,
    merge_window_ms: i64,
    merge_lookback: usize,
}

impl EventLog {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.event_log_capacity),
            last_emitted: HashMap::new(),
            cooldowns: config.cooldowns.clone(),
            capacity: config.event_log_capacity,
            merge_window_ms: config.event_merge_window_ms,
            merge_lookback: config.event_merge_lookback,
        }
    }

    fn on_cooldown(&self, kind: EventKind, now_ms: i64) -> bool {
        match (self.cooldowns.for_kind(kind), self.last_emitted.get(&kind)) {
            (Some(cooldown), Some(&last)) => now_ms - last < cooldown,
            _ => false,
        }
    }

    /// Append an event at `timestamp_ms`, subject to cooldown and merging.
    pub fn append(&mut self, kind: EventKind, timestamp_ms: i64, meta: EventMeta) -> AppendOutcome {
        if self.on_cooldown(kind, timestamp_ms) {
            debug!(kind = %kind, "Event dropped on cooldown");
            metrics::record_event_suppressed(kind, SuppressReason::Cooldown);
            return AppendOutcome::Cooldown;
        }

        if !kind.is_end() {
            let skip = self.entries.len().saturating_sub(self.merge_lookback);
            let window = self.merge_window_ms;
            if let Some(existing) = self
                .entries
                .iter_mut()
                .skip(skip)
                .find(|e| e.kind == kind && timestamp_ms - e.timestamp_ms < window)
            {
                existing.extended = true;
                debug!(kind = %kind, "Event merged into recent entry");
                metrics::record_event_suppressed(kind, SuppressReason::Merged);
                return AppendOutcome::Merged;
            }
        }

        self.last_emitted.insert(kind, timestamp_ms);
        self.entries.push_back(Event::new(kind, timestamp_ms, meta));
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        metrics::record_event_emitted(kind);
        AppendOutcome::Logged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    /// The most recent `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Event> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<Event> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_emitted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> EventLog {
        EventLog::new(&EngineConfig::default())
    }

    #[test]
    fn test_cooldown_drops_repeat_start() {
        let mut log = log();
        assert_eq!(log.append(EventKind::FaceLostStart, 1_000, EventMeta::default()), AppendOutcome::Logged);
        assert_eq!(log.append(EventKind::FaceLostEnd, 1_500, EventMeta::default()), AppendOutcome::Logged);
        assert_eq!(log.append(EventKind::FaceLostStart, 2_500, EventMeta::default()), AppendOutcome::Cooldown);
        assert_eq!(log.append(EventKind::FaceLostStart, 4_000, EventMeta::default()), AppendOutcome::Logged);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_merge_within_window() {
        let mut log = log();
        log.append(EventKind::FocusStreakStart, 10_000, EventMeta::default());
        assert_eq!(log.append(EventKind::FocusStreakStart, 11_000, EventMeta::default()), AppendOutcome::Merged);
        assert_eq!(log.len(), 1);
        assert!(log.iter().next().is_some_and(|e| e.extended));

        assert_eq!(log.append(EventKind::FocusStreakStart, 11_600, EventMeta::default()), AppendOutcome::Logged);
    }

    #[test]
    fn test_end_events_never_merge() {
        let mut log = log();
        log.append(EventKind::DistractionEnd, 10_000, EventMeta::default());
        assert_eq!(log.append(EventKind::DistractionEnd, 10_200, EventMeta::default()), AppendOutcome::Logged);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_merge_only_checks_recent_entries() {
        let mut log = log();
        log.append(EventKind::CalibrationStart, 0, EventMeta::default());
        for i in 0..5 {
            log.append(EventKind::FocusStreakEnd, 100 + i, EventMeta::default());
        }
        assert_eq!(log.append(EventKind::CalibrationStart, 500, EventMeta::default()), AppendOutcome::Logged);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let config = EngineConfig {
            event_log_capacity: 3,
            ..Default::default()
        };
        let mut log = EventLog::new(&config);
        for i in 0..5 {
            log.append(EventKind::DistractionEnd, i * 10_000, EventMeta::default());
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.recent(1)[0].timestamp_ms, 40_000);
        assert_eq!(log.iter().next().map(|e| e.timestamp_ms), Some(20_000));
    }
}
