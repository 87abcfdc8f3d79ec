//! Daily report generation with repeat-aware wording.

use std::collections::VecDeque;

use chrono::{DateTime, Local, TimeZone, Utc};
use mirror_models::{
    ContextMode, Driver, DriverScores, DriverStats, Event, EventKind, EventSegment, MinuteBucket, Report,
    ReportSegments, ReportStats, SecondMetrics, SessionArchetype,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::archetype;
use crate::events::find_segments;
use crate::stats::mean;

/// Per-second samples required before a report is produced.
pub const MIN_REPORT_SAMPLES: usize = 60;

const BUCKET_SECS: usize = 60;

/// Driver score a session needs before it drives the recommendation.
const DRIVER_RECOMMENDATION_FLOOR: u8 = 20;

/// Bounded list of past reports. Survives session resets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMemory {
    reports: VecDeque<Report>,
}

impl ReportMemory {
    pub fn push(&mut self, report: Report, capacity: usize) {
        self.reports.push_back(report);
        while self.reports.len() > capacity {
            self.reports.pop_front();
        }
    }

    pub fn last(&self) -> Option<&Report> {
        self.reports.back()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Report> {
        self.reports.iter().cloned().collect()
    }
}

/// Everything a report is built from.
pub struct ReportInput<'a> {
    pub history: &'a [SecondMetrics],
    pub events: &'a [Event],
    pub stats: &'a DriverStats,
    pub context_mode: ContextMode,
    pub generated_at: DateTime<Utc>,
}

/// Build a report. Does not touch the memory; the caller stores it.
pub fn generate(input: &ReportInput<'_>, previous: Option<&Report>) -> Report {
    if input.history.len() < MIN_REPORT_SAMPLES {
        return Report::insufficient(input.generated_at);
    }

    let minutes = minute_buckets(input.history);
    let segments = ReportSegments {
        focus_streaks: find_segments(input.events, EventKind::FocusStreakStart, EventKind::FocusStreakEnd),
        distractions: find_segments(input.events, EventKind::DistractionStart, EventKind::DistractionEnd),
        energy_dips: find_segments(input.events, EventKind::EnergyDipStart, EventKind::EnergyDipEnd),
        look_away_thinking: find_segments(
            input.events,
            EventKind::LookAwayThinkingStart,
            EventKind::LookAwayThinkingEnd,
        ),
        look_away_distracted: find_segments(
            input.events,
            EventKind::LookAwayDistractedStart,
            EventKind::LookAwayDistractedEnd,
        ),
    };

    let drivers = DriverScores::from_stats(input.stats);
    let (highest, highest_score) = drivers.highest();
    let archetype = archetype::classify(input.stats, input.history);

    let repeat_driver = previous.is_some_and(|r| r.highest_driver == Some(highest));
    let repeat_archetype = previous.is_some_and(|r| r.archetype == Some(archetype));

    let mut summary = vec![format!(
        "{} **{}**: {}",
        archetype.emoji(),
        archetype.label(),
        archetype.description()
    )];
    if let Some(best) = longest(&segments.focus_streaks) {
        summary.push(format!(
            "Best focus: {} - {} ({}m)",
            format_time(best.start_ms),
            format_time(best.end_ms),
            minutes_of(best)
        ));
    }
    if let Some(worst) = longest(&segments.distractions) {
        summary.push(format!(
            "Distraction window: {} - {} ({}m)",
            format_time(worst.start_ms),
            format_time(worst.end_ms),
            minutes_of(worst)
        ));
    }
    if let Some(dip) = longest(&segments.energy_dips) {
        summary.push(format!(
            "Energy dip: {} for {}m",
            format_time(dip.start_ms),
            minutes_of(dip)
        ));
    }

    let (recommendation, driver_explanation) = recommend(
        highest,
        highest_score,
        archetype,
        repeat_driver,
        repeat_archetype,
        input.stats,
    );

    let avg = |f: fn(&MinuteBucket) -> f64| mean(&minutes.iter().map(f).collect::<Vec<_>>()).round() as u8;
    let stats = ReportStats {
        total_minutes: minutes.len() as u32,
        avg_focus: avg(|m| m.focus_avg),
        avg_energy: avg(|m| m.energy_avg),
        avg_confidence: avg(|m| m.conf_avg),
        avg_signal_quality: avg(|m| m.signal_avg),
        focus_streaks: segments.focus_streaks.len() as u32,
        distraction_blocks: segments.distractions.len() as u32,
        thinking_look_aways: segments.look_away_thinking.len() as u32,
        distracted_look_aways: segments.look_away_distracted.len() as u32,
        yawns: input.stats.yawn_count,
        context_mode: input.context_mode,
    };

    info!(
        archetype = archetype.label(),
        highest_driver = %highest,
        repeat_driver,
        repeat_archetype,
        minutes = stats.total_minutes,
        "Daily report generated"
    );

    Report {
        generated_at: input.generated_at,
        insufficient_data: false,
        summary,
        stats: Some(stats),
        segments,
        drivers: Some(drivers),
        highest_driver: Some(highest),
        archetype: Some(archetype),
        driver_explanation,
        recommendation,
        minutes,
    }
}

fn recommend(
    driver: Driver,
    score: u8,
    archetype: SessionArchetype,
    repeat_driver: bool,
    repeat_archetype: bool,
    stats: &DriverStats,
) -> (Option<String>, Option<String>) {
    if score > DRIVER_RECOMMENDATION_FLOOR {
        let (recommendation, explanation) = match (driver, repeat_driver) {
            (Driver::Fatigue, true) => (
                "Energy dips are becoming predictable. Set a break trigger at -15 energy.".to_string(),
                format!("Fatigue again ({}%). This is a pattern now.", score),
            ),
            (Driver::Fatigue, false) => (
                "When energy drops 15+ points, take a 7-12 min walk or water break.".to_string(),
                format!(
                    "Fatigue was your main issue ({}%). EAR decline + {} yawn(s).",
                    score, stats.yawn_count
                ),
            ),
            (Driver::Distraction, true) => (
                "Same issue: attention leaks. Try airplane mode for the first hour.".to_string(),
                format!("Distraction repeating ({}%). Environment hasn't changed.", score),
            ),
            (Driver::Distraction, false) => (
                "Put phone out of view + go full-screen. Quick look-aways signal notification pull."
                    .to_string(),
                format!(
                    "Distraction drove this session ({}%). {} quick toggles.",
                    score, stats.away_toggle_count
                ),
            ),
            (Driver::Restlessness, true) => (
                "Restlessness persisting. Try a standing desk or walk-talk meetings.".to_string(),
                format!("High jitter again ({}%). Your body is asking for movement.", score),
            ),
            (Driver::Restlessness, false) => (
                "Stand up for 2 minutes. High jitter = fighting your body.".to_string(),
                format!("Restlessness was high ({}%).", score),
            ),
        };
        return (Some(recommendation), Some(explanation));
    }

    if archetype == SessionArchetype::LockedIn {
        return (
            Some("Excellent session. Protect this time slot, it's clearly your focus window.".to_string()),
            Some("No major issues detected.".to_string()),
        );
    }

    if repeat_archetype {
        return (
            Some(format!(
                "Another {} session. Consider what's different on your best days.",
                archetype.label()
            )),
            None,
        );
    }

    (None, None)
}

/// Consecutive 60-sample windows of the per-second history.
pub fn minute_buckets(history: &[SecondMetrics]) -> Vec<MinuteBucket> {
    history
        .chunks(BUCKET_SECS)
        .map(|chunk| {
            let avg = |f: fn(&SecondMetrics) -> f64| mean(&chunk.iter().map(f).collect::<Vec<_>>());
            MinuteBucket {
                start_time_ms: chunk[0].t,
                focus_avg: avg(|m| m.focus as f64),
                energy_avg: avg(|m| m.energy as f64),
                conf_avg: avg(|m| m.confidence as f64),
                signal_avg: avg(|m| m.signal_quality),
                away_time: chunk.iter().filter(|m| m.away_ratio > 0.5).count() as u32,
                face_lost: chunk.iter().filter(|m| !m.face_present).count() as u32,
            }
        })
        .collect()
}

/// Longest segment; the earliest wins a tie.
fn longest(segments: &[EventSegment]) -> Option<&EventSegment> {
    segments.iter().fold(None, |best: Option<&EventSegment>, seg| match best {
        Some(b) if b.duration_secs >= seg.duration_secs => Some(b),
        _ => Some(seg),
    })
}

fn minutes_of(segment: &EventSegment) -> i64 {
    (segment.duration_secs / 60.0).round() as i64
}

fn format_time(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%-I:%M %p").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_models::EventMeta;

    fn history(len: usize, focus: u8, energy: u8) -> Vec<SecondMetrics> {
        (0..len)
            .map(|i| SecondMetrics {
                t: 1_700_000_000_000 + i as i64 * 1_000,
                focus,
                energy,
                confidence: 60,
                away_ratio: if i % 2 == 0 { 0.8 } else { 0.0 },
                face_present: i % 10 != 0,
                ear: 0.25,
                blink_rate: 15.0,
                yawn_active: false,
                speaking: false,
                head_motion: 0.0,
                gaze_motion: 0.0,
                signal_quality: 90.0,
                away_toggle_count: 0,
            })
            .collect()
    }

    fn input<'a>(history: &'a [SecondMetrics], events: &'a [Event], stats: &'a DriverStats) -> ReportInput<'a> {
        ReportInput {
            history,
            events,
            stats,
            context_mode: ContextMode::Reading,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_longest_prefers_earliest_on_tie() {
        let seg = |start_ms: i64, duration_secs: f64| EventSegment {
            start_ms,
            end_ms: start_ms + (duration_secs * 1_000.0) as i64,
            duration_secs,
        };
        let segments = [seg(0, 120.0), seg(300_000, 180.0), seg(600_000, 180.0), seg(900_000, 60.0)];
        assert_eq!(longest(&segments).map(|s| s.start_ms), Some(300_000));
        assert!(longest(&[]).is_none());
    }

    #[test]
    fn test_insufficient_data_sentinel() {
        let h = history(59, 80, 80);
        let stats = DriverStats::default();
        let report = generate(&input(&h, &[], &stats), None);
        assert!(report.insufficient_data);
        assert!(report.stats.is_none());
        assert!(report.summary[0].contains("Not enough data"));
    }

    #[test]
    fn test_populated_report() {
        let h = history(125, 80, 70);
        let events = vec![
            Event::new(EventKind::FocusStreakStart, h[0].t, EventMeta::default()),
            Event::new(EventKind::FocusStreakEnd, h[0].t + 120_000, EventMeta::with_duration(120)),
        ];
        let stats = DriverStats {
            total_seconds: 125,
            ..Default::default()
        };
        let report = generate(&input(&h, &events, &stats), None);

        let s = report.stats.expect("stats");
        assert_eq!(s.total_minutes, 3);
        assert_eq!(s.avg_focus, 80);
        assert_eq!(s.focus_streaks, 1);
        assert_eq!(s.context_mode, ContextMode::Reading);
        assert_eq!(report.minutes[0].away_time, 30);
        assert_eq!(report.minutes[0].face_lost, 6);
        assert!(report.summary.iter().any(|line| line.starts_with("Best focus:") && line.ends_with("(2m)")));
        assert_eq!(report.archetype, Some(SessionArchetype::SteadyState));
        assert_eq!(report.recommendation, None);
    }

    #[test]
    fn test_repeat_driver_changes_wording() {
        let h = history(60, 70, 60);
        let stats = DriverStats {
            total_seconds: 60,
            ear_drop_secs: 60,
            ..Default::default()
        };
        let first = generate(&input(&h, &[], &stats), None);
        assert_eq!(first.highest_driver, Some(Driver::Fatigue));
        let second = generate(&input(&h, &[], &stats), Some(&first));
        assert_ne!(first.recommendation, second.recommendation);
        assert!(second.driver_explanation.as_deref().is_some_and(|e| e.contains("again")));
    }

    #[test]
    fn test_repeat_archetype_without_strong_driver() {
        let h = history(60, 70, 60);
        let stats = DriverStats {
            total_seconds: 60,
            ..Default::default()
        };
        let first = generate(&input(&h, &[], &stats), None);
        assert_eq!(first.recommendation, None);
        let second = generate(&input(&h, &[], &stats), Some(&first));
        assert!(second.recommendation.as_deref().is_some_and(|r| r.starts_with("Another Steady State")));
    }

    #[test]
    fn test_memory_is_bounded() {
        let mut memory = ReportMemory::default();
        for _ in 0..12 {
            memory.push(Report::insufficient(Utc::now()), 10);
        }
        assert_eq!(memory.len(), 10);
    }
}
