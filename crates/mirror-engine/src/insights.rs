//! Short text insights over externally recorded readings.

use mirror_models::{Reading, SessionSummary};

use crate::stats::mean;

/// Readings needed before any insight is offered.
pub const MIN_INSIGHT_READINGS: usize = 10;

/// Insight lines for a list of readings (scores on a 0-100 scale).
pub fn generate_insights(readings: &[Reading]) -> Vec<String> {
    if readings.len() < MIN_INSIGHT_READINGS {
        return vec!["Not enough data for insights.".to_string()];
    }

    let avg_focus = mean(&readings.iter().map(|r| r.focus).collect::<Vec<_>>());
    let avg_energy = mean(&readings.iter().map(|r| r.energy).collect::<Vec<_>>());

    let mut insights = Vec::new();
    if avg_focus >= 75.0 {
        insights.push("Strong focus maintained throughout the session".to_string());
    } else if avg_focus < 55.0 {
        insights.push("Focus was scattered, try minimizing distractions".to_string());
    }

    if avg_energy >= 75.0 {
        insights.push("High energy levels detected".to_string());
    } else if avg_energy < 50.0 {
        insights.push("Energy was low, consider taking breaks".to_string());
    }

    if insights.is_empty() {
        insights.push("Session recorded successfully".to_string());
    }
    insights
}

/// Averages plus insights for the end-of-session record.
pub fn summarize_session(readings: &[Reading], duration_secs: u64) -> SessionSummary {
    let avg = |f: fn(&Reading) -> f64| mean(&readings.iter().map(f).collect::<Vec<_>>());
    SessionSummary {
        duration_secs,
        total_readings: readings.len(),
        avg_confidence: avg(|r| r.confidence),
        avg_focus: avg(|r| r.focus),
        avg_energy: avg(|r| r.energy),
        insights: generate_insights(readings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(n: usize, focus: f64, energy: f64) -> Vec<Reading> {
        (0..n)
            .map(|i| Reading {
                focus,
                energy,
                confidence: 60.0,
                face_detected: true,
                timestamp_ms: i as i64 * 1_000,
            })
            .collect()
    }

    #[test]
    fn test_too_few_readings() {
        assert_eq!(generate_insights(&readings(9, 90.0, 90.0)), vec!["Not enough data for insights."]);
        assert_eq!(generate_insights(&[]), vec!["Not enough data for insights."]);
    }

    #[test]
    fn test_strong_session() {
        let insights = generate_insights(&readings(10, 80.0, 80.0));
        assert_eq!(insights.len(), 2);
        assert!(insights[0].starts_with("Strong focus"));
        assert!(insights[1].starts_with("High energy"));
    }

    #[test]
    fn test_low_session() {
        let insights = generate_insights(&readings(20, 40.0, 30.0));
        assert!(insights[0].starts_with("Focus was scattered"));
        assert!(insights[1].starts_with("Energy was low"));
    }

    #[test]
    fn test_middle_of_the_road_falls_back() {
        assert_eq!(generate_insights(&readings(12, 65.0, 60.0)), vec!["Session recorded successfully"]);
    }

    #[test]
    fn test_summarize_session() {
        let summary = summarize_session(&readings(10, 80.0, 40.0), 600);
        assert_eq!(summary.total_readings, 10);
        assert_eq!(summary.avg_focus, 80.0);
        assert_eq!(summary.avg_confidence, 60.0);
        assert_eq!(summary.insights.len(), 2);

        let empty = summarize_session(&[], 0);
        assert_eq!(empty.avg_energy, 0.0);
    }
}
