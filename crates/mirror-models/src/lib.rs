//! Shared data models for the Mirror analysis engine.
//!
//! This crate provides Serde-serializable types for:
//! - Calibration baselines and calibration status
//! - Context modes with their weight vectors and threshold modifiers
//! - Behavioral events and the per-second metrics history
//! - Driver statistics, session archetypes and daily reports
//! - Per-tick results handed to rendering and persistence collaborators

pub mod archetype;
pub mod baseline;
pub mod calibration;
pub mod context;
pub mod driver;
pub mod event;
pub mod reading;
pub mod report;
pub mod scores;
pub mod thresholds;
pub mod tick;

// Re-export common types
pub use archetype::SessionArchetype;
pub use baseline::Baseline;
pub use calibration::{CalibrationPhase, CalibrationPlan, CalibrationProgress, CalibrationStatus, PhaseStep};
pub use context::{
    ConfidenceWeights, ContextMode, ContextModeDescriptor, ContextModeParseError, ContextWeights,
    EnergyWeights, FocusWeights, ThresholdModifiers,
};
pub use driver::{Driver, DriverScores, DriverStats};
pub use event::{Event, EventKind, EventMeta, LookAwayType};
pub use reading::{Reading, SessionSummary};
pub use report::{EventSegment, MinuteBucket, Report, ReportSegments, ReportStats};
pub use scores::{MetricsSnapshot, ObservedMode, ObservedModeReading, Scores, SecondMetrics, SignalQuality};
pub use thresholds::{AutoTunedThresholds, BlinkRateBand, EarDropBand, GazeToleranceBand, HeadJitterBand};
pub use tick::TickResult;
