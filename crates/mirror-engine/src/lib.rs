#![deny(unreachable_patterns)]
//! Face-landmark behavioral analysis engine.
//!
//! This crate provides:
//! - Geometric feature extraction from face-mesh landmarks
//! - Blink, yawn and motion smoothing
//! - Three-phase calibration and baseline drift correction
//! - Context-weighted focus, energy and confidence scoring
//! - Hysteresis event detection with cooldown and merge de-duplication
//! - Session archetypes, daily reports and reading insights

pub mod accumulator;
pub mod archetype;
pub mod auto_tune;
pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod features;
pub mod insights;
pub mod landmarks;
pub mod metrics;
pub mod observed;
pub mod report;
pub mod scoring;
pub mod signal_quality;
pub mod smoothing;
pub mod stats;

pub use auto_tune::HistoryBuffer;
pub use config::{CalibrationConfig, EngineConfig, EventCooldowns, EventThresholds};
pub use engine::{AnalysisEngine, PersistentState};
pub use error::{EngineError, EngineResult};
pub use events::{AppendOutcome, EventDetector, EventLog};
pub use features::FrameFeatures;
pub use insights::{generate_insights, summarize_session};
pub use landmarks::{LandmarkFrame, Point, SyntheticFace};
pub use report::ReportMemory;
