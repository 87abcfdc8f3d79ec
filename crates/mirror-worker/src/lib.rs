//! Landmark stream replay runner.
//!
//! This crate provides:
//! - JSON-lines frame replay with timestamp-derived ticks
//! - Cross-session state persistence
//! - Structured session logging

pub mod config;
pub mod error;
pub mod logging;
pub mod replay;
pub mod state_store;

pub use config::{InputSource, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use logging::SessionLogger;
pub use replay::{run_replay, FrameRecord, OutputRecord, ReplayStats, SessionReplay};
pub use state_store::StateStore;
