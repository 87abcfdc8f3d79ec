//! JSON-lines landmark replay.
//!
//! Each input line is a [`FrameRecord`]. Ticks are derived from the record
//! timestamps, not from the number of frames, so dropped frames and silent
//! seconds behave the way they would with a live camera.

use metrics::counter;
use mirror_engine::{summarize_session, AnalysisEngine, LandmarkFrame};
use mirror_models::{CalibrationPhase, Reading, Report, SessionSummary, TickResult};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::SessionLogger;

const LINES_SKIPPED_TOTAL: &str = "mirror_replay_lines_skipped_total";

/// One captured frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub timestamp_ms: i64,
    /// Absent or `null` when no face was detected
    #[serde(default)]
    pub landmarks: Option<LandmarkFrame>,
    #[serde(default)]
    pub speaking: bool,
    #[serde(default)]
    pub filler_rate: f64,
}

impl FrameRecord {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str, line_no: usize) -> WorkerResult<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(line)
            .map(Some)
            .map_err(|e| WorkerError::invalid_frame(line_no, e.to_string()))
    }
}

/// One output line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputRecord {
    Tick(Box<TickResult>),
    Report(Box<Report>),
    Summary(SessionSummary),
}

/// Counters for a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub frames: u64,
    pub ticks: u64,
    pub empty_ticks: u64,
    pub skipped_lines: u64,
}

/// Drives an engine from a timestamped frame stream.
#[derive(Debug)]
pub struct SessionReplay {
    engine: AnalysisEngine,
    tick_interval_ms: i64,
    next_tick_ms: Option<i64>,
    first_ms: Option<i64>,
    last_ms: Option<i64>,
    speaking: bool,
    filler_rate: f64,
    readings: Vec<Reading>,
    calibration_phase: CalibrationPhase,
    stats: ReplayStats,
    logger: SessionLogger,
}

impl SessionReplay {
    pub fn new(engine: AnalysisEngine, tick_interval_ms: i64, logger: SessionLogger) -> Self {
        Self {
            calibration_phase: engine.calibration_status().phase,
            engine,
            tick_interval_ms: tick_interval_ms.max(1),
            next_tick_ms: None,
            first_ms: None,
            last_ms: None,
            speaking: false,
            filler_rate: 0.0,
            readings: Vec::new(),
            stats: ReplayStats::default(),
            logger,
        }
    }

    pub fn engine(&self) -> &AnalysisEngine {
        &self.engine
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Run every tick that is due before `record`, then feed the frame.
    ///
    /// Only the first due window can hold frames. The rest of a gap is
    /// skipped in one step and counted as empty ticks.
    pub fn push(&mut self, record: &FrameRecord) -> Vec<TickResult> {
        let ts = record.timestamp_ms;
        let interval = self.tick_interval_ms;
        let mut ticks = Vec::new();

        let mut next = *self
            .next_tick_ms
            .get_or_insert_with(|| ts.saturating_add(interval));
        if ts >= next {
            if let Some(tick) = self.tick(next) {
                ticks.push(tick);
            }
            next = next.saturating_add(interval);
            if ts >= next {
                let skipped = ts.saturating_sub(next) / interval + 1;
                self.stats.empty_ticks += skipped as u64;
                debug!(skipped, from_ms = next, "Skipping empty tick windows");
                next = next.saturating_add(skipped.saturating_mul(interval));
            }
        }
        self.next_tick_ms = Some(next);

        self.engine.process_frame(record.landmarks.as_ref(), ts);
        self.track_calibration(ts);
        self.speaking = record.speaking;
        self.filler_rate = record.filler_rate;
        if self.first_ms.is_none() {
            self.first_ms = Some(ts);
        }
        self.last_ms = Some(ts);
        self.stats.frames += 1;
        ticks
    }

    /// Close the trailing partial second.
    pub fn finish(&mut self) -> Option<TickResult> {
        let next = self.next_tick_ms?;
        self.tick(next)
    }

    fn tick(&mut self, timestamp_ms: i64) -> Option<TickResult> {
        match self.engine.process_second(timestamp_ms, self.speaking, self.filler_rate) {
            Some(tick) => {
                self.stats.ticks += 1;
                self.readings.push(Reading {
                    focus: tick.scores.focus as f64,
                    energy: tick.scores.energy as f64,
                    confidence: tick.scores.confidence as f64,
                    face_detected: tick.face_detected,
                    timestamp_ms,
                });
                if self.stats.ticks % 60 == 0 {
                    self.logger.log_progress(self.stats.ticks, tick.scores);
                }
                Some(tick)
            }
            None => {
                debug!(timestamp_ms, "No frames in tick window");
                self.stats.empty_ticks += 1;
                None
            }
        }
    }

    fn track_calibration(&mut self, timestamp_ms: i64) {
        let phase = self.engine.calibration_status().phase;
        if phase != self.calibration_phase {
            self.logger
                .log_calibration_phase(self.calibration_phase, phase, timestamp_ms);
            self.calibration_phase = phase;
        }
    }

    /// Count a malformed line.
    pub fn skip_line(&mut self, err: &WorkerError) {
        self.stats.skipped_lines += 1;
        counter!(LINES_SKIPPED_TOTAL).increment(1);
        self.logger.log_skipped_line(err);
    }

    pub fn calibration_phase(&self) -> CalibrationPhase {
        self.calibration_phase
    }

    /// End-of-session summary over the recorded ticks.
    pub fn summary(&self) -> SessionSummary {
        let duration_ms = match (self.first_ms, self.last_ms) {
            (Some(first), Some(last)) => (last - first).max(0),
            _ => 0,
        };
        summarize_session(&self.readings, (duration_ms / 1_000) as u64)
    }

    pub fn generate_report(&mut self) -> Report {
        self.engine.generate_daily_report()
    }
}

async fn write_record<W>(writer: &mut W, record: &OutputRecord) -> WorkerResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    Ok(())
}

/// Replay every line of `reader`, writing tick, report and summary lines to
/// `writer`. Malformed lines are logged and skipped.
pub async fn run_replay<R, W>(reader: R, mut writer: W, mut replay: SessionReplay) -> WorkerResult<SessionReplay>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    replay.logger
        .log_start(replay.engine.context_mode(), replay.calibration_phase);

    let mut lines = reader.lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let record = match FrameRecord::parse(&line, line_no) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(e) if e.is_skippable() => {
                replay.skip_line(&e);
                continue;
            }
            Err(e) => return Err(e),
        };

        for tick in replay.push(&record) {
            write_record(&mut writer, &OutputRecord::Tick(Box::new(tick))).await?;
        }
    }

    if let Some(tick) = replay.finish() {
        write_record(&mut writer, &OutputRecord::Tick(Box::new(tick))).await?;
    }

    let report = Box::new(replay.generate_report());
    replay.logger.log_completion(&replay.stats, &report);
    write_record(&mut writer, &OutputRecord::Report(report)).await?;
    write_record(&mut writer, &OutputRecord::Summary(replay.summary())).await?;
    writer.flush().await?;
    Ok(replay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_engine::SyntheticFace;

    fn replay() -> SessionReplay {
        SessionReplay::new(AnalysisEngine::default(), 1_000, SessionLogger::new("test", "replay"))
    }

    fn record(ts: i64, face: bool) -> FrameRecord {
        FrameRecord {
            timestamp_ms: ts,
            landmarks: face.then(|| SyntheticFace::new().build()),
            speaking: false,
            filler_rate: 0.0,
        }
    }

    #[test]
    fn test_parse_line() {
        assert!(FrameRecord::parse("   ", 1).unwrap().is_none());
        let parsed = FrameRecord::parse(r#"{"timestamp_ms": 5, "landmarks": null}"#, 2)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.timestamp_ms, 5);
        assert!(parsed.landmarks.is_none());

        let err = FrameRecord::parse("{not json", 3).unwrap_err();
        assert!(err.is_skippable());
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_ticks_follow_timestamps() {
        let mut replay = replay();
        let mut ticks = 0;
        for i in 0..30 {
            ticks += replay.push(&record(i * 100, true)).len();
        }
        // Frames span 0..2900 ms: ticks at 1000 and 2000
        assert_eq!(ticks, 2);
        assert!(replay.finish().is_some());
        assert_eq!(replay.stats().frames, 30);
    }

    #[test]
    fn test_gap_produces_empty_ticks() {
        let mut replay = replay();
        replay.push(&record(0, true));
        let ticks = replay.push(&record(5_000, true));
        // Only the first window had frames
        assert_eq!(ticks.len(), 1);
        assert_eq!(replay.stats().empty_ticks, 4);
    }

    #[test]
    fn test_epoch_jump_skips_in_one_step() {
        let mut replay = replay();
        replay.push(&record(0, true));

        let epoch_ms = 1_700_000_000_000;
        let ticks = replay.push(&record(epoch_ms, true));
        assert_eq!(ticks.len(), 1);
        assert_eq!(replay.stats().empty_ticks, 1_699_999_999);

        // The clock now follows epoch time
        assert!(replay.push(&record(epoch_ms + 500, true)).is_empty());
        let tick = replay.finish().expect("tick");
        assert_eq!(tick.timestamp_ms, epoch_ms + 1_000);
        assert_eq!(replay.stats().frames, 3);
    }

    #[test]
    fn test_timestamps_near_i64_max() {
        let mut replay = replay();
        assert!(replay.push(&record(i64::MAX - 10, true)).is_empty());
        assert!(replay.push(&record(i64::MAX - 5, true)).is_empty());

        let tick = replay.finish().expect("tick");
        assert_eq!(tick.timestamp_ms, i64::MAX);
        assert_eq!(replay.stats().frames, 2);
    }

    #[test]
    fn test_tracks_calibration_phase() {
        let mut engine = AnalysisEngine::default();
        engine.start_calibration();
        let mut replay = SessionReplay::new(engine, 1_000, SessionLogger::new("test", "replay"));
        assert_eq!(replay.calibration_phase(), CalibrationPhase::PhaseA);

        for ts in (0..=15_000).step_by(500) {
            replay.push(&record(ts, true));
        }
        assert_eq!(replay.calibration_phase(), CalibrationPhase::PhaseB);
    }
}
