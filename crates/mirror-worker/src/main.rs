//! Landmark replay worker binary.

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mirror_engine::AnalysisEngine;
use mirror_worker::{run_replay, InputSource, SessionLogger, SessionReplay, StateStore, WorkerConfig};

fn init_tracing() -> anyhow::Result<()> {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("mirror=info".parse()?);

    // Logs go to stderr; stdout carries the JSON-lines output
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing()?;

    info!("Starting mirror-worker");

    let config = WorkerConfig::from_env();
    config.validate()?;
    info!("Worker config: {:?}", config);

    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!(%addr, "Metrics listener started");
    }

    let mut engine = AnalysisEngine::from_env().context("Invalid engine configuration")?;
    engine.set_context_mode(config.context_mode);

    let store = config.state_path.clone().map(StateStore::new);
    if let Some(store) = &store {
        if let Some(state) = store.load().await.context("Failed to load session state")? {
            engine.restore_persistent_state(state);
        }
    }

    if config.auto_calibrate {
        engine.start_calibration();
    } else {
        engine.skip_calibration();
    }

    let logger = SessionLogger::new(&config.session_id, "replay");
    let replay = SessionReplay::new(engine, config.tick_interval_ms, logger);
    let stdout = tokio::io::stdout();

    let replay = match &config.input {
        InputSource::Stdin => run_replay(BufReader::new(tokio::io::stdin()), stdout, replay).await?,
        InputSource::File(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            run_replay(BufReader::new(file), stdout, replay).await?
        }
    };

    if let Some(store) = &store {
        store
            .save(&replay.engine().persistent_state())
            .await
            .context("Failed to save session state")?;
    }

    info!("Worker shutdown complete");
    Ok(())
}
