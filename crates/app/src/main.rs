use std::io::Read;
use std::path::PathBuf;
use std::thread;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use chromad_app::config::{AppSettings, ModelFile};
use chromad_app::pipeline::PipelineConfig;
use chromad_app::runtime::{self, AppHandle, RuntimeOptions};
use chromad_classify::{Classifier, ClassifierConfig, ClassifyEvent, NoOpEngine};
use chromad_features::Standardizer;
use chromad_foundation::{AppState, StateManager};

#[derive(Debug, Parser)]
#[command(name = "chromad", about = "CCD color classification pipeline")]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, env = "CHROMAD_CONFIG")]
    config: Option<PathBuf>,

    /// Model bundle (JSON); overrides the settings file entry
    #[arg(long)]
    model: Option<PathBuf>,
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "chromad.log");
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(_guard);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().map_err(|e| anyhow::anyhow!("logging init failed: {e}"))?;
    tracing::info!("Starting chromad");

    let cli = Cli::parse();
    let state_manager = StateManager::new();

    let mut settings = match &cli.config {
        Some(path) => AppSettings::load(path)?,
        None => AppSettings::default(),
    };
    if let Some(model) = cli.model {
        settings.model = Some(model);
    }

    // Scaler constants and the label table come from the model bundle when
    // one is configured; without one, identity scaling and unlabeled classes.
    let (standardizer, classifier_config) = match &settings.model {
        Some(path) => {
            let bundle = ModelFile::load(path)?;
            bundle.validate(settings.feature_len)?;
            tracing::info!(
                path = %path.display(),
                input_size = bundle.input_size,
                classes = bundle.class_count,
                labeled = bundle.labels.is_some(),
                "model bundle loaded"
            );
            (bundle.standardizer()?, bundle.classifier_config())
        }
        None => (
            Standardizer::identity(settings.feature_len),
            ClassifierConfig::new(settings.class_count),
        ),
    };

    // No model backend is linked into this binary; the engine seam is filled
    // by the no-op engine until a real one is injected.
    let engine = NoOpEngine::new(settings.feature_len, classifier_config.class_count);
    tracing::info!(
        input_len = settings.feature_len,
        output_len = classifier_config.class_count,
        "inference engine ready (no-op backend)"
    );
    let classifier = Classifier::new(Box::new(engine), classifier_config)?;

    let options = RuntimeOptions {
        pipeline: PipelineConfig {
            frame_len: settings.frame_len,
            feature_len: settings.feature_len,
            read_timeout: settings.read_timeout(),
            read_chunk_bytes: settings.read_chunk_bytes,
        },
        ..Default::default()
    };
    let (handle, bytes_tx) = runtime::start(options, standardizer, classifier)?;
    state_manager.transition(AppState::Running)?;

    // stdin is the byte transport for this binary; a serial or socket reader
    // plugs into the same sender.
    let transport = spawn_stdin_reader(bytes_tx, settings.read_chunk_bytes)?;

    let mut events = handle.subscribe();
    loop {
        tokio::select! {
            _ = AppHandle::wait_for_shutdown_signal() => break,
            event = events.recv() => match event {
                Ok(ClassifyEvent::FrameClassified { seq, classification }) => {
                    tracing::info!(
                        seq,
                        class = classification.class_index,
                        label = classification.label.as_deref().unwrap_or("unlabeled"),
                        confidence = classification.confidence,
                        confidence_pct = classification.confidence * 100.0,
                        "color detected"
                    );
                }
                Ok(ClassifyEvent::InferenceFailed { seq }) => {
                    tracing::warn!(seq, "classification failed for frame");
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event subscriber lagging");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    state_manager.transition(AppState::Stopping)?;
    handle.shutdown().await;
    // The reader thread may be parked in a blocking stdin read with no data
    // to unblock it; it exits with the process instead of being joined.
    drop(transport);
    state_manager.transition(AppState::Stopped)?;
    tracing::info!("chromad stopped");
    Ok(())
}

fn spawn_stdin_reader(
    tx: crossbeam_channel::Sender<Vec<u8>>,
    chunk_bytes: usize,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("byte-transport".to_string())
        .spawn(move || {
            let mut stdin = std::io::stdin().lock();
            let mut buf = vec![0u8; chunk_bytes];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => {
                        tracing::info!("byte stream ended");
                        break;
                    }
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("stdin read failed: {e}");
                        break;
                    }
                }
            }
        })
}
