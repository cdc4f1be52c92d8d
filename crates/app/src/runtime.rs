use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

use chromad_ccd::ChannelByteSource;
use chromad_classify::{Classifier, ClassifyEvent};
use chromad_features::Standardizer;
use chromad_foundation::AppError;
use chromad_telemetry::PipelineMetrics;

use crate::pipeline::{Pipeline, PipelineConfig, PipelineThread};

/// Options for starting the chromad runtime.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub pipeline: PipelineConfig,
    /// Bounded capacity of the byte-transport channel, in chunks.
    pub byte_channel_capacity: usize,
    /// Capacity of the classification event channels.
    pub event_capacity: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            byte_channel_capacity: 64,
            event_capacity: 100,
        }
    }
}

/// Handle to the running pipeline.
pub struct AppHandle {
    pub metrics: Arc<PipelineMetrics>,
    event_tx: broadcast::Sender<ClassifyEvent>,
    pipeline: PipelineThread,
    fanout_handle: JoinHandle<()>,
}

impl AppHandle {
    /// Subscribe to classification events (multiple subscribers supported).
    pub fn subscribe(&self) -> broadcast::Receiver<ClassifyEvent> {
        self.event_tx.subscribe()
    }

    /// Gracefully stop the pipeline and wait for shutdown.
    pub async fn shutdown(self) {
        info!("Shutting down chromad runtime...");

        // Stop the pipeline thread first; joining it drops its event sender,
        // which lets the fanout task drain and terminate.
        self.pipeline.stop();
        let _ = self.fanout_handle.await;

        info!("chromad runtime shutdown complete");
    }

    /// Wait for a shutdown signal (Ctrl+C).
    pub async fn wait_for_shutdown_signal() {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGINT: {}", err);
            }
        }
    }
}

/// Start the pipeline on its own thread and return the handle together with
/// the transport's sending half. Whoever owns the byte stream pushes chunks
/// into the sender; dropping it ends the pipeline once the stream is drained.
pub fn start(
    options: RuntimeOptions,
    standardizer: Standardizer,
    classifier: Classifier,
) -> Result<(AppHandle, crossbeam_channel::Sender<Vec<u8>>), AppError> {
    let metrics = Arc::new(PipelineMetrics::default());
    let (bytes_tx, source) = ChannelByteSource::channel(options.byte_channel_capacity);
    let (raw_event_tx, raw_event_rx) = crossbeam_channel::bounded(options.event_capacity);
    let (event_tx, _) = broadcast::channel(options.event_capacity);

    let pipeline = Pipeline::new(
        options.pipeline,
        standardizer,
        classifier,
        metrics.clone(),
        raw_event_tx,
    )?;
    let pipeline = PipelineThread::spawn(pipeline, source)?;

    // Fan classification events out to any number of subscribers. Ends when
    // the pipeline thread drops its sender.
    let fanout_tx = event_tx.clone();
    let fanout_handle = tokio::task::spawn_blocking(move || {
        while let Ok(event) = raw_event_rx.recv() {
            if fanout_tx.send(event).is_err() {
                tracing::trace!("no subscribers for classification event");
            }
        }
    });

    Ok((
        AppHandle {
            metrics,
            event_tx,
            pipeline,
            fanout_handle,
        },
        bytes_tx,
    ))
}
