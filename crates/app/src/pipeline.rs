//! The sequential classification pipeline.
//!
//! One thread owns every stage: it reads bytes with a bounded timeout,
//! assembles frames, and runs preprocessing, feature extraction,
//! standardization, and classification to completion before reading further
//! bytes. All frame buffers live in the [`Pipeline`] struct and are reused
//! across frames; because a single thread both writes and reads them, no
//! locking is involved anywhere on the frame path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;

use chromad_ccd::{
    ByteSource, FrameAssembler, FrameStats, Preprocessor, FRAME_SAMPLES,
};
use chromad_classify::{Classifier, ClassifyEvent};
use chromad_features::{FeatureExtractor, Standardizer};
use chromad_foundation::{AppError, ConfigError, TransportError};
use chromad_telemetry::{PipelineMetrics, PipelineStage, RateTracker};

/// Sizing and timing for the pipeline loop.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub frame_len: usize,
    pub feature_len: usize,
    pub read_timeout: Duration,
    pub read_chunk_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_len: FRAME_SAMPLES,
            feature_len: FeatureExtractor::nominal_feature_len(FRAME_SAMPLES),
            read_timeout: Duration::from_millis(100),
            read_chunk_bytes: 1024,
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    assembler: FrameAssembler,
    preprocessor: Preprocessor,
    extractor: FeatureExtractor,
    standardizer: Standardizer,
    classifier: Classifier,
    norm_frame: Vec<f32>,
    features: Vec<f32>,
    seq: u64,
    rate: RateTracker,
    metrics: Arc<PipelineMetrics>,
    event_tx: Sender<ClassifyEvent>,
}

impl Pipeline {
    /// Wire the stages together, checking every length contract up front so
    /// a misconfigured layout fails at startup instead of feeding the model
    /// silently wrong data.
    pub fn new(
        config: PipelineConfig,
        standardizer: Standardizer,
        classifier: Classifier,
        metrics: Arc<PipelineMetrics>,
        event_tx: Sender<ClassifyEvent>,
    ) -> Result<Self, ConfigError> {
        let extractor = FeatureExtractor::new(config.frame_len, config.feature_len)?;

        if standardizer.feature_len() != config.feature_len {
            return Err(ConfigError::ScalerLengthMismatch {
                kind: "mean",
                expected: config.feature_len,
                got: standardizer.feature_len(),
            });
        }
        if classifier.input_len() != config.feature_len {
            return Err(ConfigError::EngineInputMismatch {
                expected: config.feature_len,
                engine: classifier.input_len(),
            });
        }

        Ok(Self {
            assembler: FrameAssembler::new(config.frame_len),
            preprocessor: Preprocessor::new(config.frame_len),
            extractor,
            standardizer,
            classifier,
            norm_frame: Vec::with_capacity(config.frame_len),
            features: Vec::with_capacity(config.feature_len),
            seq: 0,
            rate: RateTracker::new(),
            metrics,
            event_tx,
            config,
        })
    }

    /// Run until the shutdown flag is set or the byte source disconnects.
    ///
    /// A read that times out with no bytes is not an error; the loop simply
    /// comes back around, which is also where the shutdown flag is observed.
    pub fn run(mut self, mut source: impl ByteSource, shutdown: Arc<AtomicBool>) {
        tracing::info!(
            frame_len = self.config.frame_len,
            feature_len = self.config.feature_len,
            classes = self.classifier.class_count(),
            "CCD pipeline started"
        );

        let mut buf = vec![0u8; self.config.read_chunk_bytes];

        while !shutdown.load(Ordering::Relaxed) {
            match source.read(&mut buf, self.config.read_timeout) {
                Ok(0) => {
                    self.metrics.increment_transport_timeouts();
                }
                Ok(n) => {
                    self.metrics.add_bytes_received(n);
                    self.metrics.mark_stage_active(PipelineStage::Transport);
                    for &byte in &buf[..n] {
                        if self.assembler.push_byte(byte) {
                            self.process_frame();
                        }
                    }
                }
                Err(TransportError::Disconnected) => {
                    tracing::info!("byte source disconnected, stopping pipeline");
                    break;
                }
                Err(e) => {
                    tracing::error!("transport failure: {e}");
                    break;
                }
            }
        }

        tracing::info!(frames = self.seq, "CCD pipeline stopped");
    }

    fn process_frame(&mut self) {
        self.seq += 1;
        self.metrics.increment_frames_assembled();
        self.metrics.mark_stage_active(PipelineStage::Assembler);

        if let Some(stats) = FrameStats::from_raw(self.assembler.raw_frame()) {
            tracing::debug!(
                seq = self.seq,
                min = stats.min,
                max = stats.max,
                mean = stats.mean,
                peak_pos = stats.peak_pos,
                "frame received"
            );
        }

        let percentiles = self
            .preprocessor
            .process(self.assembler.raw_frame_mut(), &mut self.norm_frame);
        self.metrics.mark_stage_active(PipelineStage::Preprocess);
        tracing::debug!(
            p25 = percentiles.p25,
            p50 = percentiles.p50,
            p75 = percentiles.p75,
            iqr = percentiles.iqr(),
            "frame normalized"
        );

        self.extractor.extract(&self.norm_frame, &mut self.features);
        self.metrics.mark_stage_active(PipelineStage::Features);

        self.standardizer.apply(&mut self.features);

        self.metrics.mark_stage_active(PipelineStage::Classify);
        match self.classifier.classify(&self.features) {
            Ok(classification) => {
                tracing::info!(
                    seq = self.seq,
                    class = classification.class_index,
                    label = classification.label.as_deref().unwrap_or("unlabeled"),
                    confidence = classification.confidence,
                    "frame classified"
                );
                self.metrics.increment_frames_classified();
                self.metrics
                    .record_decision(classification.class_index, classification.confidence);
                if let Some(rate) = self.rate.tick() {
                    self.metrics.update_frame_rate(rate);
                }

                if self
                    .event_tx
                    .send(ClassifyEvent::FrameClassified {
                        seq: self.seq,
                        classification,
                    })
                    .is_err()
                {
                    tracing::warn!("no listener for classification events");
                }
            }
            Err(e) => {
                // The raw data for this frame is gone, so there is nothing
                // to retry; drop it and continue with the next frame.
                tracing::error!(seq = self.seq, "inference failed, dropping frame: {e}");
                self.metrics.increment_inference_failures();
                let _ = self
                    .event_tx
                    .send(ClassifyEvent::InferenceFailed { seq: self.seq });
            }
        }
    }
}

/// A handle to the dedicated pipeline thread.
pub struct PipelineThread {
    handle: JoinHandle<()>,
    shutdown: Arc<AtomicBool>,
}

impl PipelineThread {
    pub fn spawn(
        pipeline: Pipeline,
        source: impl ByteSource + 'static,
    ) -> Result<Self, AppError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();

        let handle = thread::Builder::new()
            .name("ccd-pipeline".to_string())
            .spawn(move || pipeline.run(source, flag))
            .map_err(|e| AppError::Fatal(format!("Failed to spawn pipeline thread: {e}")))?;

        Ok(Self { handle, shutdown })
    }

    pub fn stop(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.handle.join();
    }
}
