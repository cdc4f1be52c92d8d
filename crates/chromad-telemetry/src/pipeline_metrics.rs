use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Most recent class decision, kept for dashboards and probes.
#[derive(Debug, Clone)]
pub struct LastDecision {
    pub class_index: usize,
    pub confidence: f32,
    pub at: Instant,
}

/// Shared metrics for cross-thread pipeline monitoring
#[derive(Clone)]
pub struct PipelineMetrics {
    // Counters
    pub bytes_received: Arc<AtomicU64>,
    pub frames_assembled: Arc<AtomicU64>,
    pub frames_classified: Arc<AtomicU64>,
    pub inference_failures: Arc<AtomicU64>,
    pub transport_timeouts: Arc<AtomicU64>,

    // Pipeline stage tracking
    pub stage_transport: Arc<AtomicBool>,
    pub stage_assembler: Arc<AtomicBool>,
    pub stage_preprocess: Arc<AtomicBool>,
    pub stage_features: Arc<AtomicBool>,
    pub stage_classify: Arc<AtomicBool>,

    // Frame rate tracking
    pub frame_rate: Arc<AtomicU64>, // frames per second * 10

    pub last_decision: Arc<RwLock<Option<LastDecision>>>,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            bytes_received: Arc::new(AtomicU64::new(0)),
            frames_assembled: Arc::new(AtomicU64::new(0)),
            frames_classified: Arc::new(AtomicU64::new(0)),
            inference_failures: Arc::new(AtomicU64::new(0)),
            transport_timeouts: Arc::new(AtomicU64::new(0)),

            stage_transport: Arc::new(AtomicBool::new(false)),
            stage_assembler: Arc::new(AtomicBool::new(false)),
            stage_preprocess: Arc::new(AtomicBool::new(false)),
            stage_features: Arc::new(AtomicBool::new(false)),
            stage_classify: Arc::new(AtomicBool::new(false)),

            frame_rate: Arc::new(AtomicU64::new(0)),

            last_decision: Arc::new(RwLock::new(None)),
        }
    }
}

impl PipelineMetrics {
    pub fn add_bytes_received(&self, count: usize) {
        self.bytes_received
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn increment_frames_assembled(&self) {
        self.frames_assembled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_frames_classified(&self) {
        self.frames_classified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_inference_failures(&self) {
        self.inference_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transport_timeouts(&self) {
        self.transport_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_stage_active(&self, stage: PipelineStage) {
        match stage {
            PipelineStage::Transport => self.stage_transport.store(true, Ordering::Relaxed),
            PipelineStage::Assembler => self.stage_assembler.store(true, Ordering::Relaxed),
            PipelineStage::Preprocess => self.stage_preprocess.store(true, Ordering::Relaxed),
            PipelineStage::Features => self.stage_features.store(true, Ordering::Relaxed),
            PipelineStage::Classify => self.stage_classify.store(true, Ordering::Relaxed),
        }
    }

    pub fn decay_stages(&self) {
        self.stage_transport.store(false, Ordering::Relaxed);
        self.stage_assembler.store(false, Ordering::Relaxed);
        self.stage_preprocess.store(false, Ordering::Relaxed);
        self.stage_features.store(false, Ordering::Relaxed);
        self.stage_classify.store(false, Ordering::Relaxed);
    }

    pub fn update_frame_rate(&self, fps: f64) {
        self.frame_rate.store((fps * 10.0) as u64, Ordering::Relaxed);
    }

    pub fn record_decision(&self, class_index: usize, confidence: f32) {
        *self.last_decision.write() = Some(LastDecision {
            class_index,
            confidence,
            at: Instant::now(),
        });
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PipelineStage {
    Transport,
    Assembler,
    Preprocess,
    Features,
    Classify,
}

/// Counts events and reports a rate once per second.
#[derive(Debug)]
pub struct RateTracker {
    last_update: Instant,
    count: u64,
}

impl RateTracker {
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            count: 0,
        }
    }

    pub fn tick(&mut self) -> Option<f64> {
        self.count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed >= Duration::from_secs(1) {
            let rate = self.count as f64 / elapsed.as_secs_f64();
            self.last_update = Instant::now();
            self.count = 0;
            Some(rate)
        } else {
            None
        }
    }
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = PipelineMetrics::default();
        metrics.add_bytes_received(1024);
        metrics.add_bytes_received(512);
        metrics.increment_frames_assembled();
        metrics.increment_inference_failures();

        assert_eq!(metrics.bytes_received.load(Ordering::Relaxed), 1536);
        assert_eq!(metrics.frames_assembled.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.inference_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.frames_classified.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn stage_flags_set_and_decay() {
        let metrics = PipelineMetrics::default();
        metrics.mark_stage_active(PipelineStage::Assembler);
        metrics.mark_stage_active(PipelineStage::Classify);
        assert!(metrics.stage_assembler.load(Ordering::Relaxed));
        assert!(metrics.stage_classify.load(Ordering::Relaxed));
        assert!(!metrics.stage_preprocess.load(Ordering::Relaxed));

        metrics.decay_stages();
        assert!(!metrics.stage_assembler.load(Ordering::Relaxed));
        assert!(!metrics.stage_classify.load(Ordering::Relaxed));
    }

    #[test]
    fn last_decision_is_recorded() {
        let metrics = PipelineMetrics::default();
        assert!(metrics.last_decision.read().is_none());

        metrics.record_decision(3, 0.92);
        let decision = metrics.last_decision.read().clone().unwrap();
        assert_eq!(decision.class_index, 3);
        assert!((decision.confidence - 0.92).abs() < f32::EPSILON);
    }
}
