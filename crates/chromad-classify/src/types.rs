/// Class decision for one completed frame. Created per frame, handed to the
/// publishing side immediately, never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub class_index: usize,
    /// The engine's output value for the winning class. Used comparatively;
    /// not assumed to be a calibrated probability.
    pub confidence: f32,
    pub label: Option<String>,
}

/// Events emitted by the classification stage, one per completed frame.
#[derive(Debug, Clone)]
pub enum ClassifyEvent {
    FrameClassified {
        seq: u64,
        classification: Classification,
    },
    /// The engine failed on this frame. The frame is dropped; the raw data
    /// is gone, so there is nothing to retry.
    InferenceFailed { seq: u64 },
}
