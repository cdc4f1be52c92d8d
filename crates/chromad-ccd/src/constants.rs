//! CCD frame constants

/// Samples per CCD frame (pixels on the sensor line)
pub const FRAME_SAMPLES: usize = 1546;

/// Bytes per frame on the wire: two bytes per sample, big-endian
pub const FRAME_BYTES: usize = FRAME_SAMPLES * 2;

/// Clip bound applied after robust normalization
pub const NORM_CLIP: f32 = 5.0;

/// An interquartile range at or below this is treated as a degenerate,
/// near-constant frame and normalization is skipped
pub const IQR_EPSILON: f32 = 1e-6;
