//! Frame preprocessing: impulsive-noise removal and robust normalization.
//!
//! The numeric details here are load-bearing. The pretrained model was fit on
//! frames produced by exactly this filter and this percentile estimator, so
//! any change to boundary handling, percentile positions, or clipping shifts
//! the feature distribution and silently degrades accuracy without ever
//! raising an error.

use crate::constants::{IQR_EPSILON, NORM_CLIP};

/// Nearest-rank quartiles of a frame.
///
/// These come from integer-division positions `n/4`, `n/2`, `3n/4` of the
/// sorted data, without interpolation. Not the textbook percentile, but the
/// estimator the model was trained against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentiles {
    pub p25: f32,
    pub p50: f32,
    pub p75: f32,
}

impl Percentiles {
    pub fn iqr(&self) -> f32 {
        self.p75 - self.p25
    }
}

/// Median-of-3 filter over the interior samples, in place.
///
/// The previous sample is cached before each overwrite so every median is
/// taken over the original sequence rather than cascading already-filtered
/// values. The first and last samples are never touched; the model expects
/// that exclusion.
pub fn median_filter3(frame: &mut [u16]) {
    if frame.len() < 3 {
        return;
    }

    let mut prev = frame[0];
    for i in 1..frame.len() - 1 {
        let (a, b, c) = (prev, frame[i], frame[i + 1]);
        prev = b;
        frame[i] = median3(a, b, c);
    }
}

fn median3(a: u16, b: u16, c: u16) -> u16 {
    a.min(b).max(a.max(b).min(c))
}

/// Denoises and normalizes raw frames.
///
/// Holds a scratch buffer for the percentile sort so steady-state operation
/// does not allocate per frame.
pub struct Preprocessor {
    sorted: Vec<f32>,
}

impl Preprocessor {
    pub fn new(frame_len: usize) -> Self {
        Self {
            sorted: Vec::with_capacity(frame_len),
        }
    }

    /// Full preprocessing pass: median-filter `raw` in place, then write the
    /// normalized frame into `out`. Returns the quartiles for logging.
    pub fn process(&mut self, raw: &mut [u16], out: &mut Vec<f32>) -> Percentiles {
        median_filter3(raw);

        out.clear();
        out.extend(raw.iter().map(|&s| s as f32));
        let percentiles = self.robust_normalize(out);
        tracing::trace!(
            p25 = percentiles.p25,
            p50 = percentiles.p50,
            p75 = percentiles.p75,
            iqr = percentiles.iqr(),
            "robust normalization"
        );
        percentiles
    }

    /// Robust normalization in place: center on the median, scale by the
    /// interquartile range, clip to [-NORM_CLIP, NORM_CLIP].
    ///
    /// A near-constant frame (IQR at or below [`IQR_EPSILON`]) is left as the
    /// raw converted values, unnormalized. The model saw exactly this
    /// passthrough for degenerate frames during training; substituting a
    /// fallback scale here would feed it data it has never seen.
    pub fn robust_normalize(&mut self, values: &mut [f32]) -> Percentiles {
        debug_assert!(!values.is_empty());
        let n = values.len();

        self.sorted.clear();
        self.sorted.extend_from_slice(values);
        self.sorted.sort_unstable_by(f32::total_cmp);

        let percentiles = Percentiles {
            p25: self.sorted[n / 4],
            p50: self.sorted[n / 2],
            p75: self.sorted[3 * n / 4],
        };

        let iqr = percentiles.iqr();
        if iqr > IQR_EPSILON {
            for v in values.iter_mut() {
                *v = ((*v - percentiles.p50) / iqr).clamp(-NORM_CLIP, NORM_CLIP);
            }
        }

        percentiles
    }
}
