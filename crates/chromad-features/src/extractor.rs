//! Feature extraction over the normalized frame.
//!
//! The model's input is positional: the spectrum copy, then seven global
//! statistics, then eight regional triples, then zero padding. The order and
//! the estimators (biased variance, strict comparisons, first-occurrence
//! peaks, integer-division region bounds) are exactly what the model was
//! trained on and must not be "improved".

use chromad_foundation::ConfigError;

/// Global statistics appended after the spectrum copy:
/// mean, stddev, range, fraction-above-mean, max, min, normalized peak position.
pub const GLOBAL_FEATURES: usize = 7;

/// Contiguous regions the frame is partitioned into.
pub const REGIONS: usize = 8;

/// Values per region: mean, max, normalized position of the max.
pub const REGION_FEATURES: usize = 3;

pub struct FeatureExtractor {
    frame_len: usize,
    feature_len: usize,
}

impl FeatureExtractor {
    pub fn new(frame_len: usize, feature_len: usize) -> Result<Self, ConfigError> {
        if frame_len < REGIONS {
            return Err(ConfigError::FrameTooShort {
                min: REGIONS,
                got: frame_len,
            });
        }
        if feature_len == 0 {
            return Err(ConfigError::Invalid(
                "feature vector length must be at least 1".into(),
            ));
        }
        Ok(Self {
            frame_len,
            feature_len,
        })
    }

    /// Feature vector length when nothing is truncated: the full spectrum
    /// plus global and regional statistics.
    pub fn nominal_feature_len(frame_len: usize) -> usize {
        frame_len + GLOBAL_FEATURES + REGIONS * REGION_FEATURES
    }

    pub fn feature_len(&self) -> usize {
        self.feature_len
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Fill `out` with exactly `feature_len` values from the normalized
    /// frame. Every write is bounds-checked: with a short feature vector the
    /// layout truncates (a region's triple is only written when all three
    /// values fit), with a long one the tail is zero.
    pub fn extract(&self, normalized: &[f32], out: &mut Vec<f32>) {
        debug_assert_eq!(normalized.len(), self.frame_len);

        let n = self.frame_len;
        let m = self.feature_len;

        out.clear();

        // 1. Spectrum copy, truncated if the feature vector is shorter.
        out.extend(normalized.iter().take(m));

        // 2. Global statistics.
        let mut sum = 0.0f32;
        let mut sum_sq = 0.0f32;
        let mut min_val = normalized[0];
        let mut max_val = normalized[0];
        let mut peak_val = normalized[0];
        let mut peak_pos = 0usize;

        for (i, &v) in normalized.iter().enumerate() {
            sum += v;
            sum_sq += v * v;

            if v < min_val {
                min_val = v;
            }
            if v > max_val {
                max_val = v;
            }
            if v > peak_val {
                peak_val = v;
                peak_pos = i;
            }
        }

        let mean = sum / n as f32;
        let variance = (sum_sq / n as f32) - mean * mean;
        let std_dev = (variance + 1e-8).sqrt();

        let above_mean = normalized.iter().filter(|&&v| v > mean).count();

        let globals = [
            mean,
            std_dev,
            max_val - min_val,
            above_mean as f32 / n as f32,
            max_val,
            min_val,
            peak_pos as f32 / n as f32,
        ];
        for g in globals {
            if out.len() < m {
                out.push(g);
            }
        }

        // 3. Regional statistics. Regions 0..6 hold `region_size` samples;
        // the last region absorbs the integer-division remainder.
        let region_size = n / REGIONS;
        for r in 0..REGIONS {
            if out.len() + REGION_FEATURES > m {
                break;
            }

            let start = r * region_size;
            let end = if r == REGIONS - 1 {
                n
            } else {
                start + region_size
            };

            let mut region_sum = 0.0f32;
            let mut region_max = normalized[start];
            let mut region_max_idx = start;

            for (i, &v) in normalized.iter().enumerate().take(end).skip(start) {
                region_sum += v;
                if v > region_max {
                    region_max = v;
                    region_max_idx = i;
                }
            }

            out.push(region_sum / (end - start) as f32);
            out.push(region_max);
            out.push(region_max_idx as f32 / n as f32);
        }

        let filled = out.len();

        // 4. Zero-fill whatever remains.
        out.resize(m, 0.0);

        tracing::trace!(filled, padded = m - filled, "features extracted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn extract(frame: &[f32], feature_len: usize) -> Vec<f32> {
        let extractor = FeatureExtractor::new(frame.len(), feature_len).unwrap();
        let mut out = Vec::new();
        extractor.extract(frame, &mut out);
        out
    }

    #[test]
    fn output_length_is_exactly_m_for_any_combination() {
        let frame: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let nominal = FeatureExtractor::nominal_feature_len(16);
        assert_eq!(nominal, 16 + 31);

        for m in [1, 8, 15, 16, 20, 23, 24, nominal - 1, nominal, nominal + 9] {
            assert_eq!(extract(&frame, m).len(), m, "feature_len {m}");
        }
    }

    #[test]
    fn spectrum_copy_comes_first() {
        let frame: Vec<f32> = (0..16).map(|i| i as f32 * 0.5).collect();
        let out = extract(&frame, 47);
        assert_eq!(&out[..16], frame.as_slice());
    }

    #[test]
    fn global_statistics_match_hand_computation() {
        // 16 samples, constant 2.0 except a single 6.0 peak at index 5.
        let mut frame = vec![2.0f32; 16];
        frame[5] = 6.0;
        let out = extract(&frame, 47);

        let mean = (15.0 * 2.0 + 6.0) / 16.0;
        let sum_sq = 15.0 * 4.0 + 36.0;
        let variance = sum_sq / 16.0 - mean * mean;

        assert_abs_diff_eq!(out[16], mean, epsilon = 1e-6);
        assert_abs_diff_eq!(out[17], (variance + 1e-8f32).sqrt(), epsilon = 1e-6);
        assert_abs_diff_eq!(out[18], 4.0, epsilon = 1e-6); // range
        assert_abs_diff_eq!(out[19], 1.0 / 16.0, epsilon = 1e-6); // strictly above mean
        assert_abs_diff_eq!(out[20], 6.0, epsilon = 1e-6); // max
        assert_abs_diff_eq!(out[21], 2.0, epsilon = 1e-6); // min
        assert_abs_diff_eq!(out[22], 5.0 / 16.0, epsilon = 1e-6); // peak position
    }

    #[test]
    fn peak_position_takes_the_first_maximum() {
        let mut frame = vec![0.0f32; 16];
        frame[3] = 7.0;
        frame[9] = 7.0;
        let out = extract(&frame, 47);
        assert_abs_diff_eq!(out[22], 3.0 / 16.0, epsilon = 1e-6);
    }

    #[test]
    fn regions_partition_with_remainder_in_the_last() {
        // 19 samples: region_size = 2, regions 0..6 hold 2 samples each,
        // region 7 runs from index 14 to 19.
        let frame: Vec<f32> = (0..19).map(|i| i as f32).collect();
        let out = extract(&frame, FeatureExtractor::nominal_feature_len(19));
        let regional = &out[19 + GLOBAL_FEATURES..];

        // Region 0: samples [0, 1].
        assert_abs_diff_eq!(regional[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(regional[1], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(regional[2], 1.0 / 19.0, epsilon = 1e-6);

        // Region 7: samples [14..19], mean 16, max 18 at global index 18.
        assert_abs_diff_eq!(regional[21], 16.0, epsilon = 1e-6);
        assert_abs_diff_eq!(regional[22], 18.0, epsilon = 1e-6);
        assert_abs_diff_eq!(regional[23], 18.0 / 19.0, epsilon = 1e-6);
    }

    #[test]
    fn regional_peak_positions_are_global_indices() {
        let mut frame = vec![0.0f32; 16];
        frame[10] = 3.0; // region 5 (samples 10, 11)
        let out = extract(&frame, FeatureExtractor::nominal_feature_len(16));
        let regional = &out[16 + GLOBAL_FEATURES..];
        assert_abs_diff_eq!(
            regional[5 * REGION_FEATURES + 2],
            10.0 / 16.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn a_region_triple_is_all_or_nothing() {
        let frame: Vec<f32> = (0..16).map(|i| i as f32).collect();
        // Room for the spectrum, the globals, one full region, and 2 slots:
        // not enough for a second triple, so those 2 slots must be zero.
        let m = 16 + GLOBAL_FEATURES + REGION_FEATURES + 2;
        let out = extract(&frame, m);
        assert_ne!(out[16 + GLOBAL_FEATURES], 0.0);
        assert_eq!(out[m - 2], 0.0);
        assert_eq!(out[m - 1], 0.0);
    }

    #[test]
    fn tail_is_zero_filled_when_m_exceeds_the_layout() {
        let frame: Vec<f32> = (0..16).map(|i| (i as f32).cos()).collect();
        let nominal = FeatureExtractor::nominal_feature_len(16);
        let out = extract(&frame, nominal + 5);
        assert!(out[nominal..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn frames_shorter_than_the_region_count_are_rejected() {
        assert!(matches!(
            FeatureExtractor::new(7, 38),
            Err(ConfigError::FrameTooShort { min: 8, got: 7 })
        ));
    }
}
