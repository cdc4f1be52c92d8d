use chromad_foundation::ConfigError;

/// Clip bound applied after z-score standardization.
pub const STANDARD_CLIP: f32 = 6.0;

/// Floor for the reference deviation; guards the division without changing
/// any feature the model actually scales.
const SIGMA_FLOOR: f32 = 1e-8;

/// Per-feature affine rescaling against reference constants baked in from
/// model training. The arrays are read-only inputs; nothing here is computed
/// at runtime.
pub struct Standardizer {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Standardizer {
    pub fn new(mean: Vec<f32>, std: Vec<f32>, feature_len: usize) -> Result<Self, ConfigError> {
        if mean.len() != feature_len {
            return Err(ConfigError::ScalerLengthMismatch {
                kind: "mean",
                expected: feature_len,
                got: mean.len(),
            });
        }
        if std.len() != feature_len {
            return Err(ConfigError::ScalerLengthMismatch {
                kind: "std",
                expected: feature_len,
                got: std.len(),
            });
        }
        Ok(Self { mean, std })
    }

    /// Identity scaler (mean 0, deviation 1) for bring-up and tests.
    pub fn identity(feature_len: usize) -> Self {
        Self {
            mean: vec![0.0; feature_len],
            std: vec![1.0; feature_len],
        }
    }

    pub fn feature_len(&self) -> usize {
        self.mean.len()
    }

    pub fn apply(&self, features: &mut [f32]) {
        debug_assert_eq!(features.len(), self.mean.len());

        for (i, v) in features.iter_mut().enumerate() {
            let sigma = self.std[i].max(SIGMA_FLOOR);
            *v = ((*v - self.mean[i]) / sigma).clamp(-STANDARD_CLIP, STANDARD_CLIP);
        }
    }
}
