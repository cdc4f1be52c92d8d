use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use chromad_ccd::FRAME_SAMPLES;
use chromad_classify::ClassifierConfig;
use chromad_features::{FeatureExtractor, Standardizer};
use chromad_foundation::ConfigError;

/// Application settings, loaded from a TOML file. Every field has a default
/// so a missing file or an empty one is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppSettings {
    /// Samples per CCD frame.
    pub frame_len: usize,
    /// Model input vector length.
    pub feature_len: usize,
    /// Classes distinguished when no model bundle is configured.
    pub class_count: usize,
    /// Bounded timeout for each byte-stream read.
    pub read_timeout_ms: u64,
    /// Transport read chunk size in bytes.
    pub read_chunk_bytes: usize,
    /// Model bundle (JSON) with scaler constants and the label table.
    pub model: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            frame_len: FRAME_SAMPLES,
            feature_len: FeatureExtractor::nominal_feature_len(FRAME_SAMPLES),
            class_count: 1,
            read_timeout_ms: 100,
            read_chunk_bytes: 1024,
            model: None,
        }
    }
}

impl AppSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Model bundle exported at training/conversion time: the model's input
/// layout size, the class table, and the per-feature scaler constants the
/// standardizer applies at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub input_size: usize,
    pub class_count: usize,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    pub input_mean: Vec<f32>,
    pub input_std: Vec<f32>,
}

impl ModelFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// The bundle must agree with the configured feature vector length; a
    /// mismatch means the settings and the trained model disagree about the
    /// layout, which would silently feed the model garbage.
    pub fn validate(&self, feature_len: usize) -> Result<(), ConfigError> {
        if self.input_size != feature_len {
            return Err(ConfigError::EngineInputMismatch {
                expected: feature_len,
                engine: self.input_size,
            });
        }
        if self.input_mean.len() != self.input_size {
            return Err(ConfigError::ScalerLengthMismatch {
                kind: "mean",
                expected: self.input_size,
                got: self.input_mean.len(),
            });
        }
        if self.input_std.len() != self.input_size {
            return Err(ConfigError::ScalerLengthMismatch {
                kind: "std",
                expected: self.input_size,
                got: self.input_std.len(),
            });
        }
        if let Some(labels) = &self.labels {
            if labels.len() != self.class_count {
                return Err(ConfigError::LabelCountMismatch {
                    expected: self.class_count,
                    got: labels.len(),
                });
            }
        }
        Ok(())
    }

    pub fn standardizer(&self) -> Result<Standardizer, ConfigError> {
        Standardizer::new(
            self.input_mean.clone(),
            self.input_std.clone(),
            self.input_size,
        )
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            class_count: self.class_count,
            labels: self.labels.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn settings_default_to_the_nominal_layout() {
        let settings = AppSettings::default();
        assert_eq!(settings.frame_len, 1546);
        assert_eq!(settings.feature_len, 1577);
        assert_eq!(settings.read_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn settings_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "frame_len = 64\nfeature_len = 95\nclass_count = 4\nread_timeout_ms = 50"
        )
        .unwrap();

        let settings = AppSettings::load(file.path()).unwrap();
        assert_eq!(settings.frame_len, 64);
        assert_eq!(settings.feature_len, 95);
        assert_eq!(settings.class_count, 4);
        // Unspecified fields keep their defaults.
        assert_eq!(settings.read_chunk_bytes, 1024);
    }

    #[test]
    fn unknown_settings_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "frame_size = 64").unwrap();
        assert!(matches!(
            AppSettings::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    fn sample_bundle() -> ModelFile {
        ModelFile {
            input_size: 39,
            class_count: 2,
            labels: Some(vec!["red".into(), "blue".into()]),
            input_mean: vec![0.0; 39],
            input_std: vec![1.0; 39],
        }
    }

    #[test]
    fn model_bundle_roundtrips_through_json() {
        let bundle = sample_bundle();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&bundle).unwrap().as_bytes())
            .unwrap();

        let loaded = ModelFile::load(file.path()).unwrap();
        loaded.validate(39).unwrap();
        assert_eq!(loaded.class_count, 2);
        assert_eq!(loaded.labels.as_ref().unwrap()[1], "blue");
    }

    #[test]
    fn bundle_input_size_must_match_feature_len() {
        let bundle = sample_bundle();
        assert!(matches!(
            bundle.validate(40),
            Err(ConfigError::EngineInputMismatch {
                expected: 40,
                engine: 39
            })
        ));
    }

    #[test]
    fn bundle_scaler_arrays_must_cover_every_feature() {
        let mut bundle = sample_bundle();
        bundle.input_std.pop();
        assert!(matches!(
            bundle.validate(39),
            Err(ConfigError::ScalerLengthMismatch { kind: "std", .. })
        ));
    }

    #[test]
    fn bundle_label_table_must_match_class_count() {
        let mut bundle = sample_bundle();
        bundle.labels = Some(vec!["red".into()]);
        assert!(matches!(
            bundle.validate(39),
            Err(ConfigError::LabelCountMismatch {
                expected: 2,
                got: 1
            })
        ));
    }
}
