use crate::config::ClassifierConfig;
use crate::engine::{EngineError, InferenceEngine};
use crate::types::Classification;
use chromad_foundation::ConfigError;

/// Drives the inference engine and reduces its output vector to a class
/// decision. The engine is injected once at construction; nothing here knows
/// what is behind it.
pub struct Classifier {
    engine: Box<dyn InferenceEngine>,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(
        engine: Box<dyn InferenceEngine>,
        config: ClassifierConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if engine.output_len() != config.class_count {
            return Err(ConfigError::EngineOutputMismatch {
                expected: config.class_count,
                engine: engine.output_len(),
            });
        }
        Ok(Self { engine, config })
    }

    pub fn input_len(&self) -> usize {
        self.engine.input_len()
    }

    pub fn class_count(&self) -> usize {
        self.config.class_count
    }

    /// Classify one standardized feature vector.
    ///
    /// On engine failure the error propagates and the frame is dropped by
    /// the caller; there is no retry because the frame's raw data is already
    /// gone.
    pub fn classify(&mut self, features: &[f32]) -> Result<Classification, EngineError> {
        let output = self.engine.infer(features)?;
        if output.len() != self.config.class_count {
            return Err(EngineError::OutputLengthMismatch {
                expected: self.config.class_count,
                got: output.len(),
            });
        }

        let (class_index, confidence) = argmax(&output);

        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(ranking = ?top_k(&output, 3), "top classes for this frame");
        }

        Ok(Classification {
            class_index,
            confidence,
            label: self.config.label(class_index).map(String::from),
        })
    }
}

/// Index and value of the maximum, scanning left to right with a
/// strictly-greater comparison so the first index attaining the maximum wins
/// ties. Assumes a non-empty slice.
fn argmax(output: &[f32]) -> (usize, f32) {
    let mut best_class = 0;
    let mut best_confidence = output[0];

    for (i, &v) in output.iter().enumerate().skip(1) {
        if v > best_confidence {
            best_confidence = v;
            best_class = i;
        }
    }

    (best_class, best_confidence)
}

/// Top-k ranking for diagnostics: distinct indices in descending confidence
/// order, each pass skipping the indices already taken. Purely informational;
/// the published decision comes from `argmax` alone.
pub fn top_k(output: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut used = vec![false; output.len()];
    let mut ranked = Vec::with_capacity(k.min(output.len()));

    for _ in 0..k.min(output.len()) {
        let mut max_idx = None;
        let mut max_val = f32::NEG_INFINITY;

        for (j, &v) in output.iter().enumerate() {
            if used[j] {
                continue;
            }
            if max_idx.is_none() || v > max_val {
                max_idx = Some(j);
                max_val = v;
            }
        }

        if let Some(j) = max_idx {
            used[j] = true;
            ranked.push((j, max_val));
        }
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop::NoOpEngine;

    /// Engine returning a fixed output vector, optionally failing first.
    struct FixedEngine {
        input_len: usize,
        output: Vec<f32>,
        failures_left: usize,
    }

    impl FixedEngine {
        fn new(input_len: usize, output: Vec<f32>) -> Self {
            Self {
                input_len,
                output,
                failures_left: 0,
            }
        }
    }

    impl InferenceEngine for FixedEngine {
        fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>, EngineError> {
            if input.len() != self.input_len {
                return Err(EngineError::InputLengthMismatch {
                    expected: self.input_len,
                    got: input.len(),
                });
            }
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(EngineError::InvokeFailed("tensor arena exhausted".into()));
            }
            Ok(self.output.clone())
        }

        fn input_len(&self) -> usize {
            self.input_len
        }

        fn output_len(&self) -> usize {
            self.output.len()
        }
    }

    #[test]
    fn selects_the_highest_scoring_class() {
        let engine = FixedEngine::new(4, vec![0.1, 0.05, 0.7, 0.15]);
        let mut classifier = Classifier::new(Box::new(engine), ClassifierConfig::new(4)).unwrap();

        let result = classifier.classify(&[0.0; 4]).unwrap();
        assert_eq!(result.class_index, 2);
        assert!((result.confidence - 0.7).abs() < 1e-6);
        assert_eq!(result.label, None);
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        let engine = FixedEngine::new(4, vec![0.2, 0.9, 0.9, 0.1]);
        let mut classifier = Classifier::new(Box::new(engine), ClassifierConfig::new(4)).unwrap();

        let result = classifier.classify(&[0.0; 4]).unwrap();
        assert_eq!(result.class_index, 1);
    }

    #[test]
    fn labels_are_attached_when_configured() {
        let engine = FixedEngine::new(2, vec![0.3, 0.6]);
        let config = ClassifierConfig::with_labels(2, vec!["red".into(), "blue".into()]);
        let mut classifier = Classifier::new(Box::new(engine), config).unwrap();

        let result = classifier.classify(&[0.0; 2]).unwrap();
        assert_eq!(result.label.as_deref(), Some("blue"));
    }

    #[test]
    fn engine_failure_propagates() {
        let mut engine = FixedEngine::new(2, vec![0.5, 0.5]);
        engine.failures_left = 1;
        let mut classifier = Classifier::new(Box::new(engine), ClassifierConfig::new(2)).unwrap();

        assert!(matches!(
            classifier.classify(&[0.0; 2]),
            Err(EngineError::InvokeFailed(_))
        ));
        // The next frame goes through; the failure was local to one frame.
        assert!(classifier.classify(&[0.0; 2]).is_ok());
    }

    #[test]
    fn engine_output_size_must_match_class_count() {
        let engine = FixedEngine::new(2, vec![0.5, 0.5, 0.0]);
        assert!(matches!(
            Classifier::new(Box::new(engine), ClassifierConfig::new(2)),
            Err(ConfigError::EngineOutputMismatch {
                expected: 2,
                engine: 3
            })
        ));
    }

    #[test]
    fn top_k_holds_distinct_indices_in_descending_order() {
        let ranked = top_k(&[0.1, 0.9, 0.9, 0.4], 3);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].0, 1);
        assert_eq!(ranked[1].0, 2);
        assert_eq!(ranked[2].0, 3);

        let indices: Vec<usize> = ranked.iter().map(|&(i, _)| i).collect();
        let mut deduped = indices.clone();
        deduped.dedup();
        assert_eq!(indices, deduped, "no index may appear twice");
    }

    #[test]
    fn top_k_is_capped_at_the_class_count() {
        let ranked = top_k(&[0.3, 0.7], 5);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0], (1, 0.7));
        assert_eq!(ranked[1], (0, 0.3));
    }

    #[test]
    fn noop_engine_always_decides_class_zero() {
        let mut classifier =
            Classifier::new(Box::new(NoOpEngine::new(8, 3)), ClassifierConfig::new(3)).unwrap();
        let result = classifier.classify(&[0.0; 8]).unwrap();
        assert_eq!(result.class_index, 0);
        assert_eq!(result.confidence, 0.0);
    }
}
