//! No-operation inference engine for bring-up and fallback

use crate::engine::{EngineError, InferenceEngine};

/// An engine that accepts any well-formed input and scores every class at
/// zero, so the decision is always class 0 with zero confidence.
///
/// Lets the full pipeline run end to end on hosts where no model backend is
/// compiled in.
#[derive(Debug, Clone)]
pub struct NoOpEngine {
    input_len: usize,
    output_len: usize,
}

impl NoOpEngine {
    pub fn new(input_len: usize, output_len: usize) -> Self {
        Self {
            input_len,
            output_len,
        }
    }
}

impl InferenceEngine for NoOpEngine {
    fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>, EngineError> {
        if input.len() != self.input_len {
            return Err(EngineError::InputLengthMismatch {
                expected: self.input_len,
                got: input.len(),
            });
        }
        Ok(vec![0.0; self.output_len])
    }

    fn input_len(&self) -> usize {
        self.input_len
    }

    fn output_len(&self) -> usize {
        self.output_len
    }
}
