use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine expected {expected} input values, got {got}")]
    InputLengthMismatch { expected: usize, got: usize },

    #[error("Engine returned {got} output values, expected {expected}")]
    OutputLengthMismatch { expected: usize, got: usize },

    #[error("Inference invocation failed: {0}")]
    InvokeFailed(String),
}

/// An opaque inference engine evaluating a fixed model graph.
///
/// This defines the common interface for model backends, allowing them to be
/// used interchangeably by the classifier. The engine owns its model, arena,
/// and tensors; this crate only sees a fixed-length vector in and a
/// fixed-length vector out. Invocation is synchronous and may fail with a
/// status distinct from the returned values.
pub trait InferenceEngine: Send {
    fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>, EngineError>;
    fn input_len(&self) -> usize;
    fn output_len(&self) -> usize;
}
