pub mod classifier;
pub mod config;
pub mod engine;
pub mod noop;
pub mod types;

pub use classifier::{top_k, Classifier};
pub use config::ClassifierConfig;
pub use engine::{EngineError, InferenceEngine};
pub use noop::NoOpEngine;
pub use types::{Classification, ClassifyEvent};
