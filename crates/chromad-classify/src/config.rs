use chromad_foundation::ConfigError;
use serde::{Deserialize, Serialize};

/// Decision-stage configuration: how many classes the model distinguishes
/// and, optionally, a human-readable label per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub class_count: usize,
    pub labels: Option<Vec<String>>,
}

impl ClassifierConfig {
    pub fn new(class_count: usize) -> Self {
        Self {
            class_count,
            labels: None,
        }
    }

    pub fn with_labels(class_count: usize, labels: Vec<String>) -> Self {
        Self {
            class_count,
            labels: Some(labels),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.class_count == 0 {
            return Err(ConfigError::Invalid("class count must be at least 1".into()));
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

    pub fn label(&self, class_index: usize) -> Option<&str> {
        self.labels
            .as_ref()
            .and_then(|l| l.get(class_index))
            .map(String::as_str)
    }
}
