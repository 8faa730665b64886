use serde::{Deserialize, Serialize};

/// A named field to extract, with a description that guides the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPoint {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl DataPoint {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub name: String,
    pub value: String,
    pub confidence: f64,
}

impl ExtractionResult {
    pub fn new(name: impl Into<String>, value: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            confidence,
        }
    }

    /// Confidence forced into `[0, 1]`; NaN becomes 0.
    pub fn clamped(mut self) -> Self {
        self.confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
        self
    }
}
