use serde::{Deserialize, Serialize};

/// Sampling parameters for a completion call. `None` leaves the backend's
/// default in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<i64>,
    pub max_tokens: Option<i32>,
}

impl GenerationConfig {
    /// Configuration for query rewriting: deterministic and short.
    pub fn enhancement() -> Self {
        GenerationConfig {
            temperature: Some(0.1),
            top_p: None,
            top_k: None,
            max_tokens: Some(128),
        }
    }

    /// Configuration for user-facing answers.
    pub fn answer() -> Self {
        GenerationConfig {
            temperature: Some(0.7),
            top_p: None,
            top_k: None,
            max_tokens: Some(1024),
        }
    }

    /// Configuration for history summarization.
    pub fn summary() -> Self {
        GenerationConfig {
            temperature: Some(0.3),
            top_p: None,
            top_k: None,
            max_tokens: Some(512),
        }
    }
}
