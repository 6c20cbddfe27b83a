use async_trait::async_trait;

use crate::core::errors::ApiError;

use super::types::GenerationConfig;

/// Text completion capability. The system instruction travels separately
/// from the prompt body; backends that support a dedicated system field use
/// it, others may prepend it.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logs (e.g. "gemini").
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
        config: &GenerationConfig,
    ) -> Result<String, ApiError>;
}

/// Embedding capability.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}
