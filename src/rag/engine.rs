//! Request orchestration.
//!
//! One call per chat request, after authentication: record the query,
//! enhance it, retrieve courses, assemble the prompt, complete, record the
//! answer, and hand summarization to a detached task. Step failures are
//! caught here and surface as one generic error; details go to the log.

use std::sync::Arc;
use std::time::Duration;

use crate::core::config::RagSettings;
use crate::core::errors::{ApiError, GENERIC_FAILURE};
use crate::history::{ChatHistory, ConversationStore, Role};
use crate::llm::{CompletionProvider, GenerationConfig};

use super::context_builder::PromptAssembler;
use super::enhancer::QueryEnhancer;
use super::retriever::Retriever;

pub struct RagEngine {
    history: Arc<dyn ConversationStore>,
    completion: Arc<dyn CompletionProvider>,
    enhancer: QueryEnhancer,
    retriever: Retriever,
    assembler: PromptAssembler,
    settings: RagSettings,
}

impl RagEngine {
    pub fn new(
        history: Arc<dyn ConversationStore>,
        completion: Arc<dyn CompletionProvider>,
        enhancer: QueryEnhancer,
        retriever: Retriever,
        assembler: PromptAssembler,
        settings: RagSettings,
    ) -> Self {
        RagEngine {
            history,
            completion,
            enhancer,
            retriever,
            assembler,
            settings,
        }
    }

    /// Handles one authenticated chat request. Never propagates internal
    /// error detail to the caller.
    pub async fn handle(&self, user_id: &str, query: &str) -> Result<String, ApiError> {
        match self.answer(user_id, query).await {
            Ok(response) => Ok(response),
            Err(err) => {
                tracing::error!(user_id, "chat request failed: {}", err);
                Err(ApiError::Internal(GENERIC_FAILURE.to_string()))
            }
        }
    }

    async fn answer(&self, user_id: &str, query: &str) -> Result<String, ApiError> {
        self.history.append(user_id, Role::User, query).await?;

        let history = self.history.read(user_id).await?;

        let enhanced = self.enhancer.enhance(query, &history).await;
        if self.settings.log_enhanced_query {
            tracing::info!(user_id, query = %enhanced, "retrieving courses");
        } else {
            tracing::info!(user_id, query, "retrieving courses");
        }

        let docs = self.retriever.retrieve(&enhanced, self.settings.top_k).await?;
        tracing::debug!(user_id, retrieved = docs.len(), "assembling prompt");

        let prompt = self.assembler.assemble(query, &docs, &history);

        let answer_config = GenerationConfig::answer();
        let generate = self.completion.generate(
            &prompt,
            Some(&self.settings.system_instruction),
            &answer_config,
        );
        let response = tokio::time::timeout(self.request_timeout(), generate)
            .await
            .map_err(|_| ApiError::Internal("completion timed out".to_string()))??;

        self.history.append(user_id, Role::Bot, &response).await?;

        self.spawn_summarization(user_id);

        Ok(response)
    }

    /// Fire-and-forget: the response is already determined, and a lost
    /// summarization pass only delays compaction to a later request.
    fn spawn_summarization(&self, user_id: &str) {
        let history = Arc::clone(&self.history);
        let completion = Arc::clone(&self.completion);
        let threshold = self.settings.summarize_threshold;
        let timeout = self.request_timeout();
        let user = user_id.to_string();

        tokio::spawn(async move {
            if let Err(err) =
                summarize_if_needed(history, completion, threshold, timeout, &user).await
            {
                tracing::warn!(user_id = %user, "history summarization failed: {}", err);
            }
        });
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.request_timeout_secs)
    }
}

/// Compacts the user's history into a summary once it crosses the
/// configured threshold.
async fn summarize_if_needed(
    history: Arc<dyn ConversationStore>,
    completion: Arc<dyn CompletionProvider>,
    threshold: usize,
    timeout: Duration,
    user_id: &str,
) -> Result<(), ApiError> {
    let current = history.read(user_id).await?;
    if current.turns.len() < threshold {
        return Ok(());
    }

    let conversation = render_turns(&current);
    let prompt = format!(
        "Summarize the following conversation in a concise manner:\n\n{conversation}\n\nSummary:"
    );

    let summary_config = GenerationConfig::summary();
    let generate = completion.generate(&prompt, None, &summary_config);
    let summary = tokio::time::timeout(timeout, generate)
        .await
        .map_err(|_| ApiError::Internal("summarization timed out".to_string()))??;

    history.compact(user_id, summary.trim()).await?;
    tracing::info!(user_id, "chat history compacted");

    Ok(())
}

fn render_turns(history: &ChatHistory) -> String {
    history
        .turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.message))
        .collect::<Vec<_>>()
        .join("\n")
}
