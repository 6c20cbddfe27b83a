//! Query enhancement from conversational context.
//!
//! Follow-up questions ("what about its lab?") retrieve poorly as-is. The
//! enhancer rewrites the raw query into a standalone search query using the
//! most recent turns. Enhancement is best-effort only: any failure or
//! timeout falls back to the original query.

use std::sync::Arc;
use std::time::Duration;

use crate::history::ChatHistory;
use crate::llm::{CompletionProvider, GenerationConfig};

/// Turns below this count carry no useful context to rewrite with.
const MIN_TURNS: usize = 2;

pub struct QueryEnhancer {
    completion: Arc<dyn CompletionProvider>,
    recent_turns: usize,
    timeout: Duration,
}

impl QueryEnhancer {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        recent_turns: usize,
        timeout: Duration,
    ) -> Self {
        QueryEnhancer {
            completion,
            recent_turns,
            timeout,
        }
    }

    /// Returns a retrieval-optimized query, or the original when there is
    /// not enough history or the completion backend fails.
    pub async fn enhance(&self, query: &str, history: &ChatHistory) -> String {
        if history.turns.len() < MIN_TURNS {
            return query.to_string();
        }

        let window = history
            .turns
            .iter()
            .rev()
            .take(self.recent_turns)
            .rev()
            .map(|turn| format!("{}: {}", turn.role.as_str(), turn.message))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Rewrite the student's latest question as a single standalone search \
             query for a course catalog. Fold in any courses, departments, or \
             constraints mentioned earlier in the conversation. Reply with the \
             query only.\n\nCONVERSATION:\n{window}\n\nQUESTION: {query}\n"
        );

        let config = GenerationConfig::enhancement();
        let call = self.completion.generate(&prompt, None, &config);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(enhanced)) => {
                let enhanced = enhanced.trim();
                if enhanced.is_empty() {
                    query.to_string()
                } else {
                    enhanced.to_string()
                }
            }
            Ok(Err(err)) => {
                tracing::warn!("query enhancement failed, using raw query: {}", err);
                query.to_string()
            }
            Err(_) => {
                tracing::warn!("query enhancement timed out, using raw query");
                query.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ApiError;
    use crate::history::{ChatTurn, Role};
    use async_trait::async_trait;

    struct FixedCompletion(&'static str);

    #[async_trait]
    impl CompletionProvider for FixedCompletion {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _system_instruction: Option<&str>,
            _config: &GenerationConfig,
        ) -> Result<String, ApiError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingCompletion;

    #[async_trait]
    impl CompletionProvider for FailingCompletion {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _system_instruction: Option<&str>,
            _config: &GenerationConfig,
        ) -> Result<String, ApiError> {
            Err(ApiError::ServiceUnavailable)
        }
    }

    fn turn(role: Role, message: &str) -> ChatTurn {
        ChatTurn {
            role,
            message: message.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    fn enhancer(provider: Arc<dyn CompletionProvider>) -> QueryEnhancer {
        QueryEnhancer::new(provider, 5, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn short_history_returns_query_unchanged() {
        let e = enhancer(Arc::new(FixedCompletion("rewritten")));

        let empty = ChatHistory::default();
        assert_eq!(e.enhance("what is CSEN 174?", &empty).await, "what is CSEN 174?");

        let one_turn = ChatHistory {
            turns: vec![turn(Role::User, "what is CSEN 174?")],
            summary: None,
        };
        assert_eq!(
            e.enhance("what is CSEN 174?", &one_turn).await,
            "what is CSEN 174?"
        );
    }

    #[tokio::test]
    async fn enough_history_uses_the_rewrite() {
        let e = enhancer(Arc::new(FixedCompletion("CSEN 174 prerequisites")));
        let history = ChatHistory {
            turns: vec![
                turn(Role::User, "tell me about CSEN 174"),
                turn(Role::Bot, "It covers software engineering."),
            ],
            summary: None,
        };

        assert_eq!(
            e.enhance("what are its prerequisites?", &history).await,
            "CSEN 174 prerequisites"
        );
    }

    #[tokio::test]
    async fn completion_failure_falls_back_to_raw_query() {
        let e = enhancer(Arc::new(FailingCompletion));
        let history = ChatHistory {
            turns: vec![
                turn(Role::User, "tell me about CSEN 174"),
                turn(Role::Bot, "It covers software engineering."),
            ],
            summary: None,
        };

        assert_eq!(
            e.enhance("what are its prerequisites?", &history).await,
            "what are its prerequisites?"
        );
    }
}
