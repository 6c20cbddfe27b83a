use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{AppPaths, Settings};
use crate::core::errors::ApiError;
use crate::core::security::{init_session_token, SessionToken};
use crate::history::{ConversationStore, SqliteHistoryStore};
use crate::llm::{CompletionProvider, EmbeddingProvider, GeminiProvider};
use crate::rag::{PromptAssembler, QueryEnhancer, RagEngine, Retriever, SqliteCourseStore};

/// Shared application state. Every external capability is an injected
/// handle owned here; components receive clones at construction and no
/// module holds a global client.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Arc<Settings>,
    pub session_token: SessionToken,
    pub engine: Arc<RagEngine>,
}

impl AppState {
    pub async fn initialize() -> Result<Self, ApiError> {
        let paths = Arc::new(AppPaths::new());
        let settings = Arc::new(
            Settings::load(&paths).map_err(|e| ApiError::internal(format!("config: {e}")))?,
        );
        let session_token = init_session_token();

        let history: Arc<dyn ConversationStore> =
            Arc::new(SqliteHistoryStore::new(paths.history_db_path.clone()).await?);

        let courses = Arc::new(SqliteCourseStore::new(paths.courses_db_path.clone()).await?);

        let gemini = Arc::new(GeminiProvider::new(&settings.gemini)?);
        let completion: Arc<dyn CompletionProvider> = gemini.clone();
        let embeddings: Arc<dyn EmbeddingProvider> = gemini;

        let timeout = Duration::from_secs(settings.rag.request_timeout_secs);
        let enhancer = QueryEnhancer::new(completion.clone(), settings.rag.recent_turns, timeout);
        let retriever = Retriever::new(embeddings, courses, timeout);
        let assembler = PromptAssembler::new(
            &settings.rag.persona_label,
            settings.rag.recent_turns,
            settings.rag.max_context_chars,
        );

        let engine = Arc::new(RagEngine::new(
            history,
            completion,
            enhancer,
            retriever,
            assembler,
            settings.rag.clone(),
        ));

        Ok(AppState {
            paths,
            settings,
            session_token,
            engine,
        })
    }
}
