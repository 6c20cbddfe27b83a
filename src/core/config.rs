//! Paths and typed settings.
//!
//! Settings come from a `config.yml` found via [`AppPaths`]; every field has
//! a default so the server boots with no file at all. Environment variables
//! override the file for deployment-specific values (port, API key).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub history_db_path: PathBuf,
    pub courses_db_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let data_dir = discover_data_dir(&project_root);
        let log_dir = data_dir.join("logs");
        let history_db_path = data_dir.join("advisor_history.db");
        let courses_db_path = data_dir.join("advisor_courses.db");

        for dir in [&data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            data_dir,
            log_dir,
            history_db_path,
            courses_db_path,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("ADVISOR_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        self.project_root.join("config.yml")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("ADVISOR_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

fn discover_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("ADVISOR_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return project_root.to_path_buf();
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir().join(".local/share").to_string_lossy().to_string()
    });
    PathBuf::from(xdg).join("advisor")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub rag: RagSettings,
    pub gemini: GeminiSettings,
    pub ingest: IngestSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: ServerSettings::default(),
            rag: RagSettings::default(),
            gemini: GeminiSettings::default(),
            ingest: IngestSettings::default(),
        }
    }
}

impl Settings {
    /// Loads `config.yml` if present, falling back to defaults otherwise.
    /// A malformed file is an error; a missing one is not.
    pub fn load(paths: &AppPaths) -> anyhow::Result<Self> {
        let path = paths.config_path();
        if !path.exists() {
            tracing::debug!("no config file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(&path)?;
        let settings: Settings = serde_yaml::from_str(&contents)?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings { port: 8787 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Courses retrieved per query in the interactive path.
    pub top_k: usize,
    /// Turn count at which a user's history is compacted into a summary.
    pub summarize_threshold: usize,
    /// Turns rendered into the enhancement and assembly windows.
    pub recent_turns: usize,
    /// Bound on each external completion/retrieval call.
    pub request_timeout_secs: u64,
    /// Character budget for the retrieved-documents block of the prompt.
    pub max_context_chars: usize,
    /// Log the enhanced query instead of the raw one.
    pub log_enhanced_query: bool,
    /// Persona label used for bot turns inside the prompt.
    pub persona_label: String,
    pub system_instruction: String,
}

impl Default for RagSettings {
    fn default() -> Self {
        RagSettings {
            top_k: 15,
            summarize_threshold: 20,
            recent_turns: 5,
            request_timeout_secs: 30,
            max_context_chars: 6000,
            log_enhanced_query: false,
            persona_label: "Advisor".to_string(),
            system_instruction: default_system_instruction(),
        }
    }
}

fn default_system_instruction() -> String {
    [
        "You are an academic advisor for college students.",
        "Your task is to help students find and understand relevant courses.",
        "Answer the QUERY in an informative and concise manner.",
        "Ground every statement in the facts provided in the DOCUMENTS.",
        "When referencing courses, use the format [tag-number course].",
        "If prior conversation is included, use it to resolve references in the query.",
    ]
    .join(" ")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    /// Output dimensionality requested from the embedding model.
    pub dimensionality: usize,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        GeminiSettings {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash-001".to_string(),
            embedding_model: "text-embedding-005".to_string(),
            dimensionality: 256,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl GeminiSettings {
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Course bulletin root.
    pub catalog_base_url: String,
    /// Documents per store upload batch.
    pub batch_size: usize,
    /// Attempts per embedding call before the record is skipped.
    pub embed_retries: u32,
}

impl Default for IngestSettings {
    fn default() -> Self {
        IngestSettings {
            catalog_base_url: "https://www.scu.edu/bulletin/undergraduate/".to_string(),
            batch_size: 25,
            embed_retries: 3,
        }
    }
}
