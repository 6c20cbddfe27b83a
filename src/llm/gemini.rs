//! Gemini REST provider.
//!
//! Implements both capabilities against the Generative Language API:
//! `models/{model}:generateContent` for completion and
//! `models/{model}:embedContent` for embeddings.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::GeminiSettings;
use crate::core::errors::ApiError;

use super::provider::{CompletionProvider, EmbeddingProvider};
use super::types::GenerationConfig;

#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    model: String,
    embedding_model: String,
    dimensionality: usize,
    api_key: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(settings: &GeminiSettings) -> Result<Self, ApiError> {
        let api_key = settings.api_key().ok_or_else(|| {
            ApiError::Internal(format!(
                "no Gemini API key in environment variable {}",
                settings.api_key_env
            ))
        })?;

        Ok(GeminiProvider {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            embedding_model: settings.embedding_model.clone(),
            dimensionality: settings.dimensionality,
            api_key,
            client: Client::new(),
        })
    }

    fn endpoint(&self, model: &str, action: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}?key={}",
            self.base_url, model, action, self.api_key
        )
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
        config: &GenerationConfig,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(&self.model, "generateContent");

        let mut body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(system) = system_instruction {
                obj.insert(
                    "systemInstruction".to_string(),
                    json!({ "parts": [{ "text": system }] }),
                );
            }

            let mut generation = serde_json::Map::new();
            if let Some(t) = config.temperature {
                generation.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = config.top_p {
                generation.insert("topP".to_string(), json!(t));
            }
            if let Some(t) = config.top_k {
                generation.insert("topK".to_string(), json!(t));
            }
            if let Some(t) = config.max_tokens {
                generation.insert("maxOutputTokens".to_string(), json!(t));
            }
            if !generation.is_empty() {
                obj.insert("generationConfig".to_string(), Value::Object(generation));
            }
        }

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Gemini generate error ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        let content = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        if content.is_empty() {
            return Err(ApiError::Internal(
                "Gemini returned an empty candidate".to_string(),
            ));
        }

        Ok(content)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = self.endpoint(&self.embedding_model, "embedContent");
        let mut embeddings = Vec::with_capacity(inputs.len());

        for input in inputs {
            let body = json!({
                "content": { "parts": [{ "text": input }] },
                "taskType": "RETRIEVAL_DOCUMENT",
                "outputDimensionality": self.dimensionality,
            });

            let res = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(ApiError::internal)?;

            if !res.status().is_success() {
                let status = res.status();
                let text = res.text().await.unwrap_or_default();
                return Err(ApiError::Internal(format!(
                    "Gemini embed error ({status}): {text}"
                )));
            }

            let payload: Value = res.json().await.map_err(ApiError::internal)?;
            let values: Vec<f32> = payload["embedding"]["values"]
                .as_array()
                .map(|vals| {
                    vals.iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect()
                })
                .unwrap_or_default();

            if values.is_empty() {
                return Err(ApiError::Internal(
                    "Gemini returned an empty embedding".to_string(),
                ));
            }

            embeddings.push(values);
        }

        Ok(embeddings)
    }
}
