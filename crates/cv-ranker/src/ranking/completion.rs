//! Text-completion service seam shared by requirement enrichment and the fairness audit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::CompletionConfig;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion service returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("could not decode completion reply: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    #[serde(rename = "num_predict")]
    pub max_tokens: u32,
}

/// One non-streaming generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerationOptions,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            options,
        }
    }
}

/// External model used for enrichment and audit. Implementations must not apply their own
/// deadline; callers bound every call.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for an Ollama-compatible `/api/generate` endpoint.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// `base_url` should look like `http://localhost:11434`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &CompletionConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(url = %url, model = %request.model, "requesting completion");
        let resp = self.client.post(&url).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let reply: GenerateResponse =
            serde_json::from_str(&body).map_err(|err| CompletionError::Decode(err.to_string()))?;
        Ok(reply.response)
    }
}

/// First balanced `{...}` in `text`, or `None`.
///
/// Braces inside JSON strings, including escaped quotes, do not count toward the balance. A `{`
/// that never closes is skipped and the scan resumes at the next one. Only the first balanced
/// object is returned even when it fails to parse later.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(found) = text[from..].find('{') {
        let start = from + found;
        if let Some(end) = balanced_end(&text[start..]) {
            return Some(&text[start..start + end]);
        }
        from = start + 1;
    }
    None
}

/// Byte length of the object opening at the start of `text`, if it closes.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_generate_shape() {
        let request = CompletionRequest::new(
            "mistral",
            "hello",
            GenerationOptions {
                temperature: 0.5,
                max_tokens: 800,
            },
        );
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "model": "mistral",
                "prompt": "hello",
                "stream": false,
                "options": {"temperature": 0.5, "num_predict": 800}
            })
        );
    }

    #[test]
    fn finds_first_balanced_object() {
        let reply = "Sure! Here you go:\n{\"a\": {\"b\": 1}} and also {\"c\": 2}";
        assert_eq!(extract_json_object(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let reply = r#"{"note": "use } and { freely \" }", "n": 1} trailing"#;
        assert_eq!(
            extract_json_object(reply),
            Some(r#"{"note": "use } and { freely \" }", "n": 1}"#)
        );
    }

    #[test]
    fn unbalanced_or_missing_object_is_none() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{\"open\": [1, 2"), None);
    }

    #[test]
    fn unclosed_brace_in_prose_does_not_hide_later_object() {
        let reply = "Note: the { character is special.\n{\"skills\": [\"rust\"]}";
        assert_eq!(extract_json_object(reply), Some("{\"skills\": [\"rust\"]}"));

        let nested = "{ broken {\"a\": 1} tail";
        assert_eq!(extract_json_object(nested), Some("{\"a\": 1}"));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        assert_eq!(OllamaClient::new("http://localhost:11434/").base_url(), "http://localhost:11434");
    }
}
