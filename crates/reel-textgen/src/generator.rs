//! Gemini client for overlay text variations.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{TextGenError, TextGenResult};

/// Abstract text-variation capability.
///
/// Contract: returns exactly `count` strings; the first element equals
/// `base_text` byte-for-byte; elements are non-empty. `context`, when
/// present, conditions the variation style and is passed through verbatim
/// by callers.
#[async_trait]
pub trait TextVariationGenerator: Send + Sync {
    async fn generate_variations(
        &self,
        base_text: &str,
        count: u32,
        context: Option<&str>,
    ) -> TextGenResult<Vec<String>>;
}

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: String,
    /// Model name
    pub model: String,
    /// API base URL (overridable for tests)
    pub base_url: String,
}

impl GeminiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> TextGenResult<Self> {
        Ok(Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .map_err(|_| TextGenError::config_error("GEMINI_API_KEY not set"))?,
            model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        })
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Gemini-backed variation generator.
pub struct GeminiGenerator {
    config: GeminiConfig,
    client: Client,
}

impl GeminiGenerator {
    /// Create a new generator.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> TextGenResult<Self> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }

    fn build_prompt(base_text: &str, count: u32, context: Option<&str>) -> String {
        let mut prompt = format!(
            "You are an expert social media content creator specializing in short-form \
             video content. Given the base text below, generate {} creative and distinct \
             variations that maintain the same core message but use different phrasings, \
             calls-to-action, or emotional tones.\n\nBase text: \"{}\"\n",
            count - 1,
            base_text
        );

        if let Some(context) = context {
            prompt.push_str(&format!(
                "\nContext: {}\nTailor the variations to match this context while \
                 maintaining the core message.\n",
                context
            ));
        }

        prompt.push_str(&format!(
            "\nRequirements:\n\
             - Keep variations concise (suitable for video overlays, max 10-15 words)\n\
             - Maintain the original intent and context\n\
             - Vary the phrasing and calls-to-action significantly\n\
             - Make them suitable for social media engagement\n\n\
             Generate exactly {} variations, one per line, without numbering or bullet \
             points:",
            count - 1
        ));

        prompt
    }
}

#[async_trait]
impl TextVariationGenerator for GeminiGenerator {
    async fn generate_variations(
        &self,
        base_text: &str,
        count: u32,
        context: Option<&str>,
    ) -> TextGenResult<Vec<String>> {
        if count <= 1 {
            return Ok(vec![base_text.to_string()]);
        }

        info!(count, "Generating text variations");
        if let Some(context) = context {
            debug!(context = context, "Using variation context");
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::build_prompt(base_text, count, context),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TextGenError::request_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TextGenError::request_failed(format!(
                "Gemini returned {}",
                response.status()
            )));
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| TextGenError::malformed(e.to_string()))?;

        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| TextGenError::malformed("no candidate text in response"))?;

        let mut variations: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        // Pad or trim to exactly count - 1, then put the base text first.
        let wanted = (count - 1) as usize;
        variations.truncate(wanted);
        while variations.len() < wanted {
            variations.push(base_text.to_string());
        }

        let mut result = Vec::with_capacity(count as usize);
        result.push(base_text.to_string());
        result.extend(variations);

        debug!(generated = result.len(), "Text variations ready");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gemini_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] }
            }]
        })
    }

    async fn generator_for(server: &MockServer) -> GeminiGenerator {
        GeminiGenerator::new(
            GeminiConfig {
                api_key: "test-key".into(),
                model: "gemini-2.0-flash".into(),
                base_url: server.uri(),
            },
        )
    }

    #[tokio::test]
    async fn parses_variations_and_prepends_base() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.*:generateContent$"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(gemini_body("Grab yours today\nDon't miss out")),
            )
            .mount(&server)
            .await;

        let generator = generator_for(&server).await;
        let result = generator
            .generate_variations("Buy now", 3, Some("sales"))
            .await
            .unwrap();

        assert_eq!(result, vec!["Buy now", "Grab yours today", "Don't miss out"]);
    }

    #[tokio::test]
    async fn pads_short_responses_with_base_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.*:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("Only one line")))
            .mount(&server)
            .await;

        let generator = generator_for(&server).await;
        let result = generator.generate_variations("Base", 4, None).await.unwrap();

        assert_eq!(result.len(), 4);
        assert_eq!(result[0], "Base");
        assert_eq!(result[1], "Only one line");
        assert_eq!(result[2], "Base");
    }

    #[tokio::test]
    async fn trims_overlong_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.*:generateContent$"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(gemini_body("a\nb\nc\nd\ne")),
            )
            .mount(&server)
            .await;

        let generator = generator_for(&server).await;
        let result = generator.generate_variations("Base", 3, None).await.unwrap();

        assert_eq!(result, vec!["Base", "a", "b"]);
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.*:generateContent$"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let generator = generator_for(&server).await;
        let err = generator.generate_variations("Base", 3, None).await.unwrap_err();
        assert!(matches!(err, TextGenError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn single_count_skips_the_api() {
        // No mock server mounted: a request would fail.
        let generator = GeminiGenerator::new(GeminiConfig {
            api_key: "k".into(),
            model: "m".into(),
            base_url: "http://127.0.0.1:1".into(),
        });
        let result = generator.generate_variations("Solo", 1, None).await.unwrap();
        assert_eq!(result, vec!["Solo"]);
    }
}
