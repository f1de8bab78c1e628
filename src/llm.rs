use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Opaque text completion capability. One prompt in, one string out; no
/// guaranteed structure on the output.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub fn create_generator(config: &Config) -> Result<Box<dyn TextGenerator>> {
    match config.llm.provider.as_str() {
        "gemini" => {
            let cfg = config.llm.gemini.as_ref().context("Gemini config missing")?;
            Ok(Box::new(GeminiClient::new(&cfg.api_key, &cfg.model)))
        }
        "ollama" => {
            let cfg = config.llm.ollama.as_ref().context("Ollama config missing")?;
            Ok(Box::new(OllamaClient::new(&cfg.base_url, &cfg.model)))
        }
        _ => Err(anyhow!("Unknown LLM provider: {}", config.llm.provider)),
    }
}

// --- Gemini ---

#[derive(Debug)]
struct GeminiClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: String,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Gemini API error: {}", error_text));
        }

        // Keep the body around so malformed responses can be diagnosed.
        let response_text = resp.text().await?;
        let result: GeminiResponse = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                return Err(anyhow!(
                    "Failed to parse Gemini response: {}. Body: {}",
                    e,
                    response_text
                ))
            }
        };

        if let Some(err) = result.error {
            return Err(anyhow!("Gemini API returned error: {}", err.message));
        }

        if let Some(candidates) = result.candidates {
            if let Some(first) = candidates.first() {
                if let Some(content) = &first.content {
                    if let Some(part) = content.parts.first() {
                        return Ok(part.text.clone());
                    }
                }

                let reason = first.finish_reason.as_deref().unwrap_or("UNKNOWN");
                return Err(anyhow!("Gemini response empty. Finish reason: {}", reason));
            }
        }

        Err(anyhow!(
            "Gemini response format unexpected or empty. Body: {}",
            response_text
        ))
    }
}

// --- Ollama ---

#[derive(Debug)]
struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request_body = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Ollama API error: {}", error_text));
        }

        let result: OllamaResponse = resp.json().await?;
        Ok(result.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_response_parsing_safety_block() {
        // Content blocked upstream: candidate present, content missing.
        let json = r#"{
            "candidates": [
                {
                    "finishReason": "SAFETY",
                    "index": 0
                }
            ]
        }"#;

        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let candidate = &result.candidates.as_ref().unwrap()[0];

        assert!(candidate.content.is_none());
        assert_eq!(candidate.finish_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn test_gemini_response_parsing_success() {
        let json = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "Hello world" }
                        ],
                        "role": "model"
                    },
                    "finishReason": "STOP",
                    "index": 0
                }
            ]
        }"#;

        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let candidate = &result.candidates.as_ref().unwrap()[0];

        assert_eq!(candidate.content.as_ref().unwrap().parts[0].text, "Hello world");
    }

    #[test]
    fn test_ollama_response_parsing() {
        let json = r#"{"model":"llama3","response":"some text","done":true}"#;
        let result: OllamaResponse = serde_json::from_str(json).unwrap();
        assert_eq!(result.response, "some text");
    }
}
