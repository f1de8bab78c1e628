use crate::config::SpeechConfig;
use crate::error::SynthesisError;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Opaque text-to-audio capability. `synthesize` returns raw PCM for one
/// utterance in one voice; `synthesize_bulk` hands the whole show to the
/// provider in a single request and returns whatever container it produces.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SynthesisError>;
    async fn synthesize_bulk(&self, text: &str) -> Result<Vec<u8>, SynthesisError>;
}

pub struct ElevenLabsClient {
    api_key: String,
    base_url: String,
    model_id: String,
    sample_rate: u32,
    client: reqwest::Client,
}

impl ElevenLabsClient {
    pub fn new(config: &SpeechConfig) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SynthesisError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_id: config.model_id.clone(),
            sample_rate: config.sample_rate,
            client,
        })
    }

    fn classify_transport_error(e: reqwest::Error) -> SynthesisError {
        if e.is_timeout() {
            SynthesisError::Timeout
        } else if e.is_connect() {
            SynthesisError::ConnectionFailed(e.to_string())
        } else {
            SynthesisError::Other {
                status: 0,
                body: e.to_string(),
            }
        }
    }

    async fn classify_status(resp: reqwest::Response) -> Result<Vec<u8>, SynthesisError> {
        let status = resp.status();
        if status.is_success() {
            let bytes = resp
                .bytes()
                .await
                .map_err(Self::classify_transport_error)?;
            return Ok(bytes.to_vec());
        }
        if status.as_u16() == 429 {
            return Err(SynthesisError::RateLimited);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(SynthesisError::Other {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SynthesisError> {
        let url = format!(
            "{}/v1/text-to-speech/{}?output_format=pcm_{}",
            self.base_url, voice_id, self.sample_rate
        );

        let payload = json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
                "style": 0.0,
                "use_speaker_boost": true
            }
        });

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        Self::classify_status(resp).await
    }

    async fn synthesize_bulk(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let url = format!("{}/v1/text-to-speech/podcast", self.base_url);

        let payload = json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75
            }
        });

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        Self::classify_status(resp).await
    }
}
