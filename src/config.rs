use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,

    #[serde(default = "default_segment_minutes")]
    pub segment_minutes: u32,

    /// Unconditional pause after every successful per-line synthesis call,
    /// to stay under upstream rate limits.
    #[serde(default = "default_api_delay")]
    pub api_delay_seconds: u64,

    /// When false the final concatenation step is skipped and the run ends
    /// with the per-segment audio files.
    #[serde(default = "default_true")]
    pub merge_segments: bool,

    pub llm: LlmConfig,

    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String, // "gemini" or "ollama"
    pub gemini: Option<GeminiConfig>,
    pub ollama: Option<OllamaConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    /// Empty key disables audio rendering entirely; the run still produces
    /// prompt templates.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_speech_base_url")]
    pub base_url: String,

    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default = "default_host_voice")]
    pub host_voice: String,

    #[serde(default = "default_expert_voice")]
    pub expert_voice: String,

    /// Sample rate of the raw PCM the speech API is asked to return.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_speech_base_url(),
            model_id: default_model_id(),
            host_voice: default_host_voice(),
            expert_voice: default_expert_voice(),
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_output() -> String {
    "output".to_string()
}
fn default_words_per_minute() -> u32 {
    155
}
fn default_segment_minutes() -> u32 {
    4
}
fn default_api_delay() -> u64 {
    2
}
fn default_true() -> bool {
    true
}
fn default_speech_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}
fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}
fn default_host_voice() -> String {
    // Rachel
    "21m00Tcm4TlvDq8ikWAM".to_string()
}
fn default_expert_voice() -> String {
    // Drew
    "29vD33N1CtxCmqQRPOHJ".to_string()
}
fn default_sample_rate() -> u32 {
    24000
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Path::new("config.yml");
        if !path.exists() {
            anyhow::bail!("config.yml not found. Please create one.");
        }

        let content = fs::read_to_string(path).context("Failed to read config.yml")?;
        let config: Config =
            serde_yaml_ng::from_str(&content).context("Failed to parse config.yml")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write("config.yml", content).context("Failed to write config.yml")?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(self.prompts_dir())?;
        fs::create_dir_all(self.temp_dir())?;
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_folder)
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.output_dir().join("prompts")
    }

    /// Scratch directory for per-line audio, cleared once segments are folded.
    pub fn temp_dir(&self) -> PathBuf {
        self.output_dir().join("temp")
    }

    pub fn speech_enabled(&self) -> bool {
        !self.speech.api_key.is_empty()
    }
}
