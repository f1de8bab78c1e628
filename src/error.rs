use thiserror::Error;

/// Outline response could not be turned into structured segments. Fatal to
/// the run since the segment count depends on it.
#[derive(Debug, Error)]
#[error("failed to parse outline response as JSON: {source}\nraw response:\n{raw}")]
pub struct PlanningError {
    pub raw: String,
    #[source]
    pub source: serde_json::Error,
}

/// A segment's script yielded zero recoverable dialogue lines after every
/// extraction strategy. Carries a bounded prefix of the offending text.
#[derive(Debug, Error)]
#[error("no dialogue lines could be recovered from script:\n{prefix}")]
pub struct DialogueParseError {
    pub prefix: String,
}

impl DialogueParseError {
    pub fn new(raw: &str) -> Self {
        let prefix: String = raw.chars().take(500).collect();
        Self { prefix }
    }
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("speech API rate limit hit")]
    RateLimited,

    #[error("speech request timed out")]
    Timeout,

    #[error("connection to speech API failed: {0}")]
    ConnectionFailed(String),

    #[error("speech API error {status}: {body}")]
    Other { status: u16, body: String },
}

/// A persisted segment artifact could not be decoded during final
/// concatenation. Names the segment so the broken file can be inspected.
#[derive(Debug, Error)]
#[error("failed to decode audio for segment {segment}: {reason}")]
pub struct AssemblyError {
    pub segment: usize,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialogue_parse_error_bounds_prefix() {
        let raw = "x".repeat(2000);
        let err = DialogueParseError::new(&raw);
        assert_eq!(err.prefix.chars().count(), 500);
    }

    #[test]
    fn test_synthesis_error_display() {
        let err = SynthesisError::Other {
            status: 500,
            body: "server melted".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("server melted"));
    }
}
