use crate::error::DialogueParseError;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
}

pub const SPEAKER_HOST: &str = "HOST";
pub const SPEAKER_EXPERT: &str = "EXPERT";

/// Pulls the contents of a fenced code block out of `s` if one exists,
/// preferring a block tagged ```json over a bare ``` block. Returns the
/// trimmed input when there is no fence.
pub fn strip_code_blocks(s: &str) -> String {
    if let Some(start) = s.find("```json") {
        let rest = &s[start + 7..];
        let end = rest.find("```").unwrap_or(rest.len());
        return rest[..end].trim().to_string();
    }
    if let Some(start) = s.find("```") {
        let rest = &s[start + 3..];
        let end = rest.find("```").unwrap_or(rest.len());
        return rest[..end].trim().to_string();
    }
    s.trim().to_string()
}

/// Removes non-printable control characters while keeping newlines, carriage
/// returns and tabs. LLMs occasionally emit stray control bytes that break
/// serde_json.
fn strip_control_chars(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

fn normalize_smart_quotes(s: &str) -> String {
    s.replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
}

fn parse_json_lines(s: &str) -> Option<Vec<DialogueLine>> {
    serde_json::from_str::<Vec<DialogueLine>>(s).ok()
}

/// Recovers an ordered dialogue from a raw generated script.
///
/// Strategies, each tried only when the previous fails:
/// 1. strip fencing and control characters, parse as a JSON array
/// 2. normalize smart quotes, parse again
/// 3. line-oriented scan for speaker/text field markers and `HOST:` /
///    `EXPERT:` prefixes
///
/// Empty-text lines are dropped. Fails only when no strategy recovers a
/// single line.
pub fn extract(raw_text: &str) -> Result<Vec<DialogueLine>, DialogueParseError> {
    let cleaned = strip_control_chars(&strip_code_blocks(raw_text));

    let parsed = parse_json_lines(&cleaned)
        .or_else(|| parse_json_lines(&normalize_smart_quotes(&cleaned)))
        .unwrap_or_else(|| scan_lines(&cleaned));

    let lines: Vec<DialogueLine> = parsed
        .into_iter()
        .filter(|l| !l.text.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(DialogueParseError::new(raw_text));
    }
    Ok(lines)
}

/// Last-resort recovery: walk the script line by line, treating speaker
/// markers as turn boundaries and accumulating everything in between.
fn scan_lines(text: &str) -> Vec<DialogueLine> {
    let text_field = Regex::new(r#""text"\s*:\s*"(.+)""#).expect("valid regex");

    let mut dialogue = Vec::new();
    let mut current_speaker: Option<String> = None;
    let mut current_text = String::new();

    let flush = |speaker: &mut Option<String>, text: &mut String, out: &mut Vec<DialogueLine>| {
        if let Some(s) = speaker.take() {
            let t = text.trim();
            if !t.is_empty() {
                out.push(DialogueLine {
                    speaker: s,
                    text: t.to_string(),
                });
            }
        }
        text.clear();
    };

    for raw_line in text.lines() {
        let line = raw_line.trim();

        if line.contains("\"speaker\"") && line.contains("\"HOST\"") {
            flush(&mut current_speaker, &mut current_text, &mut dialogue);
            current_speaker = Some(SPEAKER_HOST.to_string());
        } else if line.contains("\"speaker\"") && line.contains("\"EXPERT\"") {
            flush(&mut current_speaker, &mut current_text, &mut dialogue);
            current_speaker = Some(SPEAKER_EXPERT.to_string());
        } else if line.contains("\"text\"") {
            if let Some(caps) = text_field.captures(line) {
                current_text = caps[1].to_string();
            }
        } else if let Some(rest) = line.strip_prefix("HOST:") {
            flush(&mut current_speaker, &mut current_text, &mut dialogue);
            current_speaker = Some(SPEAKER_HOST.to_string());
            current_text = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("EXPERT:") {
            flush(&mut current_speaker, &mut current_text, &mut dialogue);
            current_speaker = Some(SPEAKER_EXPERT.to_string());
            current_text = rest.trim().to_string();
        } else if current_speaker.is_some()
            && !line.is_empty()
            && !line.chars().all(|c| "{}[],\"".contains(c))
        {
            // Continuation of the current turn.
            if !current_text.is_empty() {
                current_text.push(' ');
            }
            current_text.push_str(line);
        }
    }

    flush(&mut current_speaker, &mut current_text, &mut dialogue);
    dialogue
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(speaker: &str, text: &str) -> DialogueLine {
        DialogueLine {
            speaker: speaker.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("json"), "json");
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("  ```json  \n  {}  \n  ```  "), "{}");
        // Prose around the fence is discarded too.
        assert_eq!(
            strip_code_blocks("Here you go:\n```json\n[1]\n```\nEnjoy!"),
            "[1]"
        );
    }

    #[test]
    fn test_extract_clean_json_is_idempotent() {
        let lines = vec![
            line(SPEAKER_HOST, "So what is this about?"),
            line(SPEAKER_EXPERT, "Glad you asked."),
        ];
        let serialized = serde_json::to_string(&lines).unwrap();
        assert_eq!(extract(&serialized).unwrap(), lines);
    }

    #[test]
    fn test_extract_fenced_json() {
        let raw = "```json\n[{\"speaker\":\"HOST\",\"text\":\"hi\"}]\n```";
        assert_eq!(extract(raw).unwrap(), vec![line(SPEAKER_HOST, "hi")]);
    }

    #[test]
    fn test_extract_recovers_from_smart_quotes() {
        let raw = "[{\u{201C}speaker\u{201D}: \u{201C}HOST\u{201D}, \u{201C}text\u{201D}: \u{201C}hello\u{201D}}]";
        let lines = extract(raw).unwrap();
        assert_eq!(lines, vec![line(SPEAKER_HOST, "hello")]);
    }

    #[test]
    fn test_extract_strips_control_chars() {
        let raw = "[{\"speaker\":\"EXPERT\",\"text\":\"fine\u{0007}\"}]";
        let lines = extract(raw).unwrap();
        assert_eq!(lines[0].text, "fine");
    }

    #[test]
    fn test_extract_line_prefix_fallback() {
        let raw = "HOST: hello there\nEXPERT: let's begin\n";
        assert_eq!(
            extract(raw).unwrap(),
            vec![
                line(SPEAKER_HOST, "hello there"),
                line(SPEAKER_EXPERT, "let's begin"),
            ]
        );
    }

    #[test]
    fn test_extract_field_marker_fallback() {
        // Broken JSON (trailing comma debris) that still carries the fields.
        let raw = r#"
        {
            "speaker": "HOST",
            "text": "what happened next?",,
        }
        {
            "speaker": "EXPERT",
            "text": "quite a lot, actually",,
        }
        "#;
        let lines = extract(raw).unwrap();
        assert_eq!(
            lines,
            vec![
                line(SPEAKER_HOST, "what happened next?"),
                line(SPEAKER_EXPERT, "quite a lot, actually"),
            ]
        );
    }

    #[test]
    fn test_extract_prefix_turn_spanning_lines() {
        let raw = "EXPERT: the first thing to know\nis that it never stops\nHOST: wow\n";
        let lines = extract(raw).unwrap();
        assert_eq!(
            lines,
            vec![
                line(SPEAKER_EXPERT, "the first thing to know is that it never stops"),
                line(SPEAKER_HOST, "wow"),
            ]
        );
    }

    #[test]
    fn test_extract_drops_empty_text_lines() {
        let raw = r#"[{"speaker":"HOST","text":"  "},{"speaker":"EXPERT","text":"kept"}]"#;
        let lines = extract(raw).unwrap();
        assert_eq!(lines, vec![line(SPEAKER_EXPERT, "kept")]);
    }

    #[test]
    fn test_extract_failure_carries_bounded_prefix() {
        let raw = format!("no dialogue here at all {}", "x".repeat(1000));
        let err = extract(&raw).unwrap_err();
        assert!(err.prefix.starts_with("no dialogue here"));
        assert!(err.prefix.chars().count() <= 500);
    }

    #[test]
    fn test_extract_preserves_unknown_speaker() {
        // Unknown tags are kept; voice routing decides what to do with them.
        let raw = r#"[{"speaker":"GUEST","text":"surprise"}]"#;
        let lines = extract(raw).unwrap();
        assert_eq!(lines[0].speaker, "GUEST");
    }
}
