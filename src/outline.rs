use crate::dialogue::strip_code_blocks;
use crate::error::PlanningError;
use crate::llm::TextGenerator;
use crate::prompt::STYLE_RULES;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One entry of the episode outline. Produced once, immutable afterwards;
/// `index` is 1-based and fixes the conversation's temporal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPlan {
    pub index: usize,
    pub title: String,
    pub learning_goal: String,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
struct OutlineEntry {
    title: String,
    learning_goal: String,
    summary: String,
}

/// Number of segments requested from the planner. The generator is not
/// perfectly controllable, so the length of the returned outline is
/// authoritative, not this number.
pub fn segment_count(total_minutes: u32, segment_minutes: u32) -> usize {
    total_minutes.div_ceil(segment_minutes) as usize
}

pub struct OutlinePlanner<'a> {
    generator: &'a dyn TextGenerator,
}

impl<'a> OutlinePlanner<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator }
    }

    pub async fn plan(
        &self,
        topic: &str,
        total_minutes: u32,
        segment_minutes: u32,
    ) -> Result<Vec<SegmentPlan>> {
        let num_segments = segment_count(total_minutes, segment_minutes);
        let prompt = outline_prompt(topic, num_segments);

        let response = self.generator.generate(&prompt).await?;
        log::debug!("raw outline response:\n{}", response);

        let segments = parse_outline(&response)?;
        Ok(segments)
    }
}

/// Parses the outline response into ordered segment plans. The response is
/// expected to be a JSON array but may be wrapped in prose or a fenced
/// block. An unparseable outline is fatal: downstream segment count depends
/// on it, so there is no silent fallback.
pub fn parse_outline(response: &str) -> Result<Vec<SegmentPlan>, PlanningError> {
    let cleaned = strip_code_blocks(response);

    let entries: Vec<OutlineEntry> =
        serde_json::from_str(&cleaned).map_err(|source| PlanningError {
            raw: response.to_string(),
            source,
        })?;

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| SegmentPlan {
            index: i + 1,
            title: e.title,
            learning_goal: e.learning_goal,
            summary: e.summary,
        })
        .collect())
}

fn outline_prompt(topic: &str, num_segments: usize) -> String {
    format!(
        r#"{style}

Here is your job:

You are planning a SINGLE, continuous podcast episode.

TOPIC:
"{topic}"

CONVERSATION STYLE:
- Two speakers: HOST (curious, non-expert) and EXPERT (knowledgeable)
- The EXPERT should speak more than the HOST
  - Each EXPERT turn can be multiple sentences, giving in-depth explanations, examples, or analogies
- The HOST should speak briefly and occasionally
  - Mostly asks questions, seeks clarification, or reacts naturally
- Dialogue should feel like a real conversation, not a lecture or scripted reading
- Allow the EXPERT to elaborate fully on ideas without interruption
- Avoid repeating points already made
- Use natural spoken language, not academic or formal style
- Include occasional interruptions from the HOST, but only when it makes the conversation flow
- Encourage the EXPERT to explore each topic in depth

PODCAST STRUCTURE:
- The conversation is split into {num_segments} internal segments
- Each segment should focus on a single, clear idea
- Segments should flow naturally from one to the next
- First segment starts the podcast; subsequent segments continue mid-conversation
- Only the final segment includes a reflective conclusion

FOR EACH SEGMENT, RETURN:
- title: short, informal, conversational
- learning_goal: what the listener should understand after this part
- summary: 1-2 sentences describing how the HOST and EXPERT explore this idea together

OUTPUT FORMAT:
Return ONLY valid JSON. No markdown, comments, or explanations.
JSON format:
[
  {{
    "title": "...",
    "learning_goal": "...",
    "summary": "..."
  }}
]
"#,
        style = STYLE_RULES,
        topic = topic,
        num_segments = num_segments,
    )
}
