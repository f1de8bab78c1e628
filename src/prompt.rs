use crate::outline::SegmentPlan;
use std::fmt::Write;

/// Shared register contract sent ahead of every generation instruction.
pub const STYLE_RULES: &str = r#"Use simple language: Write plainly with short sentences.

Example: "I need help with this issue."

Avoid AI-giveaway phrases: Don't use cliches like "dive into," "unleash your potential," etc.

Avoid: "Let's dive into this game-changing solution."

Use instead: "Here's how it works."

Be direct and concise: Get to the point; remove unnecessary words.

Example: "We should meet tomorrow."

Maintain a natural tone: Write as you normally speak; it's okay to start sentences with "and" or "but."

Example: "And that's why it matters."

Avoid marketing language: Don't use hype or promotional words.

Avoid: "This revolutionary product will transform your life."

Use instead: "This product can help you."

Keep it real: Be honest; don't force friendliness.

Example: "I don't think that's the best idea."

Stay away from fluff: Avoid unnecessary adjectives and adverbs.

Example: "We finished the task."

Focus on clarity: Make your message easy to understand.

Example: "Please send the file by Monday.""#;

const WRITING_GUIDELINES: &str = r#"==============================================
WRITING GUIDELINES:
==============================================

CONVERSATION STYLE:
- Two speakers: HOST (curious, non-expert) and EXPERT (knowledgeable)
- The EXPERT should speak significantly more than the HOST (EXPERT: ~90% of words, HOST: ~10%)
- The EXPERT can speak for multiple sentences at a time, giving in-depth explanations, examples, or analogies
- The HOST speaks briefly and occasionally: asks questions, seeks clarification, or reacts naturally

LANGUAGE & TONE:
- Use simple, spoken language with short sentences when needed
- Be direct, conversational, and natural
- Avoid AI cliches like "dive into," "game-changing," "unleash"
- Write as people actually speak; starting sentences with "and" or "but" is fine
- Avoid hype, marketing language, or unnecessary adjectives
- Keep it honest, real, and engaging"#;

const OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT:
Return ONLY valid JSON with the dialogue. No markdown, no explanations.
JSON format:
[
  {
    "speaker": "HOST",
    "text": "actual words spoken by the host"
  },
  {
    "speaker": "EXPERT",
    "text": "actual words spoken by the expert"
  }
]

IMPORTANT: Return ONLY the JSON array. No additional text or formatting.

=============================================="#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    Opening,
    Continuation { is_final: bool },
}

/// Builds the generation instruction for one segment. Pure function of its
/// inputs: the same segment, role and prior context always compose to the
/// same prompt.
///
/// `prior_goals` is the ordered list of learning goals of segments
/// 1..segment_number-1; it must never contain this segment's own goal.
pub fn compose(
    topic: &str,
    segment: &SegmentPlan,
    role: SegmentRole,
    prior_goals: &[String],
    target_words: u32,
    segment_number: usize,
) -> String {
    match role {
        SegmentRole::Opening => opening_prompt(topic, segment, target_words),
        SegmentRole::Continuation { is_final } => {
            continuation_prompt(topic, segment, prior_goals, target_words, segment_number, is_final)
        }
    }
}

fn opening_prompt(topic: &str, segment: &SegmentPlan, target_words: u32) -> String {
    format!(
        r#"==============================================
SEGMENT 1 - OPENING SEGMENT (WITH WELCOME)
==============================================

MAIN TOPIC:
{topic}

SEGMENT TITLE:
{title}

PREVIOUS SEGMENTS COVERED:
None - This is the opening segment

WHAT THIS SEGMENT IS ABOUT:
{summary}

LEARNING GOAL/FUN FACTS FOR THIS SEGMENT:
{goal}

ADDITIONAL NOTES / FUN FACTS TO DISCUSS:
- This is the opening of the podcast
- Include a warm, natural greeting from the HOST
- The HOST briefly introduces the topic and explains why they're curious
- The EXPERT begins exploring the first concept in depth
- Set the tone for the entire conversation

{guidelines}

TARGET:
- Approximately {target_words} words for this segment
- Do NOT include stage directions or descriptions
- Do NOT end with a conclusion; the podcast continues

{output}
"#,
        topic = topic,
        title = segment.title,
        summary = segment.summary,
        goal = segment.learning_goal,
        guidelines = WRITING_GUIDELINES,
        target_words = target_words,
        output = OUTPUT_FORMAT,
    )
}

fn continuation_prompt(
    topic: &str,
    segment: &SegmentPlan,
    prior_goals: &[String],
    target_words: u32,
    segment_number: usize,
    is_final: bool,
) -> String {
    let mut previous_summary = String::new();
    for (j, goal) in prior_goals.iter().enumerate() {
        let _ = writeln!(previous_summary, "- Segment {}: {}", j + 1, goal);
    }
    let previous_summary = previous_summary.trim_end();

    let conclusion_rule = if is_final {
        "- This is the FINAL segment: wind the conversation down and end with a short, reflective conclusion"
    } else {
        "- Do NOT end with a conclusion unless this is the final segment"
    };

    format!(
        r#"==============================================
SEGMENT {segment_number} - CONTINUATION
==============================================

MAIN TOPIC:
{topic}

SEGMENT TITLE:
{title}

PREVIOUS SEGMENTS COVERED:
{previous_summary}

WHAT THIS SEGMENT IS ABOUT:
{summary}

LEARNING GOAL FOR THIS SEGMENT:
{goal}

ADDITIONAL NOTES / FUN FACTS TO DISCUSS:
- Continue naturally from where the previous segment ended
- Explore new aspects of the topic that build on what was previously discussed
- Provide in-depth explanations, examples, stories, or analogies
- Keep the conversation flowing seamlessly

{guidelines}

CRITICAL RULES FOR CONTINUATION:
- Do NOT greet or welcome anyone (the podcast already started)
- Do NOT reintroduce the topic
- Do NOT say things like "In this segment" or "Now let's talk about"
- Continue naturally from where the previous segment ended
- This is the MIDDLE of a conversation, not the beginning
- Smoothly flow from the previous segment to the current segment
- The HOST and EXPERT are already engaged in discussion

TARGET:
- Approximately {target_words} words for this segment
- Do NOT include stage directions or descriptions
{conclusion_rule}

{output}
"#,
        segment_number = segment_number,
        topic = topic,
        title = segment.title,
        previous_summary = previous_summary,
        summary = segment.summary,
        goal = segment.learning_goal,
        guidelines = WRITING_GUIDELINES,
        target_words = target_words,
        conclusion_rule = conclusion_rule,
        output = OUTPUT_FORMAT,
    )
}
