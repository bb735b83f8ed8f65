//! Prompt and response-schema builder for transcript purification.
//!
//! The system instruction fixes five editorial rules: high-fidelity repair,
//! no summarising, remove only disfluencies/repetitions/typos, keep the
//! output at 85–95 % of the input length, and prefer the user's hints for
//! names and terminology.  The prompt carries the raw transcript and the
//! hints.

use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// System instruction
// ---------------------------------------------------------------------------

const SYSTEM_INSTRUCTION: &str = "\
You are an expert editor who cleans up speech-to-text (STT) transcripts.

Your mission:
1. High-fidelity repair: turn the messy STT transcript into clear, fluent written text while preserving the original meaning and detail to the greatest possible extent.
2. Never summarise: your job is to repair errors, not to condense. Do not compress several paragraphs into one sentence. Unless it is a repeated verbal tic, never delete the speaker's arguments, examples or details.
3. Remove impurities only: strip meaningless filler words (呃、啊、然后、那个、就是、其实; um, uh, like, you know, so, basically), repeated words, and obvious transcription typos.
4. Polishing standard: keeping the original meaning and tone, lightly adjust word order for written reading. The purified text must stay between 85% and 95% of the original length.
5. Names and terminology: prefer the user-supplied hints when correcting personal names, proper nouns, terminology or specific logic.

Output JSON:
{
  \"purifiedText\": \"the complete purified text (keep paragraphs distinct; headings only guide, never replace content)\",
  \"corrections\": [{\"original\": \"erroneous source text\", \"corrected\": \"revised text\", \"reason\": \"why it was changed\"}],
  \"uncertainParts\": [\"ambiguous fragments you were not sure about\"]
}";

/// Substituted when the user supplied no hints.
const NO_HINTS: &str = "No specific hints.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the `(system_instruction, prompt)` pair and the JSON response
/// schema for a purify call.
///
/// ```rust
/// use transcript_purifier::llm::PromptBuilder;
///
/// let (system, prompt) = PromptBuilder::new().build("um so the the plan", "");
/// assert!(system.contains("Never summarise"));
/// assert!(prompt.contains("the the plan"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the system instruction and the user prompt.
    pub fn build(&self, raw: &str, hints: &str) -> (String, String) {
        let hints = match hints.trim() {
            "" => NO_HINTS,
            h => h,
        };

        let prompt = format!(
            "[Original transcript (purify with high fidelity, keep every detail)]:\n{raw}\n\n\
             [User hints (highest-priority correction reference)]:\n{hints}\n"
        );

        (SYSTEM_INSTRUCTION.to_string(), prompt)
    }

    /// JSON schema constraining the response to the `PurificationResult`
    /// shape, in the Generative Language API's OpenAPI subset.
    pub fn response_schema(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "purifiedText": { "type": "STRING" },
                "corrections": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "original":  { "type": "STRING" },
                            "corrected": { "type": "STRING" },
                            "reason":    { "type": "STRING" }
                        },
                        "required": ["original", "corrected", "reason"]
                    }
                },
                "uncertainParts": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }
            },
            "required": ["purifiedText", "corrections", "uncertainParts"]
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
