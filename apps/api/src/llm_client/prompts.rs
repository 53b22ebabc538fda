// Shared prompt fragments.
// Each feature that builds prompts keeps its own prompts.rs alongside it;
// this file holds the cross-cutting pieces.

/// Instruction that enforces JSON-only output. Gemini has no separate system
/// slot in our single-turn requests, so it is prepended to the prompt text.
pub const JSON_ONLY_INSTRUCTION: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
