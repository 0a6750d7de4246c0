// Shared system prompts for the two kinds of generation call.
// Task-specific prompt templates live in screening/prompts.rs.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for short free-text answers.
pub const NARRATIVE_SYSTEM: &str = "You are an expert HR analyst and technical recruiter. \
    Answer with plain text only, exactly in the format the user asks for. \
    Do NOT use markdown, bullet points, or surrounding quotes. \
    Do NOT add preambles such as \"Here is\".";
