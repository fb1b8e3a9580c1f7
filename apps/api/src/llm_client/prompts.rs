// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for all interview question generation calls.
pub const INTERVIEWER_SYSTEM: &str = "You are a professional technical interviewer \
    conducting a live interview. \
    You MUST respond with exactly ONE interview question and nothing else. \
    No lists, no numbering, no preamble, no assessment commentary. \
    The question must end with a question mark.";
