// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to every system prompt whose output is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Tiny prompt used by the connectivity probe.
pub const PROBE_SYSTEM: &str = "You are a terse assistant. Answer in one short sentence.";
pub const PROBE_PROMPT: &str = "Reply with the words: resume optimizer online.";
