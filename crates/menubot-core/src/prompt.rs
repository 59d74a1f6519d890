//! System prompt assembly.
//!
//! The domain prompt (persona, task, constraints, knowledge) is owned by
//! the deployment: a `prompt.md` in the data directory overrides the
//! built-in default. The dynamic `<context>` block carrying the caller's
//! name and location is appended at request time.

/// Sentinel used when the caller supplied no usable location.
pub const UNKNOWN_LOCATION: &str = "unknown";

/// Built-in fallback persona used when no `prompt.md` override exists.
const DEFAULT_SYSTEM_PROMPT: &str = "\
<role>
You are the friendly AI assistant for a restaurant brand. Your tone is
warm, enthusiastic, and concise.
</role>

<task>
- Answer menu questions by category.
- Provide branch locations when the city is known.
- Explain how to order (hotline or website only).
- Do NOT take orders, track deliveries, or book tables.
</task>

<constraints>
- Never dump the full menu; list categories first.
- If the caller's location is unknown, ask for their city before listing branches.
- Keep responses short (under 3 sentences).
</constraints>";

/// A reusable system-prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    base: String,
}

impl PromptTemplate {
    /// Wrap a deployment-provided domain prompt.
    pub fn new(base: String) -> Self {
        Self { base }
    }

    /// Render the full system prompt for one request.
    pub fn render(&self, user_name: &str, location: &str) -> String {
        format!(
            "{}\n\n<context>\nUser Name: {}\nLocation: {}\n</context>",
            self.base, user_name, location
        )
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT.to_string())
    }
}

/// Normalize an optional location to the `"unknown"` sentinel.
///
/// Both absence and an empty/whitespace-only string collapse to the
/// sentinel before reaching the model.
pub fn normalize_location(location: Option<&str>) -> String {
    match location {
        Some(loc) if !loc.trim().is_empty() => loc.trim().to_string(),
        _ => UNKNOWN_LOCATION.to_string(),
    }
}
