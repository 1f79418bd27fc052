//! Tolerant JSON extraction from generated text.
//!
//! Text-generation output is asked to be raw JSON but frequently arrives
//! wrapped in a Markdown code fence. [`extract_json`] strips one leading fence
//! marker (with or without a language tag) and one trailing fence marker, then
//! parses what is left. Anything that still fails to parse is an error; there
//! is no partial result.

use serde::de::DeserializeOwned;

/// The Markdown code fence marker.
const FENCE: &str = "```";

/// Errors produced while extracting JSON from generated text.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Nothing left to parse after trimming and fence removal.
    #[error("generated content is empty")]
    Empty,

    /// The remaining text is not the expected JSON document.
    #[error("generated content is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Removes a surrounding Markdown code fence, if any.
///
/// The opening fence may carry a language tag (```` ```json ````); the closing
/// fence is only removed at the very end of the text. Inner fences are left
/// untouched.
///
/// # Examples
///
/// ```
/// use curio_course::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fence("```{\"a\": 1}```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
/// ```
#[must_use]
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }

    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }

    text.trim()
}

/// Parses generated text as a JSON document of type `T`.
///
/// # Errors
///
/// Returns [`ExtractError::Empty`] when nothing remains after fence removal
/// and [`ExtractError::Malformed`] when the remainder does not deserialize.
pub fn extract_json<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}
