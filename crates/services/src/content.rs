//! Normalization of user-supplied post fields.

use domains::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLimits {
    pub max_title_chars: usize,
    pub max_text_chars: usize,
}

impl ContentLimits {
    pub fn title(&self, raw: &str) -> Result<String> {
        normalize("title", raw, self.max_title_chars)
    }

    pub fn text(&self, raw: &str) -> Result<String> {
        normalize("text", raw, self.max_text_chars)
    }
}

/// Rejects non-ASCII and blank input, then trims surrounding whitespace and
/// truncates to `max_chars`.
fn normalize(field: &str, raw: &str, max_chars: usize) -> Result<String> {
    if !raw.is_ascii() {
        return Err(AppError::Validation(format!(
            "{field} contains illegal characters"
        )));
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    // ASCII only past this point, so byte and char indices agree.
    Ok(trimmed[..trimmed.len().min(max_chars)].to_owned())
}
