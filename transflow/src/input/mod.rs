pub mod file_source;

use thiserror::Error;

use crate::geometry::BoundsProvider;
use crate::segment::TextRange;
use crate::utils::Utf16Index;

pub use file_source::FileTextSource;

pub const MAX_REPLACEMENT_LENGTH: usize = 10_000;

#[derive(Debug, Error)]
pub enum TextSourceError {
    #[error("focused element text is unavailable")]
    Unavailable,
    #[error("range {offset}+{length} is outside the current text")]
    RangeOutOfBounds { offset: usize, length: usize },
    #[error("failed to write text: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid replacement: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("text exceeds maximum length of {MAX_REPLACEMENT_LENGTH} characters")]
    TooLong,
    #[error("replacement text is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    pub app_id: String,
    pub element_id: u64,
}

pub trait TextSource: BoundsProvider {
    fn current_text(&mut self) -> Option<String>;
    fn current_element(&self) -> Option<ElementHandle>;
    fn replace_text(&mut self, range: TextRange, text: &str) -> Result<(), TextSourceError>;
}

pub fn validate_replacement(text: &str) -> Result<String, ValidationError> {
    if text.chars().count() > MAX_REPLACEMENT_LENGTH {
        return Err(ValidationError::TooLong);
    }

    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(ValidationError::Empty);
    }

    Ok(cleaned.to_string())
}

pub fn splice_utf16(text: &str, range: TextRange, replacement: &str) -> Option<String> {
    let index = Utf16Index::new(text);
    let start = index.byte_at(range.offset)?;
    let end = index.byte_at(range.end())?;

    let mut spliced = String::with_capacity(text.len() + replacement.len());
    spliced.push_str(&text[..start]);
    spliced.push_str(replacement);
    spliced.push_str(&text[end..]);
    Some(spliced)
}
