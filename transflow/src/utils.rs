use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current time as milliseconds since Unix epoch.
pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

/// Checks if a character is a CJK (Chinese, Japanese, Korean) character.
pub fn is_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xF900..=0xFAFF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2B73F
            | 0x2B740..=0x2B81F
            | 0x2B820..=0x2CEAF
            | 0x2CEB0..=0x2EBEF
            | 0x3000..=0x303F
    )
}

/// Maps byte offsets of a `&str` to UTF-16 offsets.
pub struct Utf16Index {
    // (byte offset, utf16 offset) at every char boundary, plus the end.
    boundaries: Vec<(usize, usize)>,
}

impl Utf16Index {
    pub fn new(text: &str) -> Self {
        let mut boundaries = Vec::with_capacity(text.len() + 1);
        let mut units = 0_usize;
        for (byte_index, ch) in text.char_indices() {
            boundaries.push((byte_index, units));
            units += ch.len_utf16();
        }
        boundaries.push((text.len(), units));
        Self { boundaries }
    }

    pub fn utf16_at(&self, byte_offset: usize) -> usize {
        match self
            .boundaries
            .binary_search_by_key(&byte_offset, |(byte, _)| *byte)
        {
            Ok(index) => self.boundaries[index].1,
            // Not a boundary: round down to the char that contains it.
            Err(index) => self.boundaries[index.saturating_sub(1)].1,
        }
    }

    /// Byte offset of a UTF-16 offset, or `None` when it falls inside a
    /// surrogate pair or past the end.
    pub fn byte_at(&self, utf16_offset: usize) -> Option<usize> {
        self.boundaries
            .binary_search_by_key(&utf16_offset, |(_, units)| *units)
            .ok()
            .map(|index| self.boundaries[index].0)
    }
}
