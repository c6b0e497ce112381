use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::geometry::{BoundsProvider, Rect};
use crate::input::{ElementHandle, TextSource, TextSourceError, splice_utf16, validate_replacement};
use crate::segment::TextRange;
use crate::utils::is_cjk;

pub const FILE_SOURCE_APP_ID: &str = "transflow.file";
const ORIGIN_X: f64 = 80.0;
const ORIGIN_Y: f64 = 120.0;
const CELL_WIDTH: f64 = 8.0;
const LINE_HEIGHT: f64 = 18.0;
const DEFAULT_VISIBLE_LINES: usize = 40;

pub struct FileTextSource {
    path: PathBuf,
    element_id: u64,
    text: String,
    readable: bool,
    visible_lines: usize,
}

impl FileTextSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let element_id = path
            .to_string_lossy()
            .bytes()
            .fold(0_u64, |hash, byte| hash.wrapping_mul(31).wrapping_add(u64::from(byte)));
        Self {
            path,
            element_id,
            text: String::new(),
            readable: true,
            visible_lines: DEFAULT_VISIBLE_LINES,
        }
    }

    pub fn with_visible_lines(mut self, visible_lines: usize) -> Self {
        self.visible_lines = visible_lines.max(1);
        self
    }

    fn cells(&self, range: TextRange) -> Option<Vec<(usize, usize, usize)>> {
        let mut cells = Vec::new();
        let mut units = 0_usize;
        let mut line = 0_usize;
        let mut column = 0_usize;

        for ch in self.text.chars() {
            if units >= range.end() {
                break;
            }
            let width = if is_cjk(ch) { 2 } else { 1 };
            if units >= range.offset {
                cells.push((line, column, width));
            }
            units += ch.len_utf16();
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += width;
            }
        }

        if units < range.end() {
            return None;
        }
        Some(cells)
    }
}

impl BoundsProvider for FileTextSource {
    fn bounds_for_range(&self, range: TextRange) -> Option<Rect> {
        let cells = self.cells(range)?;
        let (first_line, _, _) = *cells.first()?;
        let last_line = cells.iter().map(|(line, _, _)| *line).max()?;
        if last_line >= self.visible_lines {
            return None;
        }

        let left = cells.iter().map(|(_, column, _)| *column).min()?;
        let right = cells
            .iter()
            .map(|(_, column, width)| column + width)
            .max()?;
        let lines = last_line - first_line + 1;

        Some(Rect::new(
            ORIGIN_X + left as f64 * CELL_WIDTH,
            ORIGIN_Y + first_line as f64 * LINE_HEIGHT,
            (right - left) as f64 * CELL_WIDTH,
            lines as f64 * LINE_HEIGHT,
        ))
    }
}

impl TextSource for FileTextSource {
    fn current_text(&mut self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                if !self.readable {
                    info!(path = %self.path.display(), "watched file is readable again");
                }
                self.readable = true;
                self.text = text;
                Some(self.text.clone())
            }
            Err(err) => {
                if self.readable {
                    warn!(path = %self.path.display(), "failed to read watched file: {err}");
                }
                self.readable = false;
                self.text.clear();
                None
            }
        }
    }

    fn current_element(&self) -> Option<ElementHandle> {
        self.readable.then(|| ElementHandle {
            app_id: FILE_SOURCE_APP_ID.to_string(),
            element_id: self.element_id,
        })
    }

    fn replace_text(&mut self, range: TextRange, text: &str) -> Result<(), TextSourceError> {
        let replacement = validate_replacement(text)?;
        if !self.readable {
            return Err(TextSourceError::Unavailable);
        }
        let updated = splice_utf16(&self.text, range, &replacement).ok_or(
            TextSourceError::RangeOutOfBounds {
                offset: range.offset,
                length: range.length,
            },
        )?;
        fs::write(&self.path, &updated)?;
        self.text = updated;
        Ok(())
    }
}
