pub mod profile;

use serde::Serialize;

use crate::utils::Utf16Index;
pub use profile::{LanguageProfile, language_name, normalize_language_code};

/// Half-open interval over the UTF-16 code units of one text snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TextRange {
    pub offset: usize,
    pub length: usize,
}

impl TextRange {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn intersects(&self, other: &TextRange) -> bool {
        self.offset.max(other.offset) < self.end().min(other.end())
    }

    pub fn first_unit(&self) -> TextRange {
        TextRange::new(self.offset, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Sentence,
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub range: TextRange,
    pub kind: SpanKind,
}

pub fn segment(text: &str, profile: &LanguageProfile) -> Vec<Span> {
    if text.is_empty() {
        return Vec::new();
    }

    let index = Utf16Index::new(text);
    let mut spans = scan_sentences(text, profile, &index);
    let words = collect_words(text, profile, &index)
        .into_iter()
        .filter(|word| !spans.iter().any(|sentence| sentence.range.intersects(&word.range)))
        .collect::<Vec<_>>();
    spans.extend(words);
    spans
}

pub fn scan_words(text: &str, profile: &LanguageProfile) -> Vec<Span> {
    if text.is_empty() {
        return Vec::new();
    }
    let index = Utf16Index::new(text);
    collect_words(text, profile, &index)
}

fn collect_words(text: &str, profile: &LanguageProfile, index: &Utf16Index) -> Vec<Span> {
    profile
        .word_regex()
        .find_iter(text)
        .map(|found| {
            let offset = index.utf16_at(found.start());
            let end = index.utf16_at(found.end());
            Span {
                text: found.as_str().to_string(),
                range: TextRange::new(offset, end - offset),
                kind: SpanKind::Word,
            }
        })
        .collect()
}

#[derive(Default)]
struct SentenceScanner {
    start: Option<usize>,
    paren_depth: usize,
    quote_open: bool,
    // A terminator was seen while nested; the sentence ends once the
    // enclosing delimiter closes.
    deferred_end: bool,
}

impl SentenceScanner {
    fn balanced(&self) -> bool {
        self.paren_depth == 0 && !self.quote_open
    }
}

fn scan_sentences(text: &str, profile: &LanguageProfile, index: &Utf16Index) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut scanner = SentenceScanner::default();

    for (byte_index, ch) in text.char_indices() {
        let after = byte_index + ch.len_utf8();

        if profile.is_open_paren(ch) {
            scanner.paren_depth += 1;
        } else if profile.is_close_paren(ch) {
            scanner.paren_depth = scanner.paren_depth.saturating_sub(1);
            close_deferred(text, index, &mut scanner, after, &mut spans);
        } else if profile.is_quote(ch) {
            scanner.quote_open = !scanner.quote_open;
            close_deferred(text, index, &mut scanner, after, &mut spans);
        } else if profile.is_terminator(ch) {
            if scanner.balanced() {
                if let Some(start) = scanner.start.take() {
                    push_sentence(text, index, start, byte_index, &mut spans);
                }
                scanner.deferred_end = false;
            } else if scanner.start.is_some() {
                scanner.deferred_end = true;
            }
        } else if scanner.start.is_none() && profile.is_letter(ch) {
            scanner.start = Some(byte_index);
        }
    }

    if let Some(start) = scanner.start.take() {
        push_sentence(text, index, start, text.len(), &mut spans);
    }

    spans
}

fn close_deferred(
    text: &str,
    index: &Utf16Index,
    scanner: &mut SentenceScanner,
    end: usize,
    spans: &mut Vec<Span>,
) {
    if !scanner.deferred_end || !scanner.balanced() {
        return;
    }
    scanner.deferred_end = false;
    if let Some(start) = scanner.start.take() {
        push_sentence(text, index, start, end, spans);
    }
}

fn push_sentence(
    text: &str,
    index: &Utf16Index,
    start: usize,
    end: usize,
    spans: &mut Vec<Span>,
) {
    let raw = &text[start..end];
    let body = raw.trim();
    if body.is_empty() {
        return;
    }

    let leading = raw.len() - raw.trim_start().len();
    let body_start = start + leading;
    let offset = index.utf16_at(body_start);
    let end_units = index.utf16_at(body_start + body.len());
    spans.push(Span {
        text: body.to_string(),
        range: TextRange::new(offset, end_units - offset),
        kind: SpanKind::Sentence,
    });
}
