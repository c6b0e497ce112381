use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::decoration::{Decoration, DecorationKey};
use crate::geometry::Rect;
use crate::segment::Span;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileDiff {
    pub creates: Vec<Decoration>,
    pub updates: Vec<Decoration>,
    pub removes: Vec<DecorationKey>,
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub dropped: usize,
}

impl ReconcileDiff {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.removes.is_empty()
    }

    pub fn stats(&self) -> ReconcileStats {
        ReconcileStats {
            created: self.creates.len(),
            updated: self.updates.len(),
            removed: self.removes.len(),
            dropped: self.dropped,
        }
    }
}

/// Diffs the displayed decorations against freshly resolved spans.
pub fn reconcile<F>(
    previous: &HashMap<DecorationKey, Decoration>,
    spans: &[Span],
    mut resolve: F,
) -> ReconcileDiff
where
    F: FnMut(&Span) -> Option<Rect>,
{
    let mut diff = ReconcileDiff::default();
    let mut touched = HashSet::with_capacity(spans.len());

    for span in spans {
        let key = DecorationKey::from_range(span.range);
        if touched.contains(&key) {
            continue;
        }

        let Some(rect) = resolve(span) else {
            diff.dropped += 1;
            continue;
        };

        let decoration = Decoration {
            key: key.clone(),
            range: span.range,
            rect,
            text: span.text.clone(),
            kind: span.kind,
        };
        if previous.contains_key(&key) {
            diff.updates.push(decoration);
        } else {
            diff.creates.push(decoration);
        }
        touched.insert(key);
    }

    let mut removes = previous
        .keys()
        .filter(|key| !touched.contains(*key))
        .cloned()
        .collect::<Vec<_>>();
    removes.sort();
    diff.removes = removes;
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{SpanKind, TextRange};

    fn span(offset: usize, text: &str) -> Span {
        Span {
            text: text.to_string(),
            range: TextRange::new(offset, text.chars().count()),
            kind: SpanKind::Sentence,
        }
    }

    fn rect_for(span: &Span) -> Option<Rect> {
        Some(Rect::new(span.range.offset as f64 * 10.0, 0.0, 20.0, 16.0))
    }

    fn applied(diff: &ReconcileDiff) -> HashMap<DecorationKey, Decoration> {
        diff.creates
            .iter()
            .chain(diff.updates.iter())
            .map(|decoration| (decoration.key.clone(), decoration.clone()))
            .collect()
    }

    #[test]
    fn first_pass_creates_everything() {
        let spans = vec![span(0, "你好"), span(3, "世界")];
        let diff = reconcile(&HashMap::new(), &spans, rect_for);
        assert_eq!(diff.creates.len(), 2);
        assert!(diff.updates.is_empty());
        assert!(diff.removes.is_empty());
        assert_eq!(diff.creates[0].key.as_str(), "0-2");
    }

    #[test]
    fn second_pass_over_same_spans_is_all_updates() {
        let spans = vec![span(0, "你好"), span(3, "世界")];
        let first = reconcile(&HashMap::new(), &spans, rect_for);
        let second = reconcile(&applied(&first), &spans, rect_for);
        assert!(second.creates.is_empty());
        assert!(second.removes.is_empty());
        assert_eq!(second.updates.len(), 2);
    }

    #[test]
    fn unresolvable_span_is_dropped_and_its_decoration_removed() {
        let spans = vec![span(0, "你好"), span(3, "世界")];
        let first = reconcile(&HashMap::new(), &spans, rect_for);

        let second = reconcile(&applied(&first), &spans, |span: &Span| {
            if span.range.offset == 3 {
                None
            } else {
                rect_for(span)
            }
        });
        assert!(second.creates.is_empty());
        assert_eq!(second.updates.len(), 1);
        assert_eq!(second.removes, vec![DecorationKey::from_range(TextRange::new(3, 2))]);
        assert_eq!(second.dropped, 1);
    }

    #[test]
    fn vanished_and_new_spans_split_into_removes_and_creates() {
        let first = reconcile(&HashMap::new(), &[span(0, "你好")], rect_for);
        let second = reconcile(&applied(&first), &[span(5, "再见")], rect_for);
        assert_eq!(second.creates.len(), 1);
        assert_eq!(second.removes.len(), 1);
        assert_eq!(second.removes[0].as_str(), "0-2");
        assert_eq!(
            second.stats(),
            ReconcileStats {
                created: 1,
                updated: 0,
                removed: 1,
                dropped: 0
            }
        );
    }

    #[test]
    fn duplicate_keys_are_processed_once() {
        let spans = vec![span(0, "你好"), span(0, "你好")];
        let diff = reconcile(&HashMap::new(), &spans, rect_for);
        assert_eq!(diff.creates.len(), 1);
    }
}
