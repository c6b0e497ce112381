mod reconciler;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::geometry::Rect;
use crate::render::Renderer;
use crate::segment::{SpanKind, TextRange};
pub use reconciler::{ReconcileDiff, ReconcileStats, reconcile};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DecorationKey(String);

impl DecorationKey {
    pub fn from_range(range: TextRange) -> Self {
        Self(format!("{}-{}", range.offset, range.length))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (offset, length) = raw.trim().split_once('-')?;
        let offset = offset.parse::<usize>().ok()?;
        let length = length.parse::<usize>().ok()?;
        Some(Self::from_range(TextRange::new(offset, length)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DecorationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    pub key: DecorationKey,
    pub range: TextRange,
    pub rect: Rect,
    pub text: String,
    pub kind: SpanKind,
}

#[derive(Debug, Default)]
pub struct DecorationStore {
    decorations: HashMap<DecorationKey, Decoration>,
}

impl DecorationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &HashMap<DecorationKey, Decoration> {
        &self.decorations
    }

    pub fn get(&self, key: &DecorationKey) -> Option<&Decoration> {
        self.decorations.get(key)
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn apply<R>(&mut self, diff: ReconcileDiff, renderer: &mut R)
    where
        R: Renderer + ?Sized,
    {
        for key in &diff.removes {
            if self.decorations.remove(key).is_some() {
                renderer.hide_decoration(key);
            }
        }

        for decoration in diff.creates {
            renderer.show_decoration(&decoration);
            self.decorations.insert(decoration.key.clone(), decoration);
        }

        for decoration in diff.updates {
            let unchanged = self.decorations.get(&decoration.key).is_some_and(|current| {
                current.rect == decoration.rect && current.text == decoration.text
            });
            if !unchanged {
                renderer.show_decoration(&decoration);
            }
            self.decorations.insert(decoration.key.clone(), decoration);
        }
    }

    pub fn hide_all<R>(&mut self, renderer: &mut R)
    where
        R: Renderer + ?Sized,
    {
        self.decorations.clear();
        renderer.hide_all();
    }
}
