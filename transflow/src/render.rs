use std::collections::HashSet;

use tracing::info;

use crate::decoration::{Decoration, DecorationKey};
use crate::geometry::ScreenGeometry;
use crate::translation::TranslationState;

pub trait Renderer {
    fn screen_geometry(&self) -> ScreenGeometry;
    fn show_decoration(&mut self, decoration: &Decoration);
    fn hide_decoration(&mut self, key: &DecorationKey);
    fn hide_all(&mut self);
    fn show_translation(&mut self, key: &DecorationKey, state: &TranslationState);
}

pub struct LogRenderer {
    screen: ScreenGeometry,
    underline_color: String,
    visible: HashSet<DecorationKey>,
}

impl LogRenderer {
    pub fn new(screen: ScreenGeometry, underline_color: impl Into<String>) -> Self {
        Self {
            screen,
            underline_color: underline_color.into(),
            visible: HashSet::new(),
        }
    }
}

impl Renderer for LogRenderer {
    fn screen_geometry(&self) -> ScreenGeometry {
        self.screen
    }

    fn show_decoration(&mut self, decoration: &Decoration) {
        self.visible.insert(decoration.key.clone());
        info!(
            key = decoration.key.as_str(),
            x = decoration.rect.x,
            y = decoration.rect.y,
            width = decoration.rect.width,
            height = decoration.rect.height,
            color = self.underline_color.as_str(),
            "underline {}",
            decoration.text
        );
    }

    fn hide_decoration(&mut self, key: &DecorationKey) {
        self.visible.remove(key);
        info!(key = key.as_str(), "underline removed");
    }

    fn hide_all(&mut self) {
        if !self.visible.is_empty() {
            info!(count = self.visible.len(), "all underlines hidden");
        }
        self.visible.clear();
    }

    fn show_translation(&mut self, key: &DecorationKey, state: &TranslationState) {
        match state {
            TranslationState::Pending => info!(key = key.as_str(), "translating..."),
            TranslationState::Ready(text) => info!(key = key.as_str(), "translation: {text}"),
            TranslationState::Failed(reason) => {
                info!(key = key.as_str(), "translation failed: {reason}")
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Default)]
    pub struct RecordingRenderer {
        pub log: Vec<String>,
        pub visible: std::collections::HashMap<DecorationKey, Decoration>,
        pub popups: Vec<(DecorationKey, TranslationState)>,
    }

    impl Renderer for RecordingRenderer {
        fn screen_geometry(&self) -> ScreenGeometry {
            ScreenGeometry {
                width: 1000.0,
                height: 800.0,
            }
        }

        fn show_decoration(&mut self, decoration: &Decoration) {
            self.log.push(format!("show {}", decoration.key));
            self.visible
                .insert(decoration.key.clone(), decoration.clone());
        }

        fn hide_decoration(&mut self, key: &DecorationKey) {
            self.log.push(format!("hide {key}"));
            self.visible.remove(key);
        }

        fn hide_all(&mut self) {
            self.log.push("hide_all".to_string());
            self.visible.clear();
        }

        fn show_translation(&mut self, key: &DecorationKey, state: &TranslationState) {
            self.popups.push((key.clone(), state.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::segment::{SpanKind, TextRange};

    fn decoration(y: f64) -> Decoration {
        let range = TextRange::new(0, 2);
        Decoration {
            key: DecorationKey::from_range(range),
            range,
            rect: Rect::new(0.0, y, 20.0, 16.0),
            text: "你好".to_string(),
            kind: SpanKind::Sentence,
        }
    }

    #[test]
    fn log_renderer_counts_each_key_once() {
        let mut renderer = LogRenderer::new(ScreenGeometry::default(), "#FF9500");
        renderer.show_decoration(&decoration(10.0));
        renderer.show_decoration(&decoration(40.0));
        assert_eq!(renderer.visible.len(), 1);

        renderer.hide_decoration(&DecorationKey::from_range(TextRange::new(0, 2)));
        renderer.hide_decoration(&DecorationKey::from_range(TextRange::new(0, 2)));
        assert_eq!(renderer.visible.len(), 0);

        renderer.show_decoration(&decoration(10.0));
        renderer.hide_all();
        assert_eq!(renderer.visible.len(), 0);
    }
}
