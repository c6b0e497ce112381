use serde::{Deserialize, Serialize};

use crate::segment::TextRange;

pub const REASONABLE_LINE_HEIGHT: f64 = 35.0;
pub const MAX_ORIGIN_DRIFT: f64 = 5.0;
pub const MAX_HEIGHT_DRIFT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub width: f64,
    pub height: f64,
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self {
            width: 1440.0,
            height: 900.0,
        }
    }
}

pub trait BoundsProvider {
    fn bounds_for_range(&self, range: TextRange) -> Option<Rect>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateMapper;

impl CoordinateMapper {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve<P>(&self, provider: &P, range: TextRange, screen: ScreenGeometry) -> Option<Rect>
    where
        P: BoundsProvider + ?Sized,
    {
        let full = provider.bounds_for_range(range)?;
        let corrected = if range.length >= 1 {
            match provider.bounds_for_range(range.first_unit()) {
                Some(probe) => Self::correct(full, probe),
                None => full,
            }
        } else {
            full
        };
        Some(Self::flip(corrected, screen))
    }

    pub fn correct(full: Rect, probe: Rect) -> Rect {
        let needs_correction = full.height > REASONABLE_LINE_HEIGHT
            || (full.y - probe.y).abs() > MAX_ORIGIN_DRIFT
            || (full.height - probe.height).abs() > MAX_HEIGHT_DRIFT;
        if !needs_correction {
            return full;
        }

        Rect {
            x: full.x,
            y: probe.y,
            width: full.width,
            height: probe.height,
        }
    }

    /// Accessibility space (top-left origin) to display space (bottom-left).
    pub fn flip(rect: Rect, screen: ScreenGeometry) -> Rect {
        Rect {
            y: screen.height - rect.y - rect.height,
            ..rect
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeBounds {
        rects: HashMap<TextRange, Rect>,
        queries: RefCell<Vec<TextRange>>,
    }

    impl BoundsProvider for FakeBounds {
        fn bounds_for_range(&self, range: TextRange) -> Option<Rect> {
            self.queries.borrow_mut().push(range);
            self.rects.get(&range).copied()
        }
    }

    const SCREEN: ScreenGeometry = ScreenGeometry {
        width: 1000.0,
        height: 800.0,
    };

    #[test]
    fn tall_range_takes_vertical_geometry_from_probe() {
        let mut bounds = FakeBounds::default();
        bounds
            .rects
            .insert(TextRange::new(10, 5), Rect::new(100.0, 200.0, 80.0, 60.0));
        bounds
            .rects
            .insert(TextRange::new(10, 1), Rect::new(100.0, 222.0, 14.0, 16.0));

        let rect = CoordinateMapper::new()
            .resolve(&bounds, TextRange::new(10, 5), SCREEN)
            .expect("range should resolve");

        assert_eq!(rect.x, 100.0);
        assert_eq!(rect.width, 80.0);
        assert_eq!(rect.height, 16.0);
        assert_eq!(rect.y, 800.0 - 222.0 - 16.0);
    }

    #[test]
    fn consistent_single_line_range_is_only_flipped() {
        let full = Rect::new(10.0, 50.0, 120.0, 18.0);
        let probe = Rect::new(10.0, 52.0, 9.0, 17.0);
        assert_eq!(CoordinateMapper::correct(full, probe), full);

        let flipped = CoordinateMapper::flip(full, SCREEN);
        assert_eq!(flipped.y, 732.0);
        assert_eq!(flipped.x, full.x);
        assert_eq!(flipped.height, full.height);
    }

    #[test]
    fn origin_or_height_drift_triggers_correction() {
        let probe = Rect::new(0.0, 40.0, 9.0, 18.0);
        let drifted = Rect::new(0.0, 47.0, 50.0, 18.0);
        assert_eq!(CoordinateMapper::correct(drifted, probe).y, 40.0);

        let taller = Rect::new(0.0, 40.0, 50.0, 30.0);
        assert_eq!(CoordinateMapper::correct(taller, probe).height, 18.0);
    }

    #[test]
    fn failed_full_query_yields_none_and_failed_probe_keeps_full_rect() {
        let mut bounds = FakeBounds::default();
        let mapper = CoordinateMapper::new();
        assert!(mapper.resolve(&bounds, TextRange::new(0, 3), SCREEN).is_none());

        bounds
            .rects
            .insert(TextRange::new(0, 3), Rect::new(5.0, 10.0, 30.0, 50.0));
        let rect = mapper
            .resolve(&bounds, TextRange::new(0, 3), SCREEN)
            .expect("full range resolves");
        assert_eq!(rect.height, 50.0);
        assert_eq!(rect.y, 740.0);
    }

    #[test]
    fn empty_range_skips_the_probe() {
        let mut bounds = FakeBounds::default();
        bounds
            .rects
            .insert(TextRange::new(4, 0), Rect::new(1.0, 2.0, 0.0, 16.0));
        let _ = CoordinateMapper::new().resolve(&bounds, TextRange::new(4, 0), SCREEN);
        assert_eq!(bounds.queries.borrow().len(), 1);
    }
}
