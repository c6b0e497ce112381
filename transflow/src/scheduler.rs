use tokio::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_TEXT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_MOVE_DEBOUNCE_MS: u64 = 2_000;
pub const DEFAULT_SCROLL_DEBOUNCE_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    TextChanged,
    TextEmptied,
    WindowMoved,
    Scrolled,
    SpaceChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerAction {
    HideAll,
    ClearSpans,
    Segment,
    Reposition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub text_debounce: Duration,
    pub move_debounce: Duration,
    pub scroll_debounce: Duration,
    pub track_window_position: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            text_debounce: Duration::from_millis(DEFAULT_TEXT_DEBOUNCE_MS),
            move_debounce: Duration::from_millis(DEFAULT_MOVE_DEBOUNCE_MS),
            scroll_debounce: Duration::from_millis(DEFAULT_SCROLL_DEBOUNCE_MS),
            track_window_position: true,
        }
    }
}

#[derive(Debug)]
pub struct UpdateScheduler {
    config: SchedulerConfig,
    text_deadline: Option<Instant>,
    move_deadline: Option<Instant>,
    scroll_deadline: Option<Instant>,
    // Set by a space change; repositioning stays off until the next segment pass.
    suspended: bool,
}

impl UpdateScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            text_deadline: None,
            move_deadline: None,
            scroll_deadline: None,
            suspended: false,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn on_trigger(&mut self, trigger: Trigger, now: Instant) -> Vec<SchedulerAction> {
        match trigger {
            Trigger::TextChanged => {
                self.text_deadline = Some(now + self.config.text_debounce);
                Vec::new()
            }
            Trigger::TextEmptied => {
                self.text_deadline = None;
                vec![SchedulerAction::HideAll, SchedulerAction::ClearSpans]
            }
            Trigger::WindowMoved => {
                if !self.config.track_window_position {
                    debug!("window tracking disabled; ignoring move");
                    return Vec::new();
                }
                self.move_deadline = Some(now + self.config.move_debounce);
                vec![SchedulerAction::HideAll]
            }
            Trigger::Scrolled => {
                self.scroll_deadline = Some(now + self.config.scroll_debounce);
                vec![SchedulerAction::HideAll]
            }
            Trigger::SpaceChanged => {
                self.suspended = true;
                vec![SchedulerAction::HideAll]
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [self.text_deadline, self.move_deadline, self.scroll_deadline]
            .into_iter()
            .flatten()
            .min()
    }

    pub fn poll_due(&mut self, now: Instant) -> Vec<SchedulerAction> {
        let mut actions = Vec::new();

        if take_due(&mut self.text_deadline, now) {
            self.suspended = false;
            actions.push(SchedulerAction::Segment);
        }

        let moved = take_due(&mut self.move_deadline, now);
        let scrolled = take_due(&mut self.scroll_deadline, now);
        if moved || scrolled {
            if self.suspended {
                debug!("reposition skipped while hidden after space change");
            } else if actions.is_empty() {
                actions.push(SchedulerAction::Reposition);
            }
            // A segment pass in the same tick already resolves fresh rectangles.
        }

        actions
    }
}

fn take_due(deadline: &mut Option<Instant>, now: Instant) -> bool {
    match deadline {
        Some(at) if *at <= now => {
            *deadline = None;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn text_change_waits_for_quiet_period_and_resets() {
        let start = Instant::now();
        let mut scheduler = UpdateScheduler::new(SchedulerConfig::default());

        assert!(scheduler.on_trigger(Trigger::TextChanged, start).is_empty());
        assert!(scheduler.on_trigger(Trigger::TextChanged, start + ms(300)).is_empty());
        assert!(scheduler.poll_due(start + ms(600)).is_empty());
        assert_eq!(scheduler.next_deadline(), Some(start + ms(800)));
        assert_eq!(
            scheduler.poll_due(start + ms(800)),
            vec![SchedulerAction::Segment]
        );
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn window_move_hides_immediately_and_repositions_after_two_seconds() {
        let start = Instant::now();
        let mut scheduler = UpdateScheduler::new(SchedulerConfig::default());

        assert_eq!(
            scheduler.on_trigger(Trigger::WindowMoved, start),
            vec![SchedulerAction::HideAll]
        );
        scheduler.on_trigger(Trigger::WindowMoved, start + ms(1_500));
        assert!(scheduler.poll_due(start + ms(2_000)).is_empty());
        assert_eq!(
            scheduler.poll_due(start + ms(3_500)),
            vec![SchedulerAction::Reposition]
        );
    }

    #[test]
    fn scroll_uses_its_own_shorter_deadline() {
        let start = Instant::now();
        let mut scheduler = UpdateScheduler::new(SchedulerConfig::default());
        scheduler.on_trigger(Trigger::WindowMoved, start);
        scheduler.on_trigger(Trigger::Scrolled, start);

        assert_eq!(scheduler.next_deadline(), Some(start + ms(1_000)));
        assert_eq!(
            scheduler.poll_due(start + ms(1_000)),
            vec![SchedulerAction::Reposition]
        );
        assert_eq!(scheduler.next_deadline(), Some(start + ms(2_000)));
    }

    #[test]
    fn overlapping_triggers_keep_independent_deadlines() {
        let start = Instant::now();
        let mut scheduler = UpdateScheduler::new(SchedulerConfig::default());
        scheduler.on_trigger(Trigger::WindowMoved, start);
        scheduler.on_trigger(Trigger::TextChanged, start + ms(100));

        assert_eq!(
            scheduler.poll_due(start + ms(600)),
            vec![SchedulerAction::Segment]
        );
        assert_eq!(
            scheduler.poll_due(start + ms(2_000)),
            vec![SchedulerAction::Reposition]
        );
    }

    #[test]
    fn simultaneous_expiry_prefers_segment() {
        let start = Instant::now();
        let mut scheduler = UpdateScheduler::new(SchedulerConfig::default());
        scheduler.on_trigger(Trigger::Scrolled, start);
        scheduler.on_trigger(Trigger::TextChanged, start + ms(500));
        assert_eq!(
            scheduler.poll_due(start + ms(1_000)),
            vec![SchedulerAction::Segment]
        );
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn space_change_keeps_decorations_hidden_until_text_changes() {
        let start = Instant::now();
        let mut scheduler = UpdateScheduler::new(SchedulerConfig::default());
        scheduler.on_trigger(Trigger::Scrolled, start);
        assert_eq!(
            scheduler.on_trigger(Trigger::SpaceChanged, start + ms(10)),
            vec![SchedulerAction::HideAll]
        );
        assert!(scheduler.poll_due(start + ms(1_000)).is_empty());
        assert!(scheduler.is_suspended());

        scheduler.on_trigger(Trigger::TextChanged, start + ms(1_100));
        assert_eq!(
            scheduler.poll_due(start + ms(1_600)),
            vec![SchedulerAction::Segment]
        );
        assert!(!scheduler.is_suspended());
    }

    #[test]
    fn emptied_text_clears_and_cancels_pending_segment() {
        let start = Instant::now();
        let mut scheduler = UpdateScheduler::new(SchedulerConfig::default());
        scheduler.on_trigger(Trigger::TextChanged, start);
        assert_eq!(
            scheduler.on_trigger(Trigger::TextEmptied, start + ms(100)),
            vec![SchedulerAction::HideAll, SchedulerAction::ClearSpans]
        );
        assert!(scheduler.poll_due(start + ms(1_000)).is_empty());
    }

    #[test]
    fn window_moves_are_ignored_without_tracking() {
        let start = Instant::now();
        let mut scheduler = UpdateScheduler::new(SchedulerConfig {
            track_window_position: false,
            ..SchedulerConfig::default()
        });
        assert!(scheduler.on_trigger(Trigger::WindowMoved, start).is_empty());
        assert_eq!(scheduler.next_deadline(), None);
    }
}
