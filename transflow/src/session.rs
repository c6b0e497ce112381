use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant as StdInstant;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::decoration::{DecorationKey, DecorationStore, ReconcileStats, reconcile};
use crate::geometry::CoordinateMapper;
use crate::input::{ElementHandle, TextSource};
use crate::metrics::RuntimeMetrics;
use crate::render::Renderer;
use crate::scheduler::{SchedulerAction, Trigger, UpdateScheduler};
use crate::segment::{LanguageProfile, Span, segment};
use crate::settings::{AppSettings, InteractionMode};
use crate::state::SessionEvent;
use crate::translation::{TranslationOutcome, TranslationSlot, TranslationState, Translator};

struct CachedTranslation {
    source_text: String,
    translation: String,
}

pub struct SessionController<S, R, T> {
    source: S,
    renderer: R,
    translator: Arc<T>,
    settings: AppSettings,
    profile: LanguageProfile,
    mapper: CoordinateMapper,
    scheduler: UpdateScheduler,
    store: DecorationStore,
    spans: Vec<Span>,
    snapshot: Option<String>,
    element: Option<ElementHandle>,
    translations: HashMap<DecorationKey, CachedTranslation>,
    slot: TranslationSlot,
    outcome_tx: mpsc::UnboundedSender<TranslationOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<TranslationOutcome>,
    metrics: RuntimeMetrics,
}

impl<S, R, T> SessionController<S, R, T>
where
    S: TextSource,
    R: Renderer,
    T: Translator,
{
    pub fn new(source: S, renderer: R, translator: Arc<T>, settings: AppSettings) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            source,
            renderer,
            translator,
            profile: settings.source_profile().clone(),
            mapper: CoordinateMapper::new(),
            scheduler: UpdateScheduler::new(settings.scheduler_config()),
            store: DecorationStore::new(),
            spans: Vec::new(),
            snapshot: None,
            element: None,
            translations: HashMap::new(),
            slot: TranslationSlot::new(settings.translation_timeout()),
            outcome_tx,
            outcome_rx,
            metrics: RuntimeMetrics::new(),
            settings,
        }
    }

    pub fn decorations(&self) -> &DecorationStore {
        &self.store
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn profile(&self) -> &LanguageProfile {
        &self.profile
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn metrics(&self) -> &RuntimeMetrics {
        &self.metrics
    }

    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        let mut poll = tokio::time::interval(self.settings.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            source_language = self.profile.code(),
            target_language = self.settings.target_language.as_str(),
            mode = ?self.settings.interaction_mode,
            "session started"
        );

        loop {
            let deadline = self.scheduler.next_deadline();
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!("all session handles dropped");
                        break;
                    };
                    if !self.handle_event(event, Instant::now()) {
                        break;
                    }
                }
                Some(outcome) = self.outcome_rx.recv() => {
                    self.handle_outcome(outcome);
                }
                _ = sleep_until_deadline(deadline) => {
                    self.fire_due(Instant::now());
                }
                _ = poll.tick() => {
                    self.poll_text(Instant::now());
                }
            }
        }

        self.slot.cancel();
        self.store.hide_all(&mut self.renderer);
        match serde_json::to_string(&self.metrics.report()) {
            Ok(report) => info!(report = report.as_str(), "session stopped"),
            Err(err) => warn!("failed to serialize final performance report: {err}"),
        }
    }

    /// Handles one event. Returns `false` when the loop should stop.
    pub fn handle_event(&mut self, event: SessionEvent, now: Instant) -> bool {
        match event {
            SessionEvent::TextChanged => self.trigger(Trigger::TextChanged, now),
            SessionEvent::WindowMoved => self.trigger(Trigger::WindowMoved, now),
            SessionEvent::Scrolled => self.trigger(Trigger::Scrolled, now),
            SessionEvent::SpaceChanged => self.trigger(Trigger::SpaceChanged, now),
            SessionEvent::Hovered(key) => {
                if self.settings.interaction_mode == InteractionMode::Hover {
                    self.start_translation(key);
                }
            }
            SessionEvent::Clicked(key) => match self.settings.interaction_mode {
                InteractionMode::Click => self.start_translation(key),
                InteractionMode::Hover => self.apply_translation(key, now),
            },
            SessionEvent::ApplyTranslation(key) => self.apply_translation(key, now),
            SessionEvent::SetSourceLanguage(code) => self.set_source_language(&code, now),
            SessionEvent::ReportRequested(reply) => {
                if reply.send(self.metrics.report()).is_err() {
                    debug!("performance report requester went away");
                }
            }
            SessionEvent::Shutdown => {
                info!("session shutdown requested");
                return false;
            }
        }
        true
    }

    pub fn poll_text(&mut self, now: Instant) {
        let (text, element) = self.observe();

        if element != self.element {
            if self.element.is_some() {
                debug!("focused element changed");
                self.trigger(Trigger::TextEmptied, now);
            }
            self.element = element;
            self.snapshot = None;
        }

        match text.filter(|text| !text.is_empty()) {
            None => {
                let had_content = self.snapshot.take().is_some()
                    || !self.spans.is_empty()
                    || !self.store.is_empty();
                if had_content {
                    self.trigger(Trigger::TextEmptied, now);
                }
            }
            Some(text) => {
                if self.snapshot.as_deref() != Some(text.as_str()) {
                    self.snapshot = Some(text);
                    self.trigger(Trigger::TextChanged, now);
                }
            }
        }
    }

    pub fn fire_due(&mut self, now: Instant) {
        let actions = self.scheduler.poll_due(now);
        self.apply_actions(actions, now);
    }

    fn trigger(&mut self, trigger: Trigger, now: Instant) {
        let actions = self.scheduler.on_trigger(trigger, now);
        self.apply_actions(actions, now);
    }

    fn apply_actions(&mut self, actions: Vec<SchedulerAction>, now: Instant) {
        for action in actions {
            match action {
                SchedulerAction::HideAll => self.hide_all(),
                SchedulerAction::ClearSpans => {
                    self.spans.clear();
                    self.translations.clear();
                }
                SchedulerAction::Segment => self.segment_pass(now),
                SchedulerAction::Reposition => self.reposition_pass(),
            }
        }
    }

    fn observe(&mut self) -> (Option<String>, Option<ElementHandle>) {
        let text = self.source.current_text();
        let element = self.source.current_element();
        let skipped = element
            .as_ref()
            .is_some_and(|element| self.settings.is_skipped(&element.app_id));
        if skipped {
            debug!("focused application is skip-listed");
            return (None, element);
        }
        (text, element)
    }

    fn hide_all(&mut self) {
        self.slot.cancel();
        let removed = self.store.len();
        self.store.hide_all(&mut self.renderer);
        self.metrics.record_hide_all(removed);
    }

    fn segment_pass(&mut self, now: Instant) {
        let started = StdInstant::now();
        let (text, _) = self.observe();
        let Some(text) = text.filter(|text| !text.is_empty()) else {
            self.snapshot = None;
            self.trigger(Trigger::TextEmptied, now);
            return;
        };

        self.spans = segment(&text, &self.profile);
        self.snapshot = Some(text);
        let spans = &self.spans;
        self.translations.retain(|key, cached| {
            spans.iter().any(|span| {
                DecorationKey::from_range(span.range) == *key && span.text == cached.source_text
            })
        });

        let stats = self.reconcile_current();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.metrics.record_segment_pass(elapsed_ms, stats);
        info!(
            spans = self.spans.len(),
            created = stats.created,
            updated = stats.updated,
            removed = stats.removed,
            dropped = stats.dropped,
            elapsed_ms,
            "segment pass"
        );
    }

    fn reposition_pass(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let started = StdInstant::now();
        let stats = self.reconcile_current();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.metrics.record_reposition_pass(elapsed_ms, stats);
        debug!(
            shown = self.store.len(),
            dropped = stats.dropped,
            elapsed_ms,
            "reposition pass"
        );
    }

    fn reconcile_current(&mut self) -> ReconcileStats {
        let screen = self.renderer.screen_geometry();
        let mapper = self.mapper;
        let source = &self.source;
        let diff = reconcile(self.store.snapshot(), &self.spans, |span| {
            mapper.resolve(source, span.range, screen)
        });
        let stats = diff.stats();
        self.store.apply(diff, &mut self.renderer);
        stats
    }

    fn start_translation(&mut self, key: DecorationKey) {
        let Some(decoration) = self.store.get(&key) else {
            debug!(key = key.as_str(), "interaction with a decoration that is no longer shown");
            return;
        };

        if let Some(cached) = self
            .translations
            .get(&key)
            .filter(|cached| cached.source_text == decoration.text)
        {
            let state = TranslationState::Ready(cached.translation.clone());
            self.renderer.show_translation(&key, &state);
            return;
        }

        let text = decoration.text.clone();
        let started = self.slot.begin(
            Arc::clone(&self.translator),
            key.clone(),
            text,
            self.outcome_tx.clone(),
        );
        if started.is_some() {
            self.renderer.show_translation(&key, &TranslationState::Pending);
        }
    }

    pub(crate) fn handle_outcome(&mut self, outcome: TranslationOutcome) {
        if !self.slot.complete(&outcome) {
            debug!(key = outcome.key.as_str(), "ignoring superseded translation");
            return;
        }
        self.metrics
            .record_translation(outcome.elapsed_ms, outcome.result.as_ref().map(|_| ()));

        let still_shown = self
            .store
            .get(&outcome.key)
            .is_some_and(|decoration| decoration.text == outcome.source_text);

        match outcome.result {
            Ok(translation) => {
                if !still_shown {
                    return;
                }
                let state = TranslationState::Ready(translation.clone());
                self.renderer.show_translation(&outcome.key, &state);
                self.translations.insert(
                    outcome.key,
                    CachedTranslation {
                        source_text: outcome.source_text,
                        translation,
                    },
                );
            }
            Err(err) => {
                warn!(key = outcome.key.as_str(), "translation failed: {err}");
                if still_shown {
                    let state = TranslationState::Failed(err.to_string());
                    self.renderer.show_translation(&outcome.key, &state);
                }
            }
        }
    }

    fn apply_translation(&mut self, key: DecorationKey, now: Instant) {
        let Some(decoration) = self.store.get(&key) else {
            debug!(key = key.as_str(), "apply requested for a decoration that is gone");
            return;
        };
        let Some(cached) = self
            .translations
            .get(&key)
            .filter(|cached| cached.source_text == decoration.text)
        else {
            debug!(key = key.as_str(), "no finished translation to apply");
            return;
        };

        let range = decoration.range;
        let translation = cached.translation.clone();
        match self.source.replace_text(range, &translation) {
            Ok(()) => {
                info!(key = key.as_str(), "replaced span with its translation");
                // Every range after the edit is stale until the next segment pass.
                self.trigger(Trigger::TextEmptied, now);
                self.snapshot = None;
                self.trigger(Trigger::TextChanged, now);
            }
            Err(err) => warn!(key = key.as_str(), "failed to replace span text: {err}"),
        }
    }

    fn set_source_language(&mut self, code: &str, now: Instant) {
        let Some(profile) = LanguageProfile::for_code(code) else {
            warn!(code, "no language profile for requested source language");
            return;
        };
        info!(code = profile.code(), "source language changed");
        self.profile = profile.clone();
        self.settings.source_language = profile.code().to_string();
        self.trigger(Trigger::TextEmptied, now);
        self.snapshot = None;
        self.trigger(Trigger::TextChanged, now);
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
