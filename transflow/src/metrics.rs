use std::collections::VecDeque;

use serde::Serialize;

use crate::decoration::ReconcileStats;
use crate::translation::TranslationError;
use crate::utils::now_epoch_ms;

const DEFAULT_WINDOW_SIZE: usize = 256;
const TRANSLATION_P95_TARGET_MS: u64 = 5_000;
const SEGMENT_P95_TARGET_MS: u64 = 50;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub samples: usize,
    pub average_ms: u64,
    pub p95_ms: u64,
    pub max_ms: u64,
}

impl MetricSummary {
    fn empty() -> Self {
        Self {
            samples: 0,
            average_ms: 0,
            p95_ms: 0,
            max_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub generated_at_ms: u64,
    pub segment_pass: MetricSummary,
    pub reposition_pass: MetricSummary,
    pub translation: MetricSummary,
    pub decorations_created: u64,
    pub decorations_removed: u64,
    pub dropped_spans: u64,
    pub hide_all_events: u64,
    pub translation_failures: u64,
    pub translation_timeouts: u64,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
struct RollingMetric {
    values: VecDeque<u64>,
    capacity: usize,
}

impl RollingMetric {
    fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn record(&mut self, value_ms: u64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value_ms);
    }

    fn summary(&self) -> MetricSummary {
        if self.values.is_empty() {
            return MetricSummary::empty();
        }

        let samples = self.values.len();
        let sum: u64 = self.values.iter().sum();
        let average_ms = sum / samples as u64;
        let max_ms = *self.values.iter().max().unwrap_or(&0);

        let mut sorted = self.values.iter().copied().collect::<Vec<_>>();
        sorted.sort_unstable();
        let p95_index = ((samples as f64 * 0.95).ceil() as usize)
            .saturating_sub(1)
            .min(samples - 1);
        let p95_ms = sorted[p95_index];

        MetricSummary {
            samples,
            average_ms,
            p95_ms,
            max_ms,
        }
    }
}

#[derive(Debug)]
pub struct RuntimeMetrics {
    segment_pass_ms: RollingMetric,
    reposition_pass_ms: RollingMetric,
    translation_ms: RollingMetric,
    decorations_created: u64,
    decorations_removed: u64,
    dropped_spans: u64,
    hide_all_events: u64,
    translation_failures: u64,
    translation_timeouts: u64,
}

impl RuntimeMetrics {
    pub fn new() -> Self {
        Self {
            segment_pass_ms: RollingMetric::new(DEFAULT_WINDOW_SIZE),
            reposition_pass_ms: RollingMetric::new(DEFAULT_WINDOW_SIZE),
            translation_ms: RollingMetric::new(DEFAULT_WINDOW_SIZE),
            decorations_created: 0,
            decorations_removed: 0,
            dropped_spans: 0,
            hide_all_events: 0,
            translation_failures: 0,
            translation_timeouts: 0,
        }
    }

    pub fn record_segment_pass(&mut self, elapsed_ms: u64, stats: ReconcileStats) {
        self.segment_pass_ms.record(elapsed_ms);
        self.record_stats(stats);
    }

    pub fn record_reposition_pass(&mut self, elapsed_ms: u64, stats: ReconcileStats) {
        self.reposition_pass_ms.record(elapsed_ms);
        self.record_stats(stats);
    }

    fn record_stats(&mut self, stats: ReconcileStats) {
        self.decorations_created += stats.created as u64;
        self.decorations_removed += stats.removed as u64;
        self.dropped_spans += stats.dropped as u64;
    }

    pub fn record_hide_all(&mut self, removed: usize) {
        self.hide_all_events += 1;
        self.decorations_removed += removed as u64;
    }

    pub fn record_translation(&mut self, elapsed_ms: u64, result: Result<(), &TranslationError>) {
        self.translation_ms.record(elapsed_ms);
        match result {
            Ok(()) => {}
            Err(TranslationError::Timeout(_)) => self.translation_timeouts += 1,
            Err(_) => self.translation_failures += 1,
        }
    }

    pub fn report(&self) -> PerformanceReport {
        let segment_pass = self.segment_pass_ms.summary();
        let reposition_pass = self.reposition_pass_ms.summary();
        let translation = self.translation_ms.summary();

        let mut warnings = Vec::new();
        if self.dropped_spans > 0 {
            warnings.push(format!(
                "Dropped {} spans whose screen position could not be resolved.",
                self.dropped_spans
            ));
        }
        if self.translation_timeouts > 0 {
            warnings.push(format!(
                "{} translation requests timed out.",
                self.translation_timeouts
            ));
        }
        if segment_pass.samples > 0 && segment_pass.p95_ms > SEGMENT_P95_TARGET_MS {
            warnings.push(format!(
                "Segment pass P95 latency {}ms exceeded target {}ms.",
                segment_pass.p95_ms, SEGMENT_P95_TARGET_MS
            ));
        }
        if translation.samples > 0 && translation.p95_ms > TRANSLATION_P95_TARGET_MS {
            warnings.push(format!(
                "Translation P95 latency {}ms exceeded target {}ms.",
                translation.p95_ms, TRANSLATION_P95_TARGET_MS
            ));
        }

        PerformanceReport {
            generated_at_ms: now_epoch_ms(),
            segment_pass,
            reposition_pass,
            translation,
            decorations_created: self.decorations_created,
            decorations_removed: self.decorations_removed,
            dropped_spans: self.dropped_spans,
            hide_all_events: self.hide_all_events,
            translation_failures: self.translation_failures,
            translation_timeouts: self.translation_timeouts,
            warnings,
        }
    }
}

impl Default for RuntimeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
