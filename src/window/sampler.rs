//! Call-stack sampling while the content process is unresponsive.
//!
//! An episode starts when the window turns unresponsive and ends when it
//! recovers, is destroyed, or the sampling period runs out. Samples are
//! aggregated into a frequency map; stacks seen in more than 20% of the
//! samples are reported to the unexpected-error handler.

use super::handle_owner::WindowHandleOwner;
use crate::error::WindowError;
use crate::race::{LatestGuard, Raced, race_timeout};
use crate::services::UnexpectedErrorHandler;
use casement_config::{ParsedArgs, SamplingConfig, WindowId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SAMPLE_INTERVAL_MS: i64 = 1000;
pub const DEFAULT_SAMPLE_PERIOD_MS: i64 = 15000;

/// Share of samples above which a stack is escalated.
pub const ESCALATION_THRESHOLD: f64 = 0.2;

/// Validated sampling interval and period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    pub interval: Duration,
    pub period: Duration,
}

impl SamplerSettings {
    /// Use the given values, or the defaults if they do not make sense.
    pub fn validated(interval_ms: i64, period_ms: i64) -> Self {
        let (interval_ms, period_ms) =
            if interval_ms <= 0 || period_ms <= 0 || interval_ms > period_ms {
                log::warn!(
                    "invalid unresponsive sampling settings (interval {}ms, period {}ms), using defaults",
                    interval_ms,
                    period_ms
                );
                (DEFAULT_SAMPLE_INTERVAL_MS, DEFAULT_SAMPLE_PERIOD_MS)
            } else {
                (interval_ms, period_ms)
            };
        Self {
            interval: Duration::from_millis(interval_ms as u64),
            period: Duration::from_millis(period_ms as u64),
        }
    }

    /// CLI values take precedence over the shell configuration.
    pub fn resolve(args: &ParsedArgs, config: &SamplingConfig) -> Self {
        Self::validated(
            args.unresponsive_sample_interval.unwrap_or(config.interval_ms),
            args.unresponsive_sample_period.unwrap_or(config.period_ms),
        )
    }

    /// Maximum number of samples captured per episode.
    pub fn effective_sample_count(&self) -> usize {
        let ratio = self.period.as_millis() as f64 / self.interval.as_millis() as f64;
        (ratio.round() as usize).max(1)
    }
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self::validated(DEFAULT_SAMPLE_INTERVAL_MS, DEFAULT_SAMPLE_PERIOD_MS)
    }
}

/// Occurrence count per call stack within one episode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SampleFrequencyMap {
    counts: HashMap<String, usize>,
    total: usize,
}

impl SampleFrequencyMap {
    pub fn record(&mut self, stack: impl Into<String>) {
        *self.counts.entry(stack.into()).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Sort the samples by frequency, most frequent first.
    pub fn aggregate(self) -> SampleReport {
        let mut entries: Vec<(String, usize)> = self.counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        SampleReport {
            entries,
            total: self.total,
        }
    }
}

/// Aggregated samples of a finished episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleReport {
    /// Stacks and their counts, most frequent first
    pub entries: Vec<(String, usize)>,
    pub total: usize,
}

impl SampleReport {
    /// Stacks seen in more than [`ESCALATION_THRESHOLD`] of the samples.
    pub fn escalated(&self) -> impl Iterator<Item = &(String, usize)> {
        let threshold = self.total as f64 * ESCALATION_THRESHOLD;
        self.entries
            .iter()
            .filter(move |(_, count)| *count as f64 > threshold)
    }

    /// `<count> <stack>` lines followed by the total.
    pub fn log_text(&self) -> String {
        let mut text = String::new();
        for (stack, count) in &self.entries {
            let _ = writeln!(text, "<{}> {}", count, stack);
        }
        let _ = write!(text, "Total Samples: {}", self.total);
        text
    }
}

struct Episode {
    cancel: CancellationToken,
    samples: Arc<Mutex<SampleFrequencyMap>>,
    owner: Weak<WindowHandleOwner>,
}

/// Samples one window's call stacks during unresponsive episodes.
pub struct UnresponsiveSampler {
    window_id: WindowId,
    settings: SamplerSettings,
    errors: Arc<dyn UnexpectedErrorHandler>,
    episode: Mutex<Option<Episode>>,
    deadline: LatestGuard,
}

impl UnresponsiveSampler {
    pub fn new(
        window_id: WindowId,
        settings: SamplerSettings,
        errors: Arc<dyn UnexpectedErrorHandler>,
    ) -> Arc<Self> {
        Arc::new(Self {
            window_id,
            settings,
            errors,
            episode: Mutex::new(None),
            deadline: LatestGuard::new(),
        })
    }

    pub fn settings(&self) -> SamplerSettings {
        self.settings
    }

    pub fn is_running(&self) -> bool {
        self.episode.lock().is_some()
    }

    /// Start an episode, or push back the deadline of the running one.
    pub fn start(self: &Arc<Self>, owner: &Arc<WindowHandleOwner>) {
        let cancel = {
            let mut episode = self.episode.lock();
            match episode.as_ref() {
                Some(running) => {
                    debug_info!("SAMPLER", "window {} still unresponsive, extending sampling", self.window_id);
                    running.cancel.clone()
                }
                None => {
                    let running = Episode {
                        cancel: CancellationToken::new(),
                        samples: Arc::new(Mutex::new(SampleFrequencyMap::default())),
                        owner: Arc::downgrade(owner),
                    };
                    self.spawn_sampling(&running);
                    let cancel = running.cancel.clone();
                    *episode = Some(running);
                    cancel
                }
            }
        };
        self.arm_deadline(cancel);
    }

    fn spawn_sampling(&self, episode: &Episode) {
        let cancel = episode.cancel.clone();
        let samples = episode.samples.clone();
        let owner = episode.owner.clone();
        let interval = self.settings.interval;
        let max_samples = self.settings.effective_sample_count();
        let window_id = self.window_id;

        tokio::spawn(async move {
            while samples.lock().total() < max_samples {
                if let Raced::Settled(()) = race_timeout(cancel.cancelled(), interval).await {
                    return;
                }
                let Some(win) = owner.upgrade().and_then(|owner| owner.win()) else {
                    return;
                };
                let stack = tokio::select! {
                    _ = cancel.cancelled() => return,
                    stack = win.collect_call_stack() => stack,
                };
                if let Some(stack) = stack {
                    debug_trace!("SAMPLER", "window {} sample collected", window_id);
                    samples.lock().record(stack);
                }
            }
        });
    }

    fn arm_deadline(self: &Arc<Self>, cancel: CancellationToken) {
        let ticket = self.deadline.issue();
        let weak = Arc::downgrade(self);
        let period = self.settings.period;
        tokio::spawn(async move {
            if let Raced::Settled(()) = race_timeout(cancel.cancelled(), period).await {
                return;
            }
            if let Some(sampler) = weak.upgrade()
                && sampler.deadline.complete(ticket)
            {
                sampler.stop();
            }
        });
    }

    /// End the running episode, log its samples and escalate hot stacks.
    pub fn stop(&self) -> Option<SampleReport> {
        let episode = self.episode.lock().take()?;
        self.deadline.invalidate();
        episode.cancel.cancel();

        let samples = std::mem::take(&mut *episode.samples.lock());
        if samples.is_empty() {
            return None;
        }
        let report = samples.aggregate();
        log::error!(
            "window {} unresponsive samples:\n{}",
            self.window_id,
            report.log_text()
        );

        let pid = episode
            .owner
            .upgrade()
            .and_then(|owner| owner.win())
            .and_then(|win| win.content_process_id());
        for (stack, _) in report.escalated() {
            self.errors
                .on_unexpected_error(&WindowError::UnresponsiveSample {
                    stack: stack.clone(),
                    window_id: self.window_id,
                    pid,
                });
        }
        Some(report)
    }
}
