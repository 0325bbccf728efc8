use crate::config::RunConfig;
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::sink::RowSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation flag.
///
/// A signal handler stores into it and does nothing else; the loop loads
/// it at tick boundaries only, so an in-flight row is always finished and
/// never torn.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters reported after a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Rows actually handed to the sinks.
    pub rows_emitted: u64,
    /// Ticks where the snapshot capture failed and no row was emitted.
    pub ticks_skipped: u64,
}

/// The sampling loop: a fixed-cadence scheduler around the collector.
pub struct Sampler {
    collector: MetricsCollector,
    config: RunConfig,
}

impl Sampler {
    pub fn new(collector: MetricsCollector, config: RunConfig) -> Self {
        Self { collector, config }
    }

    pub fn columns(&self) -> Vec<String> {
        self.collector.columns()
    }

    /// Runs until the wall-clock budget, the row budget, or cancellation.
    ///
    /// The first snapshot only seeds the delta baseline and is never
    /// emitted as a row. Each tick waits for an absolute deadline advanced
    /// by exactly one interval, so variable per-tick work time never
    /// accumulates into cadence drift. A failed capture skips the row but
    /// keeps the previous baseline; skipped ticks count against the
    /// wall-clock budget, not the row budget. Sinks are finished on every
    /// exit path.
    pub fn run(&mut self, sinks: &mut [Box<dyn RowSink>], cancel: &CancelFlag) -> Result<RunStats> {
        for sink in sinks.iter_mut() {
            sink.begin(&self.collector.columns())?;
        }

        let outcome = self.sample_loop(sinks, cancel);

        let mut finish_err = None;
        for sink in sinks.iter_mut() {
            if let Err(e) = sink.finish() {
                finish_err.get_or_insert(e);
            }
        }
        match (outcome, finish_err) {
            (Err(e), _) => Err(e),
            (Ok(_), Some(e)) => Err(e),
            (Ok(stats), None) => Ok(stats),
        }
    }

    fn sample_loop(&mut self, sinks: &mut [Box<dyn RowSink>], cancel: &CancelFlag) -> Result<RunStats> {
        let mut baseline = self.collector.capture_snapshot()?;
        let duration_ticks = self.config.duration_ticks();
        let mut stats = RunStats::default();
        let mut scheduled: u64 = 0;
        let mut deadline = Instant::now();

        loop {
            if cancel.is_cancelled() {
                tracing::info!("interrupted, stopping after {} rows", stats.rows_emitted);
                break;
            }
            if let Some(limit) = self.config.sample_count {
                if stats.rows_emitted >= limit {
                    break;
                }
            }
            if let Some(limit) = duration_ticks {
                if scheduled >= limit {
                    break;
                }
            }

            deadline += self.config.interval;
            sleep_until(deadline);
            scheduled += 1;

            match self.collector.capture_snapshot() {
                Ok(current) => {
                    let row = self
                        .collector
                        .collect_row(stats.rows_emitted + 1, &baseline, &current);
                    for sink in sinks.iter_mut() {
                        sink.emit(&row)?;
                    }
                    baseline = current;
                    stats.rows_emitted += 1;
                }
                Err(e) => {
                    tracing::warn!("snapshot capture failed, skipping this tick: {e}");
                    stats.ticks_skipped += 1;
                }
            }
        }
        Ok(stats)
    }
}

/// Sleeps until an absolute instant. A deadline already in the past
/// returns immediately; the loop is late, not broken.
fn sleep_until(deadline: Instant) {
    if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
        std::thread::sleep(wait);
    }
}
