pub mod cpu;
pub mod discovery;
pub mod sysfs;
pub mod util;

pub use discovery::{discover, DiscoveryPaths, Inventory};
pub use sysfs::SysfsReader;

use crate::error::Result;
use crate::model::{CpuSnapshot, MetricSource, Reading, SampleRow, SourceKind};
use std::path::PathBuf;

/// Per-run reader state for every discovered source.
///
/// Node sources own their reader (and with it the descriptor) for the
/// whole run; CPU utilization sources are computed from snapshot deltas in
/// `collect_row`. Descriptors are released when the collector is dropped.
pub struct MetricsCollector {
    proc_stat: PathBuf,
    sources: Vec<SourceState>,
    seq: u64,
}

struct SourceState {
    source: MetricSource,
    reader: Option<SysfsReader>,
}

impl MetricsCollector {
    pub fn new(inventory: Inventory, proc_stat: PathBuf) -> Self {
        let sources = inventory
            .sources
            .into_iter()
            .map(|source| {
                let reader = match &source.kind {
                    SourceKind::Node { path } => Some(SysfsReader::new(path.clone())),
                    SourceKind::CpuUtil { .. } => None,
                };
                SourceState { source, reader }
            })
            .collect();
        Self {
            proc_stat,
            sources,
            seq: 0,
        }
    }

    /// Column names in source order.
    pub fn columns(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.source.name.clone()).collect()
    }

    /// Captures a fresh `/proc/stat` snapshot.
    pub fn capture_snapshot(&mut self) -> Result<CpuSnapshot> {
        let snapshot = cpu::capture(&self.proc_stat, self.seq)?;
        self.seq += 1;
        Ok(snapshot)
    }

    /// Reads every source once and assembles the row for this tick.
    ///
    /// CPU columns compare `curr` against `prev`; a core index absent or
    /// unparsed on either side reads as `Missing` without disturbing the
    /// other columns. Node reads get the single reopen-retry inside
    /// `SysfsReader`.
    pub fn collect_row(&mut self, sample: u64, prev: &CpuSnapshot, curr: &CpuSnapshot) -> SampleRow {
        let values = self
            .sources
            .iter_mut()
            .map(|state| match &state.source.kind {
                SourceKind::CpuUtil { core } => match (prev.core(*core), curr.core(*core)) {
                    (Some(p), Some(c)) => match util::utilization(p, c) {
                        Some(pct) => Reading::Percent(pct),
                        None => Reading::Missing,
                    },
                    _ => Reading::Missing,
                },
                SourceKind::Node { .. } => {
                    match state.reader.as_mut().and_then(|r| r.read_value()) {
                        Some(v) => Reading::Int(v),
                        None => Reading::Missing,
                    }
                }
            })
            .collect();
        SampleRow { sample, values }
    }
}
