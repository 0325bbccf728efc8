use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a metric source obtains its value each tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// Utilization percentage derived from consecutive `/proc/stat` snapshots.
    CpuUtil { core: usize },
    /// Raw integer read from a sysfs node.
    Node { path: PathBuf },
}

/// A named metric column, fixed for the lifetime of a run.
///
/// Sources are created once at discovery and held in an ordered sequence;
/// that order defines the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSource {
    pub name: String,
    pub kind: SourceKind,
}

impl MetricSource {
    pub fn cpu_util(core: usize) -> Self {
        Self {
            name: format!("cpu{core}"),
            kind: SourceKind::CpuUtil { core },
        }
    }

    pub fn node<S: Into<String>>(name: S, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Node { path },
        }
    }
}

/// One sampled value. `Missing` is distinct from a reading of zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Reading {
    Int(i64),
    Percent(f64),
    Missing,
}

impl Reading {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Raw counter tuple for one CPU core, as read from a `/proc/stat` line.
///
/// Counters are monotonically non-decreasing while the core stays online.
/// Two tuples for the same core index are only comparable when `parsed_ok`
/// holds on both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuCoreCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
    pub parsed_ok: bool,
}

impl CpuCoreCounters {
    /// Time the core spent idle or waiting on I/O.
    pub fn idle_time(&self) -> u64 {
        self.idle + self.iowait
    }

    /// Time the core spent doing work. `guest` and `guest_nice` are already
    /// accounted inside `user`/`nice` and must not be added again.
    pub fn busy_time(&self) -> u64 {
        self.user + self.nice + self.system + self.irq + self.softirq + self.steal
    }

    pub fn total_time(&self) -> u64 {
        self.idle_time() + self.busy_time()
    }
}

/// Counters for one core index within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuCore {
    pub index: usize,
    pub counters: CpuCoreCounters,
}

/// All per-core counter tuples captured in one pass over `/proc/stat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    /// Capture sequence number; 0 is the pre-loop baseline.
    pub seq: u64,
    pub cores: Vec<CpuCore>,
}

impl CpuSnapshot {
    /// Looks up a core by index. An absent index means the core was offline
    /// (or not yet present) when this snapshot was taken.
    pub fn core(&self, index: usize) -> Option<&CpuCoreCounters> {
        self.cores
            .iter()
            .find(|c| c.index == index)
            .map(|c| &c.counters)
    }
}

/// One output record: a sequence number plus one reading per configured
/// source, in source order. Built fresh each tick and handed straight to
/// the sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub sample: u64,
    pub values: Vec<Reading>,
}
