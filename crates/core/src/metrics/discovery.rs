use crate::config::{RunConfig, MAX_CUSTOM_SENSORS};
use crate::error::{CoreError, Result};
use crate::metrics::cpu;
use crate::model::MetricSource;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Filesystem roots probed at discovery time, injectable for tests.
#[derive(Debug, Clone)]
pub struct DiscoveryPaths {
    pub proc_stat: PathBuf,
    pub cpu_base: PathBuf,
    pub thermal_base: PathBuf,
    pub gpu_base: PathBuf,
}

impl Default for DiscoveryPaths {
    fn default() -> Self {
        Self {
            proc_stat: PathBuf::from("/proc/stat"),
            cpu_base: PathBuf::from("/sys/devices/system/cpu"),
            thermal_base: PathBuf::from("/sys/class/thermal"),
            gpu_base: PathBuf::from("/sys/class/kgsl/kgsl-3d0"),
        }
    }
}

/// GPU sysfs nodes probed under the GPU base directory, with the column
/// each one maps to when present.
const GPU_NODES: &[(&str, &str)] = &[
    ("gpu_busy_percentage", "gpu_busy_pct"),
    ("temp", "gpu_temp_mC"),
    ("clock_mhz", "gpu_clock_mhz"),
    ("default_pwrlevel", "gpu_pwrlevel"),
    ("throttling", "gpu_throttling"),
];

/// Everything discovery learned at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    /// Ordered sources; order defines the CSV column order.
    pub sources: Vec<MetricSource>,
    /// Core indices found in `/proc/stat`, ascending order of first
    /// encounter.
    pub cores: Vec<usize>,
}

/// Enumerates the metric sources available for this run.
///
/// Runs once at startup. Zero CPU cores is fatal; every other source class
/// degrades to an omitted column. Custom sensor paths are accepted without
/// a reachability check and validated lazily on first read.
pub fn discover(paths: &DiscoveryPaths, config: &RunConfig) -> Result<Inventory> {
    let snapshot = cpu::capture(&paths.proc_stat, 0)
        .map_err(|e| CoreError::discovery(e.to_string()))?;
    let cores: Vec<usize> = snapshot.cores.iter().map(|c| c.index).collect();
    tracing::info!(
        cores = cores.len(),
        "found cpu core lines in {}",
        paths.proc_stat.display()
    );

    let mut sources: Vec<MetricSource> =
        cores.iter().map(|&core| MetricSource::cpu_util(core)).collect();

    for (node, column) in GPU_NODES {
        let path = paths.gpu_base.join(node);
        if File::open(&path).is_ok() {
            sources.push(MetricSource::node(*column, path));
        } else {
            tracing::debug!("gpu node {} not readable, column omitted", path.display());
        }
    }

    let freq_paths = scaling_freq_paths(&paths.cpu_base);
    tracing::info!(cpufreq = freq_paths.len(), "scanned {}", paths.cpu_base.display());
    for (core, path) in freq_paths {
        sources.push(MetricSource::node(format!("cpu{core}_freq_khz"), path));
    }

    let zones = cpu_thermal_zones(&paths.thermal_base);
    tracing::info!(zones = zones.len(), "scanned {}", paths.thermal_base.display());
    for (label, path) in zones {
        sources.push(MetricSource::node(format!("{label}_mC"), path));
    }

    if let Some(list) = &config.sensor_list {
        for path in load_sensor_list(list)? {
            sources.push(MetricSource::node(path.display().to_string(), path));
        }
    }

    Ok(Inventory { sources, cores })
}

/// Per-core `scaling_cur_freq` paths, ascending core order. Cores without
/// a readable cpufreq node are skipped.
fn scaling_freq_paths(cpu_base: &Path) -> Vec<(usize, PathBuf)> {
    let Ok(entries) = fs::read_dir(cpu_base) else {
        return Vec::new();
    };
    let mut found: Vec<(usize, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name();
            let core: usize = name.to_str()?.strip_prefix("cpu")?.parse().ok()?;
            let path = e.path().join("cpufreq/scaling_cur_freq");
            File::open(&path).is_ok().then_some((core, path))
        })
        .collect();
    found.sort_by_key(|(core, _)| *core);
    found
}

/// Thermal zones whose `type` label contains `cpu` in either case, keyed
/// by the type label (not the zone directory name) for column naming.
/// Ordered by zone number for deterministic discovery.
fn cpu_thermal_zones(thermal_base: &Path) -> Vec<(String, PathBuf)> {
    let Ok(entries) = fs::read_dir(thermal_base) else {
        return Vec::new();
    };
    let mut found: Vec<(usize, String, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name();
            let zone: usize = name.to_str()?.strip_prefix("thermal_zone")?.parse().ok()?;
            let label = fs::read_to_string(e.path().join("type")).ok()?;
            let label = label.trim().to_string();
            label
                .to_lowercase()
                .contains("cpu")
                .then(|| (zone, label, e.path().join("temp")))
        })
        .collect();
    found.sort_by_key(|(zone, _, _)| *zone);
    found
        .into_iter()
        .map(|(_, label, path)| (label, path))
        .collect()
}

/// Reads a caller-supplied list of sysfs paths, one per line. Lines are
/// trimmed and blank lines ignored; entries past `MAX_CUSTOM_SENSORS` are
/// dropped with a warning. Duplicate or unreachable paths are kept as-is.
fn load_sensor_list(path: &Path) -> Result<Vec<PathBuf>> {
    let buf = fs::read_to_string(path).map_err(|e| {
        CoreError::config(format!("cannot read sensor list {}: {e}", path.display()))
    })?;

    let mut paths = Vec::new();
    let mut dropped = 0usize;
    for line in buf.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if paths.len() == MAX_CUSTOM_SENSORS {
            dropped += 1;
            continue;
        }
        paths.push(PathBuf::from(line));
    }
    if dropped > 0 {
        tracing::warn!(
            "sensor list {} exceeds the {MAX_CUSTOM_SENSORS}-path limit, dropped {dropped} entries",
            path.display()
        );
    }
    tracing::info!(sensors = paths.len(), "loaded sensor list {}", path.display());
    Ok(paths)
}
