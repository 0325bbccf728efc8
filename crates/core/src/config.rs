use crate::error::{CoreError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Hard ceiling on user-supplied sensor paths. Entries past the limit are
/// dropped with a logged warning, never silently.
pub const MAX_CUSTOM_SENSORS: usize = 64;

/// Immutable run parameters, built once from CLI parsing and never mutated
/// while the loop runs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Sampling interval.
    pub interval: Duration,

    /// Wall-clock run length in seconds; `None` runs until interrupted.
    pub duration_secs: Option<u64>,

    /// Emitted-row budget; `None` means unbounded.
    pub sample_count: Option<u64>,

    /// CSV destination; `None` disables CSV output.
    pub csv_path: Option<PathBuf>,

    /// File listing extra sysfs paths to sample, one per line.
    pub sensor_list: Option<PathBuf>,

    /// Suppress the console view.
    pub quiet: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            duration_secs: None,
            sample_count: None,
            csv_path: None,
            sensor_list: None,
            quiet: false,
        }
    }
}

impl RunConfig {
    /// Validate configuration values before the loop starts.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(CoreError::config("sampling interval must be positive"));
        }
        if self.interval > Duration::from_secs(3600) {
            return Err(CoreError::config("sampling interval must be at most an hour"));
        }
        if self.duration_secs == Some(0) {
            return Err(CoreError::config("duration must be at least one second"));
        }
        if self.sample_count == Some(0) {
            return Err(CoreError::config("sample count must be at least one"));
        }
        Ok(())
    }

    /// Number of scheduled ticks covered by the wall-clock budget, if any.
    ///
    /// Skipped ticks count against this budget; only the row budget
    /// (`sample_count`) tracks emitted rows.
    pub fn duration_ticks(&self) -> Option<u64> {
        self.duration_secs.map(|secs| {
            let interval_ms = self.interval.as_millis().max(1);
            let ticks = Duration::from_secs(secs).as_millis() / interval_ms;
            (ticks as u64).max(1)
        })
    }
}
