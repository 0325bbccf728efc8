pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod sampler;
pub mod sink;

pub use config::{RunConfig, MAX_CUSTOM_SENSORS};
pub use error::{CoreError, Result};
pub use metrics::{discover, DiscoveryPaths, Inventory, MetricsCollector};
pub use model::*;
pub use sampler::{CancelFlag, RunStats, Sampler};
pub use sink::RowSink;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RunConfig::default();
        assert_eq!(config.interval, std::time::Duration::from_secs(1));
        assert!(!config.quiet);
    }

    #[test]
    fn test_sample_row_serialization() {
        let row = SampleRow {
            sample: 7,
            values: vec![
                Reading::Percent(40.0),
                Reading::Int(813000),
                Reading::Missing,
            ],
        };

        let json = serde_json::to_string(&row).unwrap();
        let back: SampleRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
        assert!(back.values[2].is_missing());
    }

    #[test]
    fn test_metric_source_names() {
        assert_eq!(MetricSource::cpu_util(3).name, "cpu3");
        let source = MetricSource::node("gpu_busy_pct", "/sys/class/kgsl/kgsl-3d0/gpu_busy_percentage".into());
        assert_eq!(source.name, "gpu_busy_pct");
    }
}
