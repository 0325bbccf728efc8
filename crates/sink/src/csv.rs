use proclog_core::{CoreError, Reading, Result, RowSink, SampleRow};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Rows are pushed through to disk every this many emits, and at finish.
const FLUSH_EVERY_ROWS: u32 = 10;

/// CSV file sink: one row per tick, columns in discovery order, the
/// literal `N/A` for missing values.
pub struct CsvSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    rows_since_flush: u32,
}

impl CsvSink {
    /// Creates the output file eagerly; failure here is a fatal setup
    /// error for the whole run.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .map_err(|e| CoreError::sink(format!("cannot create {}: {e}", path.display())))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            rows_since_flush: 0,
        })
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| CoreError::sink("csv sink already finished"))
    }
}

/// Formats one reading for a CSV cell. Percentages keep two decimals so
/// re-parsing a row reproduces the computed value.
fn format_value(value: &Reading) -> String {
    match value {
        Reading::Int(v) => v.to_string(),
        Reading::Percent(p) => format!("{p:.2}"),
        Reading::Missing => "N/A".to_string(),
    }
}

impl RowSink for CsvSink {
    fn begin(&mut self, columns: &[String]) -> Result<()> {
        let writer = self.writer()?;
        write!(writer, "sample")?;
        for column in columns {
            write!(writer, ",{column}")?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    fn emit(&mut self, row: &SampleRow) -> Result<()> {
        {
            let writer = self.writer()?;
            write!(writer, "{}", row.sample)?;
            for value in &row.values {
                write!(writer, ",{}", format_value(value))?;
            }
            writeln!(writer)?;
        }
        self.rows_since_flush += 1;
        if self.rows_since_flush >= FLUSH_EVERY_ROWS {
            self.writer()?.flush()?;
            self.rows_since_flush = 0;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            tracing::info!("csv output written to {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("proclog_csv_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_header_and_rows() {
        let path = scratch("basic.csv");
        let mut sink = CsvSink::create(&path).unwrap();
        sink.begin(&columns(&["cpu0", "cpu1", "gpu_busy_pct"])).unwrap();
        sink.emit(&SampleRow {
            sample: 1,
            values: vec![Reading::Percent(40.0), Reading::Missing, Reading::Int(17)],
        })
        .unwrap();
        sink.emit(&SampleRow {
            sample: 2,
            values: vec![Reading::Percent(12.3456), Reading::Percent(0.0), Reading::Missing],
        })
        .unwrap();
        sink.finish().unwrap();

        let body = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(
            lines,
            vec![
                "sample,cpu0,cpu1,gpu_busy_pct",
                "1,40.00,N/A,17",
                "2,12.35,0.00,N/A",
            ]
        );
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_round_trip_at_two_decimals() {
        let path = scratch("roundtrip.csv");
        let mut sink = CsvSink::create(&path).unwrap();
        sink.begin(&columns(&["cpu0", "clock_mhz"])).unwrap();
        let emitted = 37.719;
        sink.emit(&SampleRow {
            sample: 1,
            values: vec![Reading::Percent(emitted), Reading::Int(-1)],
        })
        .unwrap();
        sink.finish().unwrap();

        let body = fs::read_to_string(&path).unwrap();
        let row = body.lines().nth(1).unwrap();
        let cells: Vec<&str> = row.split(',').collect();
        let parsed: f64 = cells[1].parse().unwrap();
        assert!((parsed - emitted).abs() < 0.005);
        let parsed_int: i64 = cells[2].parse().unwrap();
        assert_eq!(parsed_int, -1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_create_failure_is_an_error() {
        let result = CsvSink::create(Path::new("/nonexistent/proclog/out.csv"));
        assert!(matches!(result, Err(CoreError::Sink(_))));
    }

    #[test]
    fn test_rows_reach_disk_without_finish() {
        // The periodic flush must land rows on disk during a long run.
        let path = scratch("flush.csv");
        let mut sink = CsvSink::create(&path).unwrap();
        sink.begin(&columns(&["cpu0"])).unwrap();
        for sample in 1..=FLUSH_EVERY_ROWS as u64 {
            sink.emit(&SampleRow {
                sample,
                values: vec![Reading::Percent(1.0)],
            })
            .unwrap();
        }
        let body = fs::read_to_string(&path).unwrap();
        assert_eq!(body.lines().count(), 1 + FLUSH_EVERY_ROWS as usize);
        sink.finish().unwrap();
        let _ = fs::remove_file(&path);
    }
}
