use crate::error::{CoreError, Result};
use crate::model::{CpuCore, CpuCoreCounters, CpuSnapshot};
use std::fs;
use std::path::Path;

/// Captures all per-core counter tuples from `/proc/stat`.
///
/// The file is read once and the buffer scanned twice: the first pass
/// counts core lines to size storage, the second parses each tuple
/// positionally. Fatal only when the file cannot be read at all or
/// contains no per-core lines.
pub fn capture(path: &Path, seq: u64) -> Result<CpuSnapshot> {
    let buf = fs::read_to_string(path)
        .map_err(|e| CoreError::cpu_stat(format!("cannot read {}: {e}", path.display())))?;
    parse(&buf, seq)
        .ok_or_else(|| CoreError::cpu_stat(format!("no per-core cpu lines in {}", path.display())))
}

/// Parses a whole `/proc/stat` buffer; `None` when no core lines match.
pub(crate) fn parse(buf: &str, seq: u64) -> Option<CpuSnapshot> {
    let count = buf.lines().filter(|l| line_core_index(l).is_some()).count();
    if count == 0 {
        return None;
    }
    let mut cores = Vec::with_capacity(count);
    for line in buf.lines() {
        let Some(index) = line_core_index(line) else {
            continue;
        };
        cores.push(CpuCore {
            index,
            counters: parse_counters(line),
        });
    }
    Some(CpuSnapshot { seq, cores })
}

/// Core index of a line whose label is `cpu` followed immediately by a
/// decimal digit. The aggregate `cpu` summary line does not match.
fn line_core_index(line: &str) -> Option<usize> {
    let label = line.split_whitespace().next()?;
    let suffix = label.strip_prefix("cpu")?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Parses the counter fields after the label. A line with fewer than the
/// 8 required counters (`user` through `steal`) keeps its slot with
/// `parsed_ok = false` so index alignment is preserved for the delta
/// computation; `guest` and `guest_nice` default to 0 on kernels that
/// omit them.
fn parse_counters(line: &str) -> CpuCoreCounters {
    let mut fields = line.split_whitespace().skip(1);
    let mut values = [0u64; 10];
    let mut parsed = 0;
    for slot in values.iter_mut() {
        match fields.next().and_then(|f| f.parse().ok()) {
            Some(v) => {
                *slot = v;
                parsed += 1;
            }
            None => break,
        }
    }
    CpuCoreCounters {
        user: values[0],
        nice: values[1],
        system: values[2],
        idle: values[3],
        iowait: values[4],
        irq: values[5],
        softirq: values[6],
        steal: values[7],
        guest: values[8],
        guest_nice: values[9],
        parsed_ok: parsed >= 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
cpu  400 0 400 2600 0 0 0 0 0 0
cpu0 100 0 100 700 0 0 0 0 0 0
cpu1 300 0 300 1900 50 10 5 0 0 0
intr 12345 0 0
ctxt 67890
";

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("proclog_cpu_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{content}").unwrap();
        path
    }

    #[test]
    fn test_parse_skips_aggregate_line() {
        let snap = parse(SAMPLE, 0).unwrap();
        assert_eq!(snap.cores.len(), 2);
        assert_eq!(snap.cores[0].index, 0);
        assert_eq!(snap.cores[1].index, 1);
    }

    #[test]
    fn test_parse_counter_fields() {
        let snap = parse(SAMPLE, 0).unwrap();
        let cpu1 = snap.core(1).unwrap();
        assert!(cpu1.parsed_ok);
        assert_eq!(cpu1.system, 300);
        assert_eq!(cpu1.idle, 1900);
        assert_eq!(cpu1.iowait, 50);
        assert_eq!(cpu1.irq, 10);
        assert_eq!(cpu1.idle_time(), 1950);
        assert_eq!(cpu1.busy_time(), 615);
    }

    #[test]
    fn test_parse_sparse_indices() {
        let snap = parse("cpu0 1 2 3 4 5 6 7 8\ncpu2 1 2 3 4 5 6 7 8\n", 0).unwrap();
        assert_eq!(snap.cores.len(), 2);
        assert!(snap.core(0).is_some());
        assert!(snap.core(1).is_none());
        assert!(snap.core(2).is_some());
    }

    #[test]
    fn test_short_line_keeps_slot_unparsed() {
        let snap = parse("cpu0 100 0 100 700 0 0 0 0 0 0\ncpu1 100 0 100\ncpu2 1 2 3 4 5 6 7 8 9 10\n", 0)
            .unwrap();
        assert_eq!(snap.cores.len(), 3);
        assert!(snap.core(0).unwrap().parsed_ok);
        assert!(!snap.core(1).unwrap().parsed_ok);
        assert!(snap.core(2).unwrap().parsed_ok);
    }

    #[test]
    fn test_eight_fields_is_enough() {
        // Old kernels omit guest/guest_nice.
        let snap = parse("cpu0 10 20 30 40 50 60 70 80\n", 0).unwrap();
        let cpu0 = snap.core(0).unwrap();
        assert!(cpu0.parsed_ok);
        assert_eq!(cpu0.steal, 80);
        assert_eq!(cpu0.guest, 0);
        assert_eq!(cpu0.guest_nice, 0);
    }

    #[test]
    fn test_non_numeric_field_marks_unparsed() {
        let snap = parse("cpu0 10 20 xx 40 50 60 70 80\n", 0).unwrap();
        assert!(!snap.core(0).unwrap().parsed_ok);
    }

    #[test]
    fn test_no_core_lines_is_none() {
        assert!(parse("cpu  400 0 400 2600 0 0 0 0 0 0\nintr 1\n", 0).is_none());
        assert!(parse("", 0).is_none());
    }

    #[test]
    fn test_capture_from_file() {
        let path = write_temp("stat", SAMPLE);
        let snap = capture(&path, 3).unwrap();
        assert_eq!(snap.seq, 3);
        assert_eq!(snap.cores.len(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_capture_missing_file_is_fatal() {
        let result = capture(Path::new("/nonexistent/proclog/stat"), 0);
        assert!(matches!(result, Err(CoreError::CpuStat(_))));
    }

    #[test]
    fn test_capture_without_cores_is_fatal() {
        let path = write_temp("stat_nocores", "intr 1 2 3\nctxt 9\n");
        let result = capture(&path, 0);
        assert!(matches!(result, Err(CoreError::CpuStat(_))));
        let _ = std::fs::remove_file(&path);
    }
}
