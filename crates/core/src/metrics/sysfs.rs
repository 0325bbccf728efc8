use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Reader for a single-value numeric sysfs node.
///
/// The descriptor is opened lazily and kept across ticks. sysfs files do
/// not stream, so every read seeks back to offset 0 and re-reads the whole
/// value. All failure modes collapse into `None`; a node that never
/// recovers simply reports `None` every tick without aborting anything.
#[derive(Debug)]
pub struct SysfsReader {
    path: PathBuf,
    file: Option<File>,
}

impl SysfsReader {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the node's current value.
    ///
    /// On a failed read the descriptor is dropped and reopened exactly once
    /// before settling on `None` for this tick.
    pub fn read_value(&mut self) -> Option<i64> {
        match self.read_once() {
            Some(value) => Some(value),
            None => {
                self.file = None;
                self.read_once()
            }
        }
    }

    fn read_once(&mut self) -> Option<i64> {
        if self.file.is_none() {
            self.file = File::open(&self.path).ok();
        }
        let file = self.file.as_mut()?;
        if file.seek(SeekFrom::Start(0)).is_err() {
            return None;
        }
        let mut buf = String::new();
        if file.read_to_string(&mut buf).is_err() {
            return None;
        }
        parse_leading_int(&buf)
    }
}

/// Parses the first signed integer in `s`, skipping leading whitespace.
/// Returns `None` when no digits are found.
pub(crate) fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("proclog_sysfs_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        write!(f, "{content}").unwrap();
        path
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("42\n"), Some(42));
        assert_eq!(parse_leading_int("  \t 813000\n"), Some(813000));
        assert_eq!(parse_leading_int("-5"), Some(-5));
        assert_eq!(parse_leading_int("17 extra fields"), Some(17));
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("   \n"), None);
        assert_eq!(parse_leading_int("enabled"), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_reads_value() {
        let path = write_temp("busy", "37\n");
        let mut reader = SysfsReader::new(&path);
        assert_eq!(reader.read_value(), Some(37));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_reread_sees_updated_value() {
        let path = write_temp("temp_mC", "41000\n");
        let mut reader = SysfsReader::new(&path);
        assert_eq!(reader.read_value(), Some(41000));

        // fs::write truncates the same inode, so the held descriptor must
        // observe the new value after seeking back to the start.
        std::fs::write(&path, "52000\n").unwrap();
        assert_eq!(reader.read_value(), Some(52000));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_node_reports_none() {
        let mut reader = SysfsReader::new("/nonexistent/proclog/node");
        assert_eq!(reader.read_value(), None);
        assert_eq!(reader.read_value(), None);
    }

    #[test]
    fn test_garbage_content_reports_none() {
        let path = write_temp("label", "simple-framebuffer\n");
        let mut reader = SysfsReader::new(&path);
        assert_eq!(reader.read_value(), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_recovers_when_node_appears() {
        let dir = std::env::temp_dir().join(format!("proclog_sysfs_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("late_node");
        let _ = std::fs::remove_file(&path);

        let mut reader = SysfsReader::new(&path);
        assert_eq!(reader.read_value(), None);

        std::fs::write(&path, "7\n").unwrap();
        assert_eq!(reader.read_value(), Some(7));
        let _ = std::fs::remove_file(&path);
    }
}
