use crate::error::Result;
use crate::model::SampleRow;

/// Consumer of sample rows.
///
/// The loop drives every configured sink through `begin`, then one `emit`
/// per tick, then `finish`. `finish` runs on every exit path, including
/// interruption, so implementations can rely on it for flushing.
pub trait RowSink {
    /// Called once before the first row with the column names in order.
    fn begin(&mut self, columns: &[String]) -> Result<()>;

    /// Consumes one completed row.
    fn emit(&mut self, row: &SampleRow) -> Result<()>;

    /// Flushes and releases the sink's resources.
    fn finish(&mut self) -> Result<()>;
}
