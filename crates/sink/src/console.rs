use chrono::Local;
use proclog_core::{Reading, Result, RowSink, SampleRow};
use std::io::{self, Write};

/// Live console view.
///
/// Prints one block per tick: a local-time header followed by one
/// `name: value` line per source. On a real terminal the previous block is
/// repainted in place instead of scrolling; on a pipe the blocks print
/// plainly. Presentation only; the computed values are untouched.
pub struct ConsoleSink<W: Write> {
    out: W,
    tty: bool,
    columns: Vec<String>,
    /// Lines printed by the previous block, 0 before the first tick.
    last_block_lines: u16,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        use crossterm::tty::IsTty;
        let tty = io::stdout().is_tty();
        Self::new(io::stdout(), tty)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, tty: bool) -> Self {
        Self {
            out,
            tty,
            columns: Vec::new(),
            last_block_lines: 0,
        }
    }
}

fn format_value(value: &Reading) -> String {
    match value {
        Reading::Int(v) => v.to_string(),
        Reading::Percent(p) => format!("{p:6.2} %"),
        Reading::Missing => "N/A".to_string(),
    }
}

impl<W: Write> RowSink for ConsoleSink<W> {
    fn begin(&mut self, columns: &[String]) -> Result<()> {
        self.columns = columns.to_vec();
        Ok(())
    }

    fn emit(&mut self, row: &SampleRow) -> Result<()> {
        if self.tty && self.last_block_lines > 0 {
            crossterm::queue!(
                self.out,
                crossterm::cursor::MoveToPreviousLine(self.last_block_lines),
                crossterm::terminal::Clear(crossterm::terminal::ClearType::FromCursorDown),
            )?;
        }

        writeln!(self.out, "--- {} ---", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        for (name, value) in self.columns.iter().zip(&row.values) {
            writeln!(self.out, "{name}: {}", format_value(value))?;
        }
        self.out.flush()?;

        self.last_block_lines = (self.columns.len() as u16).saturating_add(1);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
