pub mod console;
pub mod csv;

pub use console::ConsoleSink;
pub use csv::CsvSink;
