pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

impl OutputFormat {
    /// Print a command envelope (`result`, `warnings`, `methodology`, ...)
    /// to stdout. Logs and errors stay on stderr.
    pub fn print(&self, envelope: &Value) {
        match self {
            Self::Json => json::print_json(envelope),
            Self::Table => table::print_table(envelope),
            Self::Csv => csv_out::print_csv(envelope),
            Self::Minimal => minimal::print_minimal(envelope),
        }
    }
}
