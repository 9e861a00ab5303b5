//! Terminal output for the s7web binary
//!
//! Every invocation speaks either to a person or to a pipeline: `--json`
//! switches the whole run to machine-readable documents. `Console` owns
//! that split, so command code states what happened and the rendering
//! lives in one place. Status lines go to stdout on success and stderr on
//! failure; structured reports are a single pretty-printed document.

use serde_json::Value;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Format-aware writer shared by all commands
#[derive(Debug, Clone, Copy)]
pub struct Console {
    format: OutputFormat,
}

impl Console {
    #[must_use]
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Report a completed operation
    pub fn success(&self, message: &str) {
        println!("{}", self.status_line(true, message));
    }

    /// Report a failed operation on stderr
    pub fn failure(&self, message: &str) {
        eprintln!("{}", self.status_line(false, message));
    }

    /// Indented line under the preceding status; suppressed in JSON mode,
    /// where the document carries the detail instead
    pub fn detail(&self, message: &str) {
        if let Some(line) = self.detail_line(message) {
            println!("{line}");
        }
    }

    /// Emit a structured report; a no-op in human mode
    pub fn document(&self, value: &Value) {
        if self.format.is_json() {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
        }
    }

    fn status_line(&self, ok: bool, message: &str) -> String {
        match (self.format, ok) {
            (OutputFormat::Human, true) => format!("\u{2713} {message}"),
            (OutputFormat::Human, false) => format!("\u{2717} {message}"),
            (OutputFormat::Json, true) => {
                serde_json::json!({ "ok": true, "message": message }).to_string()
            }
            (OutputFormat::Json, false) => {
                serde_json::json!({ "ok": false, "error": message }).to_string()
            }
        }
    }

    fn detail_line(&self, message: &str) -> Option<String> {
        match self.format {
            OutputFormat::Human => Some(format!("  {message}")),
            OutputFormat::Json => None,
        }
    }
}
