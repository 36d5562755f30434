//! Output formatting for CLI commands

use serde::Serialize;

use crate::nav::Notifier;
pub use crate::storage::OutputFormat;

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                // Callers normally print text themselves; fall back to pretty JSON
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}

/// Prints navigation status lines in text mode
///
/// JSON mode stays quiet here; the command prints the whole report instead.
pub struct OutputNotifier<'a> {
    output: &'a Output,
}

impl<'a> OutputNotifier<'a> {
    pub fn new(output: &'a Output) -> Self {
        Self { output }
    }
}

impl Notifier for OutputNotifier<'_> {
    fn show(&self, message: &str, is_boundary: bool) {
        if self.output.is_json() {
            return;
        }
        if is_boundary {
            println!("! {}", message);
        } else {
            println!("{}", message);
        }
    }
}
