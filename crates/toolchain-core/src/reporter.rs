//! Output collaborator receiving progress and error text

/// Sink for user-visible output of an orchestration call
///
/// Lines arrive already formatted. Implementations decide where they go
/// (terminal, console view, buffer).
pub trait Reporter: Send + Sync {
    /// Normal progress output, one line
    fn println(&self, line: &str);

    /// Error output
    fn print_error(&self, text: &str);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn println(&self, _line: &str) {}

    fn print_error(&self, _text: &str) {}
}
