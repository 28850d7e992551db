//! [`RecordingReporter`] capturing orchestrator output in order.

use std::sync::Mutex;

use toolchain_core::Reporter;

/// One line handed to the reporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedLine {
    Out(String),
    Err(String),
}

/// Reporter that keeps every line for later assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<RecordedLine>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines in arrival order.
    pub fn lines(&self) -> Vec<RecordedLine> {
        self.lines.lock().unwrap().clone()
    }

    /// Normal output only.
    pub fn output(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                RecordedLine::Out(text) => Some(text),
                RecordedLine::Err(_) => None,
            })
            .collect()
    }

    /// Error output only.
    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                RecordedLine::Err(text) => Some(text),
                RecordedLine::Out(_) => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn println(&self, line: &str) {
        self.lines.lock().unwrap().push(RecordedLine::Out(line.to_string()));
    }

    fn print_error(&self, text: &str) {
        self.lines.lock().unwrap().push(RecordedLine::Err(text.to_string()));
    }
}
