//! [`FixedSelector`] answering path selection without a user.

use std::sync::Mutex;

use toolchain_core::{PathSelector, Selection, SelectionRequest, ToolPaths};

/// Selector returning a preset answer and remembering what it was asked.
#[derive(Debug)]
pub struct FixedSelector {
    answer: Selection,
    requests: Mutex<Vec<SelectionRequest>>,
}

impl FixedSelector {
    /// Confirm `paths` whatever discovery found.
    pub fn confirm(paths: ToolPaths) -> Self {
        Self {
            answer: Selection::Confirmed(paths),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always cancel.
    pub fn cancel() -> Self {
        Self {
            answer: Selection::Cancelled,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SelectionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl PathSelector for FixedSelector {
    fn select(&self, request: &SelectionRequest) -> Selection {
        self.requests.lock().unwrap().push(request.clone());
        self.answer.clone()
    }
}
