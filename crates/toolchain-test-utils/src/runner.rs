//! [`ScriptedRunner`] replaying canned results instead of spawning processes.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use toolchain_core::{CommandInvocation, ExecutionResult, ProcessRunner};

/// Runner returning queued results and recording each invocation.
///
/// When the queue is empty every further call succeeds with an empty message.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    replies: Mutex<VecDeque<ExecutionResult>>,
    invocations: Mutex<Vec<CommandInvocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `result` for the next call.
    pub fn reply(self, result: ExecutionResult) -> Self {
        self.replies.lock().unwrap().push_back(result);
        self
    }

    /// Every invocation received so far.
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// The single invocation received; panics if there were zero or several.
    pub fn only_invocation(&self) -> CommandInvocation {
        let invocations = self.invocations();
        assert_eq!(invocations.len(), 1, "expected exactly one invocation");
        invocations.into_iter().next().unwrap()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, invocation: CommandInvocation, _cancel: CancellationToken) -> ExecutionResult {
        self.invocations.lock().unwrap().push(invocation);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ExecutionResult::ok(""))
    }
}
