use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use gn_core::{Completion, CompletionRequest, Error, Result};

use super::InferenceModel;

enum Reply {
    Ready(Result<Completion>),
    Hang,
}

/// Test double that answers calls from a queue and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedModel")
            .field("pending", &self.replies.lock().map(|r| r.len()).unwrap_or(0))
            .finish()
    }
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, reply: Reply) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    pub fn then_reply(self, completion: Completion) -> Self {
        self.push(Reply::Ready(Ok(completion)))
    }

    pub fn then_text(self, content: impl Into<String>) -> Self {
        self.then_reply(Completion::text(content))
    }

    pub fn then_fail(self, error: Error) -> Self {
        self.push(Reply::Ready(Err(error)))
    }

    /// Next call never resolves.
    pub fn then_hang(self) -> Self {
        self.push(Reply::Hang)
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl InferenceModel for ScriptedModel {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }
        let reply = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(Error::Inference("no scripted reply left".to_string())),
        }
    }
}
