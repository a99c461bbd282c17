//! Scripted agent for generation tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use trellis_core::agent::{CompletionAgent, CompletionRequest, CompletionResponse};

/// Replays queued responses and records every request.
#[derive(Default)]
pub struct ScriptedAgent {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedAgent {
    pub fn with(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(content: &str) -> Self {
        Self::with(vec![CompletionResponse::ok(content)])
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionAgent for ScriptedAgent {
    async fn complete(&self, request: CompletionRequest) -> CompletionResponse {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| CompletionResponse::failed("no scripted response"))
    }
}
