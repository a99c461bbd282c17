#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use trellis_application::AppContext;
use trellis_core::agent::{CompletionAgent, CompletionRequest, CompletionResponse};
use trellis_infrastructure::TrellisPaths;

pub const CHAT: &str = "knowledgeable tutor";
pub const IDENTIFY: &str = "topic identification assistant";
pub const MATCH: &str = "topic matching assistant";
pub const EXTRACT: &str = "knowledge extraction assistant";
pub const FEED: &str = "learning dashboard assistant";
pub const SUMMARY: &str = "analyzing a student's topic exploration";

struct Route {
    needle: &'static str,
    responses: VecDeque<CompletionResponse>,
}

/// Answers by matching a needle against the system prompt.
///
/// Each route replays its queue; the last response repeats. Requests with
/// no route fail like a CLI error would.
#[derive(Default)]
pub struct MockAgent {
    routes: Mutex<Vec<Route>>,
    gates: Mutex<Vec<(&'static str, Arc<Notify>)>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockAgent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, needle: &'static str, response: CompletionResponse) {
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|r| r.needle == needle) {
            Some(route) => route.responses.push_back(response),
            None => routes.push(Route {
                needle,
                responses: VecDeque::from([response]),
            }),
        }
    }

    pub fn reply(&self, needle: &'static str, content: &str) {
        self.on(needle, CompletionResponse::ok(content));
    }

    /// Holds the next matching request until the returned gate is notified.
    pub fn gate_next(&self, needle: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().push((needle, gate.clone()));
        gate
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls_to(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.system_prompt.as_deref().is_some_and(|s| s.contains(needle)))
            .count()
    }

    pub async fn wait_for_calls(&self, needle: &str, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls_to(needle) < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("agent was not called in time");
    }
}

#[async_trait]
impl CompletionAgent for MockAgent {
    async fn complete(&self, request: CompletionRequest) -> CompletionResponse {
        let system = request.system_prompt.clone().unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        let gate = {
            let mut gates = self.gates.lock().unwrap();
            gates
                .iter()
                .position(|(needle, _)| system.contains(needle))
                .map(|idx| gates.remove(idx).1)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|r| system.contains(r.needle)) {
            Some(route) if route.responses.len() > 1 => route.responses.pop_front().unwrap(),
            Some(route) => route.responses[0].clone(),
            None => CompletionResponse::failed("unexpected request"),
        }
    }
}

pub struct TestApp {
    pub dir: TempDir,
    pub agent: Arc<MockAgent>,
    pub ctx: AppContext,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let agent = MockAgent::new();
        let ctx = open(&dir, agent.clone()).await;
        Self { dir, agent, ctx }
    }
}

pub async fn open(dir: &TempDir, agent: Arc<MockAgent>) -> AppContext {
    let paths = TrellisPaths::new(Some(dir.path())).unwrap();
    let ctx = AppContext::open(paths, agent).await.unwrap();
    ctx.initialize().await.unwrap();
    ctx
}

/// An extraction reply. `related` is a comma-separated list of names.
pub fn extraction_json(topic: &str, concepts: &[(&str, &str, &str)]) -> String {
    let concepts: Vec<serde_json::Value> = concepts
        .iter()
        .map(|(name, level, related)| {
            let related: Vec<&str> = related
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .collect();
            serde_json::json!({
                "name": name,
                "familiarityLevel": level,
                "relatedTo": related,
            })
        })
        .collect();
    serde_json::json!({
        "topicName": topic,
        "topicCategory": "Programming",
        "topicSummary": format!("Learned about {}", topic),
        "concepts": concepts,
    })
    .to_string()
}
