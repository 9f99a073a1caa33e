//! Scripted provider for deterministic tests.

use std::sync::Mutex;

use super::{GenerateRequest, GenerateResponse, Provider};

enum Script {
    Reply(String),
    Fail(String),
}

/// Answers each request with the first scripted entry whose needle appears in the prompt.
/// Requests matching nothing fail.
pub struct StubProvider {
    scripts: Vec<(String, Script)>,
    calls: Mutex<Vec<GenerateRequest>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            scripts: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(mut self, needle: &str, content: &str) -> Self {
        self.scripts
            .push((needle.to_string(), Script::Reply(content.to_string())));
        self
    }

    pub fn fail(mut self, needle: &str, message: &str) -> Self {
        self.scripts
            .push((needle.to_string(), Script::Fail(message.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<GenerateRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for_stage(&self, stage: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.stage == stage)
            .count()
    }
}

#[async_trait::async_trait]
impl Provider for StubProvider {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.calls.lock().unwrap().push(req.clone());

        let script = self
            .scripts
            .iter()
            .find(|(needle, _)| req.prompt.contains(needle.as_str()))
            .map(|(_, script)| script);

        match script {
            Some(Script::Reply(content)) => Ok(GenerateResponse {
                content: content.clone(),
                model: req.model.clone(),
                input_tokens: 10,
                output_tokens: 5,
                finish_reason: "stop".to_string(),
            }),
            Some(Script::Fail(message)) => Err(anyhow::anyhow!("{message}")),
            None => Err(anyhow::anyhow!("no scripted reply for prompt")),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn server_address(&self) -> &str {
        "localhost"
    }
}
