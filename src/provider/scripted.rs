use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use super::{
    GenerationRequest, ModelClient, ModelResponse, OperationHandle, OperationStatus,
    ProviderError,
};

/// Deterministic client that replays queued responses in order.
///
/// Used by tests and local demos. Every request is recorded so callers can
/// inspect the rendered prompt. An exhausted response queue fails the call;
/// an exhausted poll queue keeps reporting `Pending`.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<ModelResponse, String>>>,
    polls: Mutex<VecDeque<Result<OperationStatus, String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    polls_seen: Mutex<usize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: ModelResponse) -> Self {
        lock(&self.responses).push_back(Ok(response));
        self
    }

    pub fn respond_json(self, value: Value) -> Self {
        self.respond(ModelResponse::json(&value))
    }

    /// Queues a response with no text and no media.
    pub fn respond_empty(self) -> Self {
        self.respond(ModelResponse::default())
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        lock(&self.responses).push_back(Err(message.into()));
        self
    }

    pub fn poll(self, status: OperationStatus) -> Self {
        lock(&self.polls).push_back(Ok(status));
        self
    }

    pub fn poll_fail(self, message: impl Into<String>) -> Self {
        lock(&self.polls).push_back(Err(message.into()));
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        lock(&self.requests).last().map(|r| r.prompt.clone())
    }

    pub fn polls_seen(&self) -> usize {
        *lock(&self.polls_seen)
    }
}

#[async_trait::async_trait]
impl ModelClient for ScriptedClient {
    async fn generate(&self, request: GenerationRequest) -> Result<ModelResponse, ProviderError> {
        lock(&self.requests).push(request);
        match lock(&self.responses).pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ProviderError::Other(message)),
            None => Err(ProviderError::Other("scripted responses exhausted".into())),
        }
    }

    async fn start_operation(
        &self,
        request: GenerationRequest,
    ) -> Result<OperationHandle, ProviderError> {
        let mut requests = lock(&self.requests);
        requests.push(request);
        Ok(OperationHandle {
            name: format!("operations/scripted-{}", requests.len()),
        })
    }

    async fn check_operation(
        &self,
        _handle: &OperationHandle,
    ) -> Result<OperationStatus, ProviderError> {
        *lock(&self.polls_seen) += 1;
        match lock(&self.polls).pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(ProviderError::Other(message)),
            None => Ok(OperationStatus::Pending),
        }
    }
}
