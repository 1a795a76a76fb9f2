//! Scripted completion clients for tests

use crate::client::{CompletionClient, CompletionRequest};
use crate::{ApiError, LlmResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

type Responder = dyn Fn(&CompletionRequest, usize) -> LlmResult<String> + Send + Sync;

/// Completion client driven by a closure
///
/// The closure receives each request and the 0-based call index. Every
/// request is recorded so tests can inspect prompts afterwards.
pub struct ScriptedCompletionClient {
    responder: Box<Responder>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletionClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest, usize) -> LlmResult<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`
    pub fn always(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// Always fail with `error`
    pub fn failing(error: ApiError) -> Self {
        Self::new(move |_, _| Err(error.clone()))
    }

    /// Play back `responses` in order, failing once they run out
    pub fn sequence(responses: Vec<LlmResult<String>>) -> Self {
        Self::new(move |_, call| {
            responses
                .get(call)
                .cloned()
                .unwrap_or_else(|| Err(ApiError::without_status("script exhausted")))
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        (self.responder)(request, call)
    }
}
