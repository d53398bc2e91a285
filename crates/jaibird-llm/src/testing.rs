//! Scripted model for tests in dependent crates.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::{CompletionRequest, UsageSnapshot, UsageStats};
use crate::TextModel;
use jaibird_core::{Error, Result};

/// Replays queued responses in order and records every request.
///
/// When the queue runs dry the fallback response is returned; `None` as a
/// queued or fallback entry yields a provider error.
pub struct ScriptedModel {
    responses: Mutex<Vec<Option<String>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
    usage: UsageStats,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Option<String>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            usage: UsageStats::default(),
        }
    }

    /// Always answers with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        let mut model = Self::new(Vec::new());
        model.fallback = Some(text.into());
        model
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.usage.record_call();
        self.requests.lock().push(request);

        let next = {
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                self.fallback.clone()
            } else {
                responses.remove(0)
            }
        };
        match next {
            Some(text) => Ok(text),
            None => {
                self.usage.record_failure();
                Err(Error::Provider("scripted failure".into()))
            }
        }
    }

    fn name(&self) -> String {
        "scripted".into()
    }

    fn usage(&self) -> UsageSnapshot {
        self.usage.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_then_falls_back() {
        let model = ScriptedModel::new(vec![Some("first".into()), None]);

        assert_eq!(
            model.complete(CompletionRequest::new("a")).await.unwrap(),
            "first"
        );
        assert!(model.complete(CompletionRequest::new("b")).await.is_err());
        assert!(model.complete(CompletionRequest::new("c")).await.is_err());

        assert_eq!(model.call_count(), 3);
        assert_eq!(model.requests()[1].prompt, "b");
        assert_eq!(model.usage().failures, 2);

        let steady = ScriptedModel::always("ok");
        assert_eq!(steady.complete(CompletionRequest::new("x")).await.unwrap(), "ok");
    }
}
