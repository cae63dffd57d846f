//! Scripted model - replays canned replies instead of calling a service.
//!
//! Useful for testing the gateway end to end and for running it offline.

use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

enum Step {
    Reply(Option<String>),
    Fail(ProviderError),
}

/// A `VisionModel` that answers from a queue of scripted steps.
///
/// Once the queue is down to its last step, that step is repeated for
/// replies; failures are returned once. Every request is recorded.
#[derive(Default)]
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<GenerateRequest>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model that always answers with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new().then_reply(text)
    }

    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.push(Step::Reply(Some(text.into())))
    }

    /// Queue a reply whose candidate carries no text part
    pub fn then_empty(self) -> Self {
        self.push(Step::Reply(None))
    }

    pub fn then_fail(self, err: ProviderError) -> Self {
        self.push(Step::Fail(err))
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of generate calls made so far
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }

    fn push(self, step: Step) -> Self {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push_back(step);
        }
        self
    }

    fn next_step(&self) -> Result<Option<String>, ProviderError> {
        let mut steps = self
            .steps
            .lock()
            .map_err(|_| ProviderError::Other("script lock poisoned".into()))?;

        match steps.front() {
            None => Err(ProviderError::Other("script exhausted".into())),
            Some(Step::Reply(text)) if steps.len() == 1 => Ok(text.clone()),
            Some(_) => match steps.pop_front() {
                Some(Step::Reply(text)) => Ok(text),
                Some(Step::Fail(err)) => Err(err),
                None => Err(ProviderError::Other("script exhausted".into())),
            },
        }
    }
}

impl VisionModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let text = self.next_step()?;
        Ok(GenerateResponse {
            model: self.default_model().to_string(),
            text,
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerateRequest {
        GenerateRequest::new(InlineImage::png("AAAA"), "prompt")
    }

    #[tokio::test]
    async fn test_last_reply_repeats() {
        let model = ScriptedModel::replying("first").then_reply("second");

        let a = model.generate(request()).await.unwrap();
        let b = model.generate(request()).await.unwrap();
        let c = model.generate(request()).await.unwrap();

        assert_eq!(a.text.as_deref(), Some("first"));
        assert_eq!(b.text.as_deref(), Some("second"));
        assert_eq!(c.text.as_deref(), Some("second"));
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_then_reply() {
        let model = ScriptedModel::new()
            .then_fail(ProviderError::Network("reset".into()))
            .then_reply("ok");

        assert!(matches!(model.generate(request()).await, Err(ProviderError::Network(_))));
        assert_eq!(model.generate(request()).await.unwrap().text.as_deref(), Some("ok"));
        assert_eq!(model.last_request().unwrap().prompt, "prompt");
    }

    #[tokio::test]
    async fn test_empty_script() {
        let model = ScriptedModel::new();
        assert!(model.generate(request()).await.is_err());
    }
}
