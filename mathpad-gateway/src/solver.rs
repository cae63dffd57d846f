//! # Solver
//!
//! The request path of the gateway, independent of HTTP:
//! validate the snapshot, build the prompt, call the model (bounded by a
//! timeout, retried once on transient failures), parse the reply.

use crate::config::SolverConfig;
use crate::error::{invalid_input, Error, Result};
use crate::prompt::{build_prompt, response_schema};
use crate::provider::{GenerateRequest, GenerateResponse, InlineImage, VisionModel};
use crate::reply::parse_reply;
use crate::schema::{SolveRequest, SolveResultRecord};
use base64::Engine as _;

const DEFAULT_MIME: &str = "image/png";

/// Stateless solver shared by all requests
pub struct Solver<M> {
    model: M,
    config: SolverConfig,
}

impl<M: VisionModel> Solver<M> {
    pub fn new(model: M, config: SolverConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Solve one snapshot. Returns every record the model produced.
    pub async fn solve(&self, request: SolveRequest) -> Result<Vec<SolveResultRecord>> {
        let image = inline_image(request.image.as_deref())
            .map_err(|e| e.with_operation("solver::solve"))?;

        // The instruction goes out with every image, even with no variables yet.
        let prompt = build_prompt(&request.variables);
        let mut generate = GenerateRequest::new(image, prompt);
        if self.config.structured_output {
            generate = generate.with_response_schema(response_schema());
        }
        if let Some(temperature) = self.config.temperature {
            generate = generate.with_temperature(temperature);
        }

        let response = self.generate_with_retry(generate).await?;
        let text = response.text.ok_or_else(|| {
            Error::parse_failed("model reply carried no text")
                .with_operation("solver::solve")
                .with_context("model", response.model.clone())
        })?;

        let records = parse_reply(&text).map_err(|e| e.with_operation("solver::solve"))?;
        tracing::info!(
            records = records.len(),
            assignments = records.iter().filter(|r| r.is_assignment).count(),
            variables = request.variables.len(),
            "solved snapshot"
        );
        Ok(records)
    }

    async fn generate_with_retry(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let outcome =
                tokio::time::timeout(self.config.timeout, self.model.generate(request.clone())).await;

            let err = match outcome {
                Ok(Ok(response)) => {
                    tracing::debug!(
                        provider = self.model.name(),
                        attempt,
                        prompt_tokens = response.usage.prompt_tokens,
                        completion_tokens = response.usage.completion_tokens,
                        "model call succeeded"
                    );
                    return Ok(response);
                }
                Ok(Err(provider_err)) => Error::from(provider_err),
                Err(_elapsed) => Error::timeout(self.config.timeout.as_millis()),
            }
            .with_operation("solver::generate")
            .with_context("provider", self.model.name())
            .with_context("attempt", attempt.to_string());

            if err.is_retryable() && attempt <= self.config.max_retries {
                tracing::warn!(error = %err, backoff_ms = self.config.retry_backoff.as_millis() as u64, "retrying model call");
                tokio::time::sleep(self.config.retry_backoff).await;
                continue;
            }

            return Err(if err.is_retryable() { err.persist() } else { err });
        }
    }
}

/// Validate the image payload and strip any data-URI prefix.
///
/// Accepts `data:<mime>;base64,<payload>` or a bare base64 string. The mime
/// type comes from the prefix when it names an image, else `image/png`.
pub fn inline_image(raw: Option<&str>) -> Result<InlineImage> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid_input("image", "request is missing an image payload"))?;

    let (mime_type, data) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| invalid_input("image", "data URI has no payload separator"))?;
            let mime = header.split(';').next().unwrap_or_default().trim();
            let mime = if mime.starts_with("image/") { mime } else { DEFAULT_MIME };
            (mime.to_string(), data.trim())
        }
        None => (DEFAULT_MIME.to_string(), raw),
    };

    if data.is_empty() {
        return Err(invalid_input("image", "image payload is empty"));
    }

    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| invalid_input("image", "image payload is not valid base64").set_source(e))?;

    Ok(InlineImage {
        mime_type,
        data: data.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ErrorStatus};
    use crate::provider::{ProviderError, ScriptedModel};
    use crate::schema::VariableMap;
    use std::time::Duration;

    const PNG: &str = "iVBORw0KGgo=";

    fn solver(model: ScriptedModel) -> Solver<ScriptedModel> {
        Solver::new(
            model,
            SolverConfig::default().with_retries(1, Duration::from_millis(1)),
        )
    }

    fn request(image: &str) -> SolveRequest {
        SolveRequest::new(image, VariableMap::new())
    }

    #[test]
    fn test_inline_image_strips_data_uri() {
        let image = inline_image(Some(&format!("data:image/png;base64,{}", PNG))).unwrap();
        assert_eq!(image, InlineImage::png(PNG));

        let image = inline_image(Some(&format!("data:image/jpeg;base64,{}", PNG))).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");

        // canvas.toDataURL("img/png") falls back to PNG but keeps the odd label
        let image = inline_image(Some(&format!("data:img/png;base64,{}", PNG))).unwrap();
        assert_eq!(image.mime_type, "image/png");

        let image = inline_image(Some(PNG)).unwrap();
        assert_eq!(image.data, PNG);
    }

    #[test]
    fn test_inline_image_rejects_bad_payloads() {
        for raw in [None, Some(""), Some("data:image/png;base64,"), Some("data:image/png"), Some("not base64!")] {
            let err = inline_image(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "payload {:?}", raw);
        }
    }

    #[tokio::test]
    async fn test_missing_image_makes_no_call() {
        let solver = solver(ScriptedModel::replying("[]"));
        let err = solver.solve(SolveRequest::default()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(solver.model().calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_sent_without_variables() {
        let solver = solver(ScriptedModel::replying(r#"[{"expr": "2+2", "result": "4"}]"#));
        let records = solver
            .solve(request(&format!("data:image/png;base64,{}", PNG)))
            .await
            .unwrap();

        assert_eq!(records, vec![SolveResultRecord::new("2+2", "4")]);
        let sent = solver.model().last_request().unwrap();
        assert_eq!(sent.image.data, PNG);
        assert!(sent.prompt.contains("{}"));
        assert!(sent.response_schema.is_some());
    }

    #[tokio::test]
    async fn test_variables_reach_prompt() {
        let solver = solver(ScriptedModel::replying(r#"[{"expr": "x + 1", "result": "3"}]"#));
        let vars: VariableMap = [("x", "2")].into_iter().collect();
        solver.solve(SolveRequest::new(PNG, vars)).await.unwrap();

        let sent = solver.model().last_request().unwrap();
        assert!(sent.prompt.contains(r#"{"x":"2"}"#));
    }

    #[tokio::test]
    async fn test_structured_output_can_be_disabled() {
        let model = ScriptedModel::replying(r#"[{"expr": "1", "result": "1"}]"#);
        let solver = Solver::new(model, SolverConfig::default().with_structured_output(false));
        solver.solve(request(PNG)).await.unwrap();

        assert!(solver.model().last_request().unwrap().response_schema.is_none());
    }

    #[tokio::test]
    async fn test_temperature_forwarded_when_configured() {
        let solver = solver(ScriptedModel::replying(r#"[{"expr": "1", "result": "1"}]"#));
        solver.solve(request(PNG)).await.unwrap();
        assert_eq!(solver.model().last_request().unwrap().temperature, None);

        let model = ScriptedModel::replying(r#"[{"expr": "1", "result": "1"}]"#);
        let solver = Solver::new(model, SolverConfig::default().with_temperature(0.1));
        solver.solve(request(PNG)).await.unwrap();
        assert_eq!(solver.model().last_request().unwrap().temperature, Some(0.1));
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let model = ScriptedModel::new()
            .then_fail(ProviderError::Network("connection reset".into()))
            .then_reply(r#"[{"expr": "3*4", "result": "12"}]"#);
        let solver = solver(model);

        let records = solver.solve(request(PNG)).await.unwrap();
        assert_eq!(records[0].result, "12");
        assert_eq!(solver.model().calls(), 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted_marks_persistent() {
        let model = ScriptedModel::new()
            .then_fail(ProviderError::RateLimited { retry_after: None })
            .then_fail(ProviderError::RateLimited { retry_after: None })
            .then_reply("[]");
        let solver = solver(model);

        let err = solver.solve(request(PNG)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.status(), ErrorStatus::Persistent);
        assert_eq!(solver.model().calls(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let model = ScriptedModel::new()
            .then_fail(ProviderError::Api { status: 400, message: "bad request".into() })
            .then_reply("[]");
        let solver = solver(model);

        let err = solver.solve(request(PNG)).await.unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_ERROR");
        assert_eq!(solver.model().calls(), 1);
    }

    #[tokio::test]
    async fn test_timeout() {
        let model = ScriptedModel::replying("[]").with_delay(Duration::from_millis(500));
        let solver = Solver::new(
            model,
            SolverConfig::default()
                .with_timeout(Duration::from_millis(20))
                .with_retries(0, Duration::from_millis(1)),
        );

        let err = solver.solve(request(PNG)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.code(), "TIMEOUT");
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_parse_error() {
        let solver = solver(ScriptedModel::replying("[{\"expr\": \"2+"));
        let err = solver.solve(request(PNG)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert_eq!(solver.model().calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_reply_text_is_parse_error() {
        let solver = solver(ScriptedModel::new().then_empty());
        let err = solver.solve(request(PNG)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
    }
}
