use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::LlmConfig;

const SYSTEM_PROMPT: &str =
    "You are a SQL expert. Generate only valid SQL queries without explanations.";

/// Failures of a single generation call
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM not available. Please configure LLM_API_KEY.")]
    NotConfigured,

    #[error("failed to call LLM service: {0}")]
    Transport(String),

    #[error("LLM service returned error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed LLM response stream: {0}")]
    MalformedStream(String),

    #[error("LLM service did not respond within {0} seconds")]
    Timeout(u64),

    #[error("LLM response stream contained no content")]
    EmptyResponse,
}

/// Language-model seam of the translation pipeline
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Whether a credential is configured. No call is attempted otherwise.
    fn is_available(&self) -> bool;

    fn model(&self) -> &str;

    /// Complete `prompt`, returning the whole response text
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Streaming client for an OpenAI-compatible chat-completions endpoint
pub struct LlmService {
    api_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    max_tokens: u32,
    timeout: Duration,
    http_client: HttpClient,
}

impl LlmService {
    pub fn new(config: &LlmConfig) -> Self {
        let http_client = HttpClient::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                HttpClient::new()
            });

        Self {
            api_url: config.api_url.clone(),
            api_key: config.credential().map(str::to_string),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
            http_client,
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "top_p": 0.95,
            "stream": true
        })
    }

    async fn stream_completion(&self, api_key: &str, prompt: &str) -> Result<String, GenerationError> {
        tracing::debug!(
            "LLM request: model={}, prompt_bytes={}, max_tokens={}",
            self.model,
            prompt.len(),
            self.max_tokens
        );

        let response = self
            .http_client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = extract_api_error(&body).unwrap_or(body);
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message,
            });
        }

        collect_event_stream(response.bytes_stream()).await
    }
}

#[async_trait]
impl GenerationClient for LlmService {
    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::NotConfigured)?;

        tokio::time::timeout(self.timeout, self.stream_completion(api_key, prompt))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout.as_secs()))?
    }
}

/// Outcome of one server-sent-event line
#[derive(Debug, PartialEq)]
enum SseEvent {
    Delta(String),
    Done,
    Skip,
}

fn parse_event_line(line: &str) -> Result<SseEvent, GenerationError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return Ok(SseEvent::Skip);
    }

    let Some(data) = line.strip_prefix("data:") else {
        // event:/id:/retry: fields carry nothing we need
        return Ok(SseEvent::Skip);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let parsed: Value = serde_json::from_str(data)
        .map_err(|e| GenerationError::MalformedStream(format!("invalid event payload: {}", e)))?;

    if let Some(message) = parsed["error"]["message"].as_str() {
        return Err(GenerationError::MalformedStream(message.to_string()));
    }

    match parsed["choices"][0]["delta"]["content"].as_str() {
        Some(delta) => Ok(SseEvent::Delta(delta.to_string())),
        None => Ok(SseEvent::Skip),
    }
}

/// Concatenate every content fragment of an event stream in arrival order.
///
/// Nothing is returned until the stream ends or sends `[DONE]`.
pub async fn collect_event_stream<S, B, E>(stream: S) -> Result<String, GenerationError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut pending: Vec<u8> = Vec::new();
    let mut text = String::new();
    let mut fragments = 0usize;
    let mut done = false;

    'read: while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| GenerationError::Transport(format!("stream error: {}", e)))?;
        pending.extend_from_slice(bytes.as_ref());

        while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            let line = std::str::from_utf8(&line)
                .map_err(|e| GenerationError::MalformedStream(e.to_string()))?;
            match parse_event_line(line)? {
                SseEvent::Delta(delta) => {
                    fragments += 1;
                    text.push_str(&delta);
                }
                SseEvent::Done => {
                    done = true;
                    break 'read;
                }
                SseEvent::Skip => {}
            }
        }
    }

    // An unterminated last line only counts when the stream ended without [DONE]
    if !done && !pending.is_empty() {
        let line = std::str::from_utf8(&pending)
            .map_err(|e| GenerationError::MalformedStream(e.to_string()))?;
        if let SseEvent::Delta(delta) = parse_event_line(line)? {
            fragments += 1;
            text.push_str(&delta);
        }
    }

    tracing::debug!("LLM stream assembled: {} fragments, {} bytes", fragments, text.len());

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

fn extract_api_error(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed["error"]["message"].as_str().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sse_chunk(delta: &str) -> String {
        format!(
            "data: {}\n\n",
            json!({ "choices": [ { "delta": { "content": delta } } ] })
        )
    }

    fn byte_chunks(parts: Vec<String>) -> impl Stream<Item = Result<Vec<u8>, String>> {
        stream::iter(parts.into_iter().map(|p| Ok(p.into_bytes())))
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1/chat/completions", addr)
    }

    fn service_for(url: String, api_key: Option<&str>) -> LlmService {
        let mut config = test_config().llm;
        config.api_url = url;
        config.api_key = api_key.map(str::to_string);
        config.timeout_secs = 5;
        LlmService::new(&config)
    }

    #[tokio::test]
    async fn test_collect_concatenates_in_order() {
        let parts = vec![
            ": keep-alive\n".to_string(),
            sse_chunk("SELECT "),
            sse_chunk("* FROM "),
            sse_chunk("t"),
            "data: [DONE]\n\n".to_string(),
            sse_chunk(" ignored"),
        ];
        let text = collect_event_stream(byte_chunks(parts)).await.unwrap();
        assert_eq!(text, "SELECT * FROM t");
    }

    #[tokio::test]
    async fn test_collect_stops_at_done_within_one_chunk() {
        let two_trailing = format!(
            "{}data: [DONE]\n\n{}{}",
            sse_chunk("SELECT 1"),
            sse_chunk(" TRAILING"),
            sse_chunk(" MORE").trim_end()
        );
        assert_eq!(
            collect_event_stream(byte_chunks(vec![two_trailing])).await.unwrap(),
            "SELECT 1"
        );

        let one_trailing = format!(
            "{}data: [DONE]\n\n{}",
            sse_chunk("SELECT 1"),
            sse_chunk(" TRAILING").trim_end()
        );
        assert_eq!(
            collect_event_stream(byte_chunks(vec![one_trailing])).await.unwrap(),
            "SELECT 1"
        );
    }

    #[tokio::test]
    async fn test_collect_handles_split_lines() {
        let whole = format!("{}{}data: [DONE]\n", sse_chunk("SELECT "), sse_chunk("1"));
        let (a, b) = whole.split_at(17);
        let (b, c) = b.split_at(9);
        let parts = vec![a.to_string(), b.to_string(), c.to_string()];
        assert_eq!(collect_event_stream(byte_chunks(parts)).await.unwrap(), "SELECT 1");
    }

    #[tokio::test]
    async fn test_collect_without_done_marker() {
        let parts = vec![sse_chunk("SELECT 1")];
        assert_eq!(collect_event_stream(byte_chunks(parts)).await.unwrap(), "SELECT 1");
    }

    #[tokio::test]
    async fn test_collect_rejects_malformed_payload() {
        let parts = vec![sse_chunk("SELECT "), "data: {not json\n".to_string()];
        let err = collect_event_stream(byte_chunks(parts)).await.unwrap_err();
        assert!(matches!(err, GenerationError::MalformedStream(_)));
    }

    #[tokio::test]
    async fn test_collect_surfaces_in_stream_error() {
        let parts = vec![format!(
            "data: {}\n",
            json!({ "error": { "message": "rate limited" } })
        )];
        let err = collect_event_stream(byte_chunks(parts)).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_collect_transport_error() {
        let parts: Vec<Result<Vec<u8>, String>> = vec![
            Ok(sse_chunk("SELECT").into_bytes()),
            Err("connection reset".to_string()),
        ];
        let err = collect_event_stream(stream::iter(parts)).await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)));
    }

    #[tokio::test]
    async fn test_collect_empty_stream() {
        let err = collect_event_stream(byte_chunks(vec!["data: [DONE]\n".to_string()]))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_generate_without_credential_fails_fast() {
        let service = service_for("http://127.0.0.1:9/unreachable".to_string(), None);
        assert!(!service.is_available());
        let err = service.generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured));
    }

    #[tokio::test]
    async fn test_generate_streams_from_server() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: axum::http::HeaderMap, Json(body): Json<Value>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(headers["authorization"], "Bearer test-key");
                    assert_eq!(body["stream"], true);
                    assert_eq!(body["messages"][1]["content"], "the prompt");
                    assert_eq!(body["temperature"].as_f64(), Some(0.2));
                    format!(
                        "{}{}data: [DONE]\n\n",
                        sse_chunk("```sql\nSELECT 1"),
                        sse_chunk("\n```")
                    )
                }
            }),
        );
        let service = service_for(serve(app).await, Some("test-key"));

        let text = service.generate("the prompt").await.unwrap();
        assert_eq!(text, "```sql\nSELECT 1\n```");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_reports_status_error() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": { "message": "Invalid API Key" } })),
                )
            }),
        );
        let service = service_for(serve(app).await, Some("bad-key"));

        match service.generate("prompt").await.unwrap_err() {
            GenerationError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API Key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_times_out() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "data: [DONE]\n"
            }),
        );
        let mut service = service_for(serve(app).await, Some("key"));
        service.timeout = Duration::from_millis(200);

        let err = service.generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(_)));
    }

    #[test]
    fn test_parse_event_line() {
        assert_eq!(parse_event_line("").unwrap(), SseEvent::Skip);
        assert_eq!(parse_event_line(": ping").unwrap(), SseEvent::Skip);
        assert_eq!(parse_event_line("event: message").unwrap(), SseEvent::Skip);
        assert_eq!(parse_event_line("data: [DONE]").unwrap(), SseEvent::Done);
        assert_eq!(
            parse_event_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(),
            SseEvent::Skip
        );
        assert_eq!(
            parse_event_line(r#"data:{"choices":[{"delta":{"content":"x"}}]}"#).unwrap(),
            SseEvent::Delta("x".to_string())
        );
    }

    #[test]
    fn test_extract_api_error() {
        assert_eq!(
            extract_api_error(r#"{"error":{"message":"quota"}}"#).as_deref(),
            Some("quota")
        );
        assert!(extract_api_error("plain text").is_none());
    }
}
