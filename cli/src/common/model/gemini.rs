//! # Gemini REST Client
//!
//! File: cli/src/common/model/gemini.rs
//!
//! ## Overview
//!
//! Implements [`ModelClient`] against
//! `POST {base_url}/v1beta/models/{model}:generateContent`, authenticating with
//! the `x-goog-api-key` header.
//!
//! Request body:
//!
//! ```json
//! {
//!   "systemInstruction": { "parts": [{ "text": "..." }] },
//!   "contents": [{ "role": "user", "parts": [{ "text": "..." }] }]
//! }
//! ```
//!
//! The answer is the concatenation of the `text` parts of the first candidate.
//!
use super::ModelClient;
use crate::core::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    /// Builds a client. Fails with [`ModelError::MissingApiKey`] when the key is
    /// absent or blank.
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
    ) -> std::result::Result<Self, ModelError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ModelError::MissingApiKey)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client: Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

fn request_body(content: &str, instruction: Option<&str>) -> Value {
    let mut body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": content }] }],
    });
    if let (Some(instruction), Some(obj)) = (instruction, body.as_object_mut()) {
        obj.insert(
            "systemInstruction".to_string(),
            json!({ "parts": [{ "text": instruction }] }),
        );
    }
    body
}

fn extract_answer(payload: Value) -> std::result::Result<String, ModelError> {
    let response: GenerateResponse = serde_json::from_value(payload)
        .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;
    let answer: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if answer.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(answer)
}

#[async_trait]
impl ModelClient for GeminiClient {
    #[instrument(skip(self, content, instruction), fields(model = %self.model))]
    async fn generate(
        &self,
        content: &str,
        instruction: Option<&str>,
    ) -> std::result::Result<String, ModelError> {
        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(content, instruction))
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;
        debug!("Received generateContent response");
        extract_answer(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            GeminiClient::new("https://example.test", "m", None),
            Err(ModelError::MissingApiKey)
        ));
        assert!(matches!(
            GeminiClient::new("https://example.test", "m", Some("  ".into())),
            Err(ModelError::MissingApiKey)
        ));
    }

    #[test]
    fn test_endpoint_and_debug_redaction() {
        let client =
            GeminiClient::new("https://example.test/", "gemini-2.5-flash", Some("secret".into()))
                .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(!format!("{:?}", client).contains("secret"));
    }

    #[test]
    fn test_request_body_with_and_without_instruction() {
        let plain = request_body("hello", None);
        assert_eq!(plain["contents"][0]["parts"][0]["text"], "hello");
        assert!(plain.get("systemInstruction").is_none());

        let steered = request_body("hello", Some("be brief"));
        assert_eq!(
            steered["systemInstruction"]["parts"][0]["text"],
            "be brief"
        );
    }

    #[test]
    fn test_extract_answer_concatenates_parts() {
        let payload = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Alice " }, { "text": "has an A." }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        });
        assert_eq!(extract_answer(payload).unwrap(), "Alice has an A.");
    }

    #[test]
    fn test_extract_answer_empty() {
        assert!(matches!(
            extract_answer(json!({ "candidates": [] })),
            Err(ModelError::EmptyResponse)
        ));
        assert!(matches!(
            extract_answer(json!({ "candidates": [{ "finishReason": "SAFETY" }] })),
            Err(ModelError::EmptyResponse)
        ));
        assert!(matches!(
            extract_answer(json!({ "candidates": "nope" })),
            Err(ModelError::MalformedResponse(_))
        ));
    }

    mod http {
        use super::*;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::task::JoinHandle;

        const ANSWER: &str = r#"{"candidates":[{"content":{"parts":[{"text":"Alice has an A."}]}}]}"#;

        /// Reads one HTTP request, headers and body.
        async fn read_request(stream: &mut TcpStream) -> String {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .to_ascii_lowercase()
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:").map(str::to_string))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            String::from_utf8_lossy(&buf).into_owned()
        }

        /// Serves a single canned response; the handle yields the raw request.
        async fn reply_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let handle = tokio::spawn(async move {
                let (mut stream, _) = listener.accept().await.unwrap();
                let request = read_request(&mut stream).await;
                let response = format!(
                    "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
                request
            });
            (base_url, handle)
        }

        fn client(base_url: &str) -> GeminiClient {
            GeminiClient::new(base_url, "test-model", Some("k123".into())).unwrap()
        }

        #[tokio::test]
        async fn test_generate_success() {
            let (base_url, server) = reply_once(200, ANSWER).await;
            let answer = client(&base_url)
                .generate("CONTEXT: x\n\nQUESTION: y", Some("be strict"))
                .await
                .unwrap();
            assert_eq!(answer, "Alice has an A.");

            let request = server.await.unwrap();
            let lowered = request.to_ascii_lowercase();
            assert!(lowered.starts_with("post /v1beta/models/test-model:generatecontent http/1.1"));
            assert!(lowered.contains("x-goog-api-key: k123"));
            assert!(request.contains("systemInstruction"));
            assert!(request.contains("be strict"));
        }

        #[tokio::test]
        async fn test_generate_without_instruction() {
            let (base_url, server) = reply_once(200, ANSWER).await;
            client(&base_url).generate("hello", None).await.unwrap();
            assert!(!server.await.unwrap().contains("systemInstruction"));
        }

        #[tokio::test]
        async fn test_generate_error_status() {
            let (base_url, _server) = reply_once(429, r#"{"error":"quota"}"#).await;
            let err = client(&base_url).generate("hello", None).await.unwrap_err();
            assert!(matches!(
                err,
                ModelError::Api { status: 429, ref body } if body == r#"{"error":"quota"}"#
            ));
        }

        #[tokio::test]
        async fn test_generate_garbage_body() {
            let (base_url, _server) = reply_once(200, "<html>oops</html>").await;
            let err = client(&base_url).generate("hello", None).await.unwrap_err();
            assert!(matches!(err, ModelError::MalformedResponse(_)));
        }

        #[tokio::test]
        async fn test_generate_unreachable() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            drop(listener);
            let err = client(&base_url).generate("hello", None).await.unwrap_err();
            assert!(matches!(err, ModelError::Transport(_)));
        }
    }
}
