use asistan_core::error::{AsistanError, Result};
use asistan_core::types::{ChatRequest, ChatResponse, Usage};
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::debug;

use crate::provider::LlmProvider;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const PROVIDER: &str = "gemini";

/// Google Gemini (generative-language API) chat provider.
pub struct GeminiLlm {
    client: Client,
    api_key: String,
    model: String,
}

fn llm_err(message: impl Into<String>) -> AsistanError {
    AsistanError::Llm {
        provider: PROVIDER.to_string(),
        message: message.into(),
    }
}

impl GeminiLlm {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }

    fn url(&self, method: &str) -> String {
        let sse = if method == "streamGenerateContent" { "&alt=sse" } else { "" };
        format!(
            "{GEMINI_BASE_URL}/models/{}:{method}?key={}{sse}",
            self.model, self.api_key
        )
    }

    /// System messages become `systemInstruction`; "assistant" maps to Gemini's "model" role.
    fn build_body(request: &ChatRequest) -> Value {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect();

        let contents: Vec<Value> = request
            .messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| {
                let role = if m.role == "assistant" { "model" } else { "user" };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        let mut body = json!({ "contents": contents });

        if !system.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system.join("\n\n") }] });
        }

        let mut generation = serde_json::Map::new();
        if let Some(temp) = request.temperature {
            generation.insert("temperature".to_string(), json!(temp));
        }
        if let Some(max_tokens) = request.max_tokens {
            generation.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        if !generation.is_empty() {
            body["generationConfig"] = Value::Object(generation);
        }

        body
    }

    async fn post(&self, method: &str, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| llm_err(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AsistanError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Concatenated text of the first candidate, if any.
fn candidate_text(parsed: &Value) -> Option<String> {
    let parts = parsed["candidates"].get(0)?["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    Some(text)
}

fn usage_of(parsed: &Value) -> Option<Usage> {
    let meta = &parsed["usageMetadata"];
    Some(Usage {
        input_tokens: meta["promptTokenCount"].as_u64()? as u32,
        output_tokens: meta["candidatesTokenCount"].as_u64()? as u32,
    })
}

impl LlmProvider for GeminiLlm {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let response = self.post("generateContent", &Self::build_body(&request)).await?;
        let parsed: Value = response
            .json()
            .await
            .map_err(|e| llm_err(format!("failed to parse response JSON: {e}")))?;

        let content = candidate_text(&parsed)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| llm_err("response has no candidate text"))?;

        Ok(ChatResponse {
            content,
            usage: usage_of(&parsed),
        })
    }

    async fn chat_stream(
        &self,
        request: ChatRequest,
        tx: mpsc::UnboundedSender<String>,
    ) -> Result<ChatResponse> {
        let response = self
            .post("streamGenerateContent", &Self::build_body(&request))
            .await?;

        let mut stream = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::new();
        let mut buffer = String::new();
        let mut content = String::new();
        let mut usage = None;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| llm_err(format!("stream read error: {e}")))?;
            pending.extend_from_slice(&chunk);
            push_utf8(&mut pending, &mut buffer);

            for event in drain_sse_events(&mut buffer) {
                if let Some(text) = candidate_text(&event).filter(|t| !t.is_empty()) {
                    content.push_str(&text);
                    let _ = tx.send(text);
                }
                if let Some(u) = usage_of(&event) {
                    usage = Some(u);
                }
            }
        }

        debug!(chars = content.len(), "[gemini] stream finished");
        if content.is_empty() {
            return Err(llm_err("stream produced no text"));
        }
        Ok(ChatResponse { content, usage })
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Move the complete UTF-8 prefix of `pending` into `buffer`.
///
/// A multi-byte character split across network chunks stays in `pending`.
fn push_utf8(pending: &mut Vec<u8>, buffer: &mut String) {
    let valid = match std::str::from_utf8(pending) {
        Ok(text) => text.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => {
            buffer.push_str(&String::from_utf8_lossy(pending));
            pending.clear();
            return;
        }
    };
    if let Ok(text) = std::str::from_utf8(&pending[..valid]) {
        buffer.push_str(text);
    }
    pending.drain(..valid);
}

/// Pop every complete `data: {...}` event off the front of `buffer`.
///
/// Whatever is left is an incomplete event waiting for more bytes.
fn drain_sse_events(buffer: &mut String) -> Vec<Value> {
    let mut events = Vec::new();

    while let Some(start) = buffer.find("data: ") {
        let json_start = start + "data: ".len();
        let json_end = buffer[json_start..]
            .find("\n\n")
            .or_else(|| buffer[json_start..].find("\r\n\r\n"))
            .map_or(buffer.len(), |pos| json_start + pos);

        let payload = buffer[json_start..json_end].trim();
        if payload.is_empty() || !is_balanced_json(payload) {
            break;
        }
        if let Ok(value) = serde_json::from_str(payload) {
            events.push(value);
        }
        buffer.replace_range(..json_end, "");
    }

    events
}

/// Brackets balance outside string literals.
fn is_balanced_json(s: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for ch in s.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            _ => {}
        }
    }
    depth == 0 && !in_string
}

#[cfg(test)]
mod tests {
    use super::*;
    use asistan_core::types::ChatMessage;

    #[test]
    fn test_push_utf8_keeps_split_character() {
        let bytes = "çay".as_bytes();
        let mut pending = bytes[..1].to_vec();
        let mut buffer = String::new();

        push_utf8(&mut pending, &mut buffer);
        assert_eq!(buffer, "");
        assert_eq!(pending.len(), 1);

        pending.extend_from_slice(&bytes[1..]);
        push_utf8(&mut pending, &mut buffer);
        assert_eq!(buffer, "çay");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_build_body_maps_roles_and_system() {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::text("system", "Türkçe cevap ver"),
                ChatMessage::text("user", "merhaba"),
                ChatMessage::text("assistant", "selam"),
            ],
            max_tokens: Some(512),
            temperature: None,
        };
        let body = GeminiLlm::build_body(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Türkçe cevap ver");
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        assert!(body["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn test_build_body_without_options() {
        let request = ChatRequest {
            messages: vec![ChatMessage::text("user", "selam")],
            max_tokens: None,
            temperature: None,
        };
        let body = GeminiLlm::build_body(&request);
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_balanced_json() {
        assert!(is_balanced_json(r#"{"a": [1, 2]}"#));
        assert!(is_balanced_json(r#"{"a": "}{ \" ]"}"#));
        assert!(!is_balanced_json(r#"{"a": [1, 2"#));
        assert!(!is_balanced_json(r#"{"a": "open"#));
    }

    #[test]
    fn test_drain_sse_keeps_partial_event() {
        let mut buffer = String::from(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Mer\"}]}}]}\r\n\r\n\
             data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ha",
        );
        let events = drain_sse_events(&mut buffer);
        assert_eq!(events.len(), 1);
        assert_eq!(candidate_text(&events[0]).as_deref(), Some("Mer"));
        assert!(buffer.contains("\"ha"));

        buffer.push_str("ba\"}]}}],\"usageMetadata\":{\"promptTokenCount\":4,\"candidatesTokenCount\":2}}\n\n");
        let events = drain_sse_events(&mut buffer);
        assert_eq!(events.len(), 1);
        assert_eq!(candidate_text(&events[0]).as_deref(), Some("haba"));
        let usage = usage_of(&events[0]).unwrap();
        assert_eq!((usage.input_tokens, usage.output_tokens), (4, 2));
    }
}
