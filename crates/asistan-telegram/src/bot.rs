use asistan_core::error::{AsistanError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::warn;

use crate::types::*;

const MAX_MESSAGE_LENGTH: usize = 4096;

pub struct TelegramBot {
    client: Client,
    base_url: String,
    allowed_user_ids: Vec<i64>,
}

impl TelegramBot {
    /// `allowed_user_ids` empty means every user is accepted.
    pub fn new(token: &str, allowed_user_ids: Vec<i64>) -> Self {
        Self::with_base_url(format!("https://api.telegram.org/bot{token}"), allowed_user_ids)
    }

    pub fn with_base_url(base_url: String, allowed_user_ids: Vec<i64>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            allowed_user_ids,
        }
    }

    /// POST a Bot API method and unwrap the `{ok, result}` envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| AsistanError::Telegram(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AsistanError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: TelegramResponse<T> = response
            .json()
            .await
            .map_err(|e| AsistanError::Telegram(e.to_string()))?;

        if !envelope.ok {
            return Err(AsistanError::Telegram(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        envelope
            .result
            .ok_or_else(|| AsistanError::Telegram(format!("missing result in {method} response")))
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &json!({})).await
    }

    /// Long-poll for messages and button presses.
    pub async fn get_updates(&self, offset: i64, timeout: u32) -> Result<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": timeout,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call("getUpdates", &body).await
    }

    /// Send Markdown text as Telegram HTML, split into chunks under the length limit.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in split_message(text) {
            self.send_formatted(chat_id, &chunk, None).await?;
        }
        Ok(())
    }

    /// Send a single message with an inline keyboard under it.
    pub async fn send_message_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<i64> {
        self.send_formatted(chat_id, text, Some(keyboard)).await
    }

    /// Sends as HTML and retries as plain text when Telegram rejects the markup.
    async fn send_formatted(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<i64> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": markdown_to_html(text),
            "parse_mode": "HTML",
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = json!(keyboard);
        }

        match self.call::<TelegramMessage>("sendMessage", &body).await {
            Ok(sent) => Ok(sent.message_id),
            Err(AsistanError::Http { status: 400, body: reason }) if reason.contains("parse") => {
                warn!(chat_id, %reason, "[send] html rejected, retrying as plain text");
                body["text"] = json!(text);
                if let Some(obj) = body.as_object_mut() {
                    obj.remove("parse_mode");
                }
                let sent: TelegramMessage = self.call("sendMessage", &body).await?;
                Ok(sent.message_id)
            }
            Err(e) => Err(e),
        }
    }

    /// Send plain text and return the message id, for later editing.
    pub async fn send_message_with_id(&self, chat_id: i64, text: &str) -> Result<i64> {
        let body = json!({ "chat_id": chat_id, "text": text });
        let sent: TelegramMessage = self.call("sendMessage", &body).await?;
        Ok(sent.message_id)
    }

    /// Replace a message's text as plain text. Used while a reply is streaming in.
    pub async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        self.edit(body).await
    }

    /// Replace a message's text with formatted Markdown, optionally swapping its keyboard.
    pub async fn edit_message_formatted(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": markdown_to_html(text),
            "parse_mode": "HTML",
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = json!(keyboard);
        }

        match self.edit(body).await {
            Err(AsistanError::Http { status: 400, .. }) => {
                self.edit_message(chat_id, message_id, text).await
            }
            other => other,
        }
    }

    async fn edit(&self, body: Value) -> Result<()> {
        match self.call::<Value>("editMessageText", &body).await {
            Ok(_) => Ok(()),
            Err(AsistanError::Http { body, .. }) if body.contains("message is not modified") => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Acknowledge a button press so the client stops its loading spinner.
    pub async fn answer_callback_query(&self, callback_query_id: &str, text: Option<&str>) -> Result<()> {
        let mut body = json!({ "callback_query_id": callback_query_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call::<bool>("answerCallbackQuery", &body).await.map(|_| ())
    }

    pub async fn send_typing(&self, chat_id: i64) -> Result<()> {
        let body = json!({ "chat_id": chat_id, "action": "typing" });
        self.call::<bool>("sendChatAction", &body).await.map(|_| ())
    }

    /// Register bot commands so they appear in the command menu.
    pub async fn set_my_commands(&self, commands: &[(&str, &str)]) -> Result<()> {
        let commands: Vec<Value> = commands
            .iter()
            .map(|(command, description)| json!({ "command": command, "description": description }))
            .collect();
        self.call::<bool>("setMyCommands", &json!({ "commands": commands }))
            .await
            .map(|_| ())
    }

    pub fn is_authorized(&self, user_id: i64) -> bool {
        self.allowed_user_ids.is_empty() || self.allowed_user_ids.contains(&user_id)
    }
}

/// Convert Markdown to the HTML subset Telegram accepts.
///
/// Telegram supports `<b>`, `<i>`, `<s>`, `<code>`, `<pre>`, `<a href>` and
/// `<blockquote>`. Headings render as bold lines.
pub fn markdown_to_html(text: &str) -> String {
    use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

    let mut html = String::with_capacity(text.len() + 64);

    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { .. } => html.push_str("<b>"),
                Tag::Strong => html.push_str("<b>"),
                Tag::Emphasis => html.push_str("<i>"),
                Tag::Strikethrough => html.push_str("<s>"),
                Tag::BlockQuote(_) => html.push_str("<blockquote>"),
                Tag::CodeBlock(CodeBlockKind::Fenced(lang)) if !lang.is_empty() => {
                    html.push_str(&format!("<pre><code class=\"language-{}\">", html_escape(&lang)));
                }
                Tag::CodeBlock(_) => html.push_str("<pre><code>"),
                Tag::Link { dest_url, .. } => {
                    html.push_str(&format!("<a href=\"{}\">", html_escape(&dest_url)));
                }
                Tag::List(_) => html.push('\n'),
                Tag::Item => html.push_str("• "),
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Heading(_) => html.push_str("</b>\n"),
                TagEnd::Paragraph => html.push_str("\n\n"),
                TagEnd::Strong => html.push_str("</b>"),
                TagEnd::Emphasis => html.push_str("</i>"),
                TagEnd::Strikethrough => html.push_str("</s>"),
                TagEnd::BlockQuote(_) => html.push_str("</blockquote>"),
                TagEnd::CodeBlock => html.push_str("</code></pre>"),
                TagEnd::Link => html.push_str("</a>"),
                TagEnd::Item => html.push('\n'),
                _ => {}
            },
            Event::Text(t) => html.push_str(&html_escape(&t)),
            Event::Code(code) => {
                html.push_str("<code>");
                html.push_str(&html_escape(&code));
                html.push_str("</code>");
            }
            Event::SoftBreak | Event::HardBreak => html.push('\n'),
            Event::Rule => html.push_str("\n———\n"),
            _ => {}
        }
    }

    html.trim().to_string()
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Split on the last newline before the limit, or at a char boundary if there is none.
fn split_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.len() > MAX_MESSAGE_LENGTH {
        let mut limit = MAX_MESSAGE_LENGTH;
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }
        let split_at = remaining[..limit].rfind('\n').map_or(limit, |pos| pos + 1);
        chunks.push(remaining[..split_at].to_string());
        remaining = &remaining[split_at..];
    }
    if !remaining.is_empty() || chunks.is_empty() {
        chunks.push(remaining.to_string());
    }

    chunks
}
