use std::time::{Duration, Instant};

use asistan_core::error::Result;
use asistan_core::time::local_now;
use asistan_core::types::{ChatMessage, ChatRequest, Message};
use asistan_llm::provider::LlmProvider;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::Brain;
use crate::texts;

const EDIT_INTERVAL: Duration = Duration::from_secs(1);
const PLACEHOLDER: &str = "💭 ...";

/// System prompt, then stored history, then the new user turn.
fn build_messages(system_prompt: &str, now: &str, history: &[Message], text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::text(
        "system",
        format!("{system_prompt}\n\nŞu anki tarih ve saat: {now}"),
    ));
    messages.extend(
        history
            .iter()
            .map(|m| ChatMessage::text(m.role.clone(), m.content.clone())),
    );
    messages.push(ChatMessage::text("user", text));
    messages
}

impl Brain {
    /// Free-form chat. The answer streams into a placeholder message that is
    /// edited at most once per second, then formatted once complete.
    pub(crate) async fn handle_chat(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.config.llm.api_key.is_empty() {
            self.bot
                .send_message_with_keyboard(chat_id, texts::NOT_UNDERSTOOD, &texts::help_menu())
                .await?;
            return Ok(());
        }

        let conversation = self.store.get_or_create_conversation(chat_id).await?;
        let history = self
            .store
            .recent_messages(conversation.id, self.config.llm.history_window)
            .await?;

        let now = local_now(self.tz()).format("%d.%m.%Y %H:%M").to_string();
        let request = ChatRequest {
            messages: build_messages(&self.config.llm.system_prompt, &now, &history, text),
            max_tokens: Some(2048),
            temperature: Some(0.7),
        };

        let _ = self.bot.send_typing(chat_id).await;
        let msg_id = self.bot.send_message_with_id(chat_id, PLACEHOLDER).await?;

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let relay = async {
            let mut accumulated = String::new();
            let mut last_edit = Instant::now();
            while let Some(chunk) = rx.recv().await {
                accumulated.push_str(&chunk);
                if last_edit.elapsed() >= EDIT_INTERVAL {
                    let _ = self.bot.edit_message(chat_id, msg_id, &accumulated).await;
                    last_edit = Instant::now();
                }
            }
            accumulated
        };
        let (result, accumulated) = tokio::join!(self.llm.chat_stream(request, tx), relay);

        let answer = match result {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    info!(
                        input = usage.input_tokens,
                        output = usage.output_tokens,
                        "[llm] tokens"
                    );
                }
                if accumulated.is_empty() {
                    response.content
                } else {
                    accumulated
                }
            }
            Err(e) => {
                warn!(chat_id, error = %e, "[llm] chat failed");
                String::new()
            }
        };

        if answer.trim().is_empty() {
            self.bot.edit_message(chat_id, msg_id, texts::APOLOGY).await?;
            return Ok(());
        }

        self.bot
            .edit_message_formatted(chat_id, msg_id, &answer, None)
            .await?;
        info!(chat_id, chars = answer.chars().count(), "[send] chat reply");

        self.store.insert_message(conversation.id, "user", text).await?;
        self.store
            .insert_message(conversation.id, "assistant", &answer)
            .await?;
        Ok(())
    }

    /// Later chat turns will not see anything said before this point.
    pub(crate) async fn reset_chat(&self, chat_id: i64) -> Result<()> {
        let conversation = self.store.create_new_conversation(chat_id).await?;
        info!(chat_id, conversation_id = conversation.id, "chat reset");
        self.bot.send_message(chat_id, texts::CHAT_RESET).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(role: &str, content: &str) -> Message {
        Message {
            id: 0,
            conversation_id: 1,
            role: role.to_string(),
            content: content.to_string(),
            created_at: 0,
        }
    }

    #[test]
    fn test_build_messages_order() {
        let history = vec![stored("user", "merhaba"), stored("assistant", "selam!")];
        let messages = build_messages("Asistansın.", "11.03.2025 14:30", &history, "nasılsın?");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.starts_with("Asistansın."));
        assert!(messages[0].content.contains("11.03.2025 14:30"));
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].role, "user");
        assert_eq!(messages[3].content, "nasılsın?");
    }
}
