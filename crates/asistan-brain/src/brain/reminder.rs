use asistan_core::error::Result;
use asistan_core::time::format_local;
use asistan_core::types::Reminder;
use asistan_nlu::ReminderRequest;
use asistan_telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{info, warn};

use super::Brain;
use crate::texts;

const EVENT_DESCRIPTION: &str = "Asistan hatırlatıcısı";

/// Whether the text left after removing the time is long enough to remind about.
fn is_meaningful(message: &str, min_chars: usize) -> bool {
    message.trim().chars().count() >= min_chars
}

fn format_pending(reminders: &[Reminder], tz: i32) -> String {
    let mut text = String::from("⏰ Bekleyen Hatırlatıcılar:\n\n");
    for reminder in reminders {
        text.push_str(&format!(
            "• {} - {}\n",
            format_local(reminder.remind_at, tz),
            reminder.message
        ));
    }
    text
}

impl Brain {
    pub(crate) async fn handle_reminder(
        &self,
        chat_id: i64,
        user_id: i64,
        request: ReminderRequest,
    ) -> Result<()> {
        let Some(parsed) = request.parsed else {
            return self.bot.send_message(chat_id, texts::REMINDER_USAGE).await;
        };
        if !is_meaningful(&parsed.message, self.config.brain.min_reminder_chars) {
            return self.bot.send_message(chat_id, texts::REMINDER_TOO_SHORT).await;
        }

        let reminder = self
            .store
            .insert_reminder(user_id, chat_id, &parsed.message, parsed.at.timestamp())
            .await?;
        info!(id = reminder.id, at = %parsed.at, matched = %parsed.matched, "reminder stored");

        let mut reply = texts::reminder_set(
            &parsed.at.format("%d.%m.%Y %H:%M").to_string(),
            &reminder.message,
        );
        let mut keyboard = None;

        if let Some(google) = &self.google {
            if google.auth.is_connected().await {
                match google
                    .calendar
                    .create_event(
                        &reminder.message,
                        parsed.at,
                        self.config.integrations.google.event_minutes,
                        Some(EVENT_DESCRIPTION),
                    )
                    .await
                {
                    Ok(event) => {
                        info!(event_id = %event.id, "calendar event created");
                        reply.push_str("\n📅 Takvime de eklendi.");
                        keyboard = event.html_link.map(|link| {
                            InlineKeyboardMarkup::column([InlineKeyboardButton::link("📅 Takvimde Aç", link)])
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "calendar event failed");
                        reply.push('\n');
                        reply.push_str(texts::CALENDAR_FAILED);
                    }
                }
            }
        }

        match keyboard {
            Some(keyboard) => {
                self.bot
                    .send_message_with_keyboard(chat_id, &reply, &keyboard)
                    .await?;
                Ok(())
            }
            None => self.bot.send_message(chat_id, &reply).await,
        }
    }

    pub(crate) async fn list_reminders(&self, chat_id: i64, user_id: i64) -> Result<()> {
        let pending = self.store.pending_reminders(user_id).await?;
        if pending.is_empty() {
            return self.bot.send_message(chat_id, texts::NO_PENDING_REMINDERS).await;
        }
        self.bot
            .send_message(chat_id, &format_pending(&pending, self.tz()))
            .await
    }

    /// Offer the Google consent link, or report that the calendar is already linked.
    pub(crate) async fn handle_calendar(&self, chat_id: i64) -> Result<()> {
        let Some(google) = &self.google else {
            return self.bot.send_message(chat_id, texts::CALENDAR_NOT_CONFIGURED).await;
        };
        if google.auth.is_connected().await {
            return self.bot.send_message(chat_id, texts::CALENDAR_CONNECTED).await;
        }

        let keyboard = InlineKeyboardMarkup::column([InlineKeyboardButton::link(
            "🔗 Google Takvim'i Bağla",
            google.auth.auth_url(),
        )]);
        self.bot
            .send_message_with_keyboard(chat_id, texts::CALENDAR_CONNECT, &keyboard)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_meaningful_counts_chars() {
        assert!(!is_meaningful("", 3));
        assert!(!is_meaningful("  a ", 3));
        assert!(is_meaningful("ışı", 3));
        assert!(is_meaningful("toplantı", 3));
    }

    #[test]
    fn test_format_pending_uses_local_time() {
        let reminders = vec![Reminder {
            id: 1,
            user_id: 1,
            chat_id: 1,
            message: "noter".to_string(),
            // 2025-03-11 11:30 UTC
            remind_at: 1_741_692_600,
            sent: false,
            created_at: 0,
        }];
        let text = format_pending(&reminders, 3);
        assert!(text.contains("• 11.03.2025 14:30 - noter"));
    }
}
