use std::sync::Arc;
use std::time::Duration;

use asistan_core::error::Result;
use asistan_core::time::local_now;
use asistan_core::types::ReportPeriod;
use asistan_nlu::Intent;
use asistan_telegram::types::{CallbackQuery, TelegramMessage, User};
use tracing::{debug, info, warn};

use super::commands::parse_command;
use super::Brain;
use crate::texts;

const OFFSET_KEY: &str = "telegram_offset";
const POLL_TIMEOUT_SECS: u32 = 30;
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

impl Brain {
    /// Long-poll Telegram forever, handling each update on its own task.
    pub async fn run(self: &Arc<Self>) -> Result<()> {
        let me = self.bot.get_me().await?;
        info!(
            username = me.username.as_deref().unwrap_or("unknown"),
            "bot started"
        );

        if let Err(e) = self.bot.set_my_commands(texts::COMMANDS).await {
            warn!(error = %e, "failed to register bot commands");
        }

        let mut offset: i64 = self
            .store
            .get_config(OFFSET_KEY)
            .await?
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        loop {
            let updates = match self.bot.get_updates(offset, POLL_TIMEOUT_SECS).await {
                Ok(u) => u,
                Err(e) => {
                    warn!(error = %e, "error polling updates");
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    continue;
                }
            };

            for update in &updates {
                if update.update_id >= offset {
                    offset = update.update_id + 1;
                }

                if let Some(msg) = update.message.clone() {
                    let brain = Arc::clone(self);
                    tokio::spawn(async move { brain.handle_message(&msg).await });
                }

                if let Some(query) = update.callback_query.clone() {
                    let brain = Arc::clone(self);
                    tokio::spawn(async move {
                        if let Err(e) = brain.handle_callback(&query).await {
                            warn!(error = %e, "error handling callback");
                        }
                    });
                }
            }

            if !updates.is_empty() {
                if let Err(e) = self.store.set_config(OFFSET_KEY, &offset.to_string()).await {
                    warn!(error = %e, "failed to persist update offset");
                }
            }
        }
    }

    /// Handle one text message. Failures are logged and answered with an apology.
    async fn handle_message(&self, msg: &TelegramMessage) {
        let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text.as_deref()) else {
            return;
        };
        let chat_id = msg.chat.id;
        info!(
            user_id = user.id,
            username = user.username.as_deref().unwrap_or("?"),
            chat_id,
            "[recv]"
        );

        if !self.bot.is_authorized(user.id) {
            warn!(user_id = user.id, "[auth] denied");
            return;
        }

        if let Err(e) = self.route_message(chat_id, user, text).await {
            warn!(chat_id, error = %e, "error handling message");
            if let Err(e) = self.bot.send_message(chat_id, texts::APOLOGY).await {
                warn!(chat_id, error = %e, "[send] apology failed");
            }
        }
    }

    async fn route_message(&self, chat_id: i64, user: &User, text: &str) -> Result<()> {
        self.store
            .upsert_user(user.id, user.username.as_deref(), &user.first_name)
            .await?;

        if let Some((command, args)) = parse_command(text) {
            info!(command, "[cmd]");
            return self.handle_command(chat_id, user, command, args).await;
        }

        if !self.store.is_onboarded(user.id).await? {
            self.send_onboarding(chat_id).await?;
            return Ok(());
        }

        let classification = self.classifier.classify(text, local_now(self.tz()));
        info!(
            intent = classification.intent.label(),
            confidence = classification.confidence,
            "[route]"
        );

        match classification.intent {
            Intent::Financial(tx) => self.handle_financial(chat_id, user.id, &tx).await,
            Intent::FinancialReport(query) => self.handle_report(chat_id, user.id, query).await,
            Intent::Reminder(request) => self.handle_reminder(chat_id, user.id, request).await,
            Intent::Calendar => self.handle_calendar(chat_id).await,
            Intent::ResetChat => self.reset_chat(chat_id).await,
            Intent::Help => self.bot.send_message(chat_id, texts::HELP).await,
            Intent::Chat => self.handle_chat(chat_id, text).await,
        }
    }

    pub(crate) async fn send_onboarding(&self, chat_id: i64) -> Result<()> {
        self.bot
            .send_message_with_keyboard(
                chat_id,
                texts::ONBOARDING,
                &texts::onboarding_keyboard("✅ Anladım, Başlayalım!"),
            )
            .await?;
        Ok(())
    }

    /// Inline keyboard presses. The pressed message is edited in place.
    async fn handle_callback(&self, query: &CallbackQuery) -> Result<()> {
        if let Err(e) = self.bot.answer_callback_query(&query.id, None).await {
            debug!(error = %e, "answerCallbackQuery failed");
        }

        let user = &query.from;
        if !self.bot.is_authorized(user.id) {
            warn!(user_id = user.id, "[auth] denied callback");
            return Ok(());
        }
        let (Some(message), Some(data)) = (query.message.as_ref(), query.data.as_deref()) else {
            return Ok(());
        };
        let (chat_id, message_id) = (message.chat.id, message.message_id);
        info!(user_id = user.id, data, "[recv] callback");

        match data {
            "onboard_complete" => {
                self.store
                    .mark_onboarded(user.id, user.username.as_deref(), &user.first_name)
                    .await?;
                self.bot
                    .edit_message_formatted(
                        chat_id,
                        message_id,
                        texts::ONBOARD_COMPLETE,
                        Some(&texts::report_menu()),
                    )
                    .await
            }
            "financial_summary" | "weekly_report" => {
                let report = self.build_report(user.id, ReportPeriod::Week, None).await?;
                self.bot
                    .edit_message_formatted(chat_id, message_id, &report, None)
                    .await
            }
            "help" => {
                self.bot
                    .edit_message_formatted(chat_id, message_id, texts::QUICK_HELP, None)
                    .await
            }
            "tutorial" => {
                self.bot
                    .edit_message_formatted(
                        chat_id,
                        message_id,
                        texts::TUTORIAL,
                        Some(&texts::onboarding_keyboard("✅ Anladım")),
                    )
                    .await
            }
            other => {
                debug!(data = other, "unknown callback data");
                Ok(())
            }
        }
    }
}
