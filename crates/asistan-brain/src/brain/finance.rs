use asistan_core::error::Result;
use asistan_core::time::local_today;
use asistan_core::types::{AccountBucket, ReportPeriod};
use asistan_nlu::{ParsedTransaction, ReportQuery};
use tracing::{info, warn};

use super::Brain;
use crate::service::report::{format_report, format_transaction_saved};
use crate::texts;

impl Brain {
    /// Record a transaction dated today (local) and confirm it.
    pub(crate) async fn handle_financial(
        &self,
        chat_id: i64,
        user_id: i64,
        tx: &ParsedTransaction,
    ) -> Result<()> {
        let saved = match self
            .store
            .insert_transaction(user_id, tx, local_today(self.tz()))
            .await
        {
            Ok(saved) => saved,
            Err(e) => {
                warn!(user_id, error = %e, "failed to store transaction");
                return self.bot.send_message(chat_id, texts::TRANSACTION_FAILED).await;
            }
        };
        info!(
            id = saved.id,
            direction = saved.direction.as_str(),
            bucket = saved.bucket.as_str(),
            amount = saved.amount,
            "transaction stored"
        );

        self.bot
            .send_message_with_keyboard(
                chat_id,
                &format_transaction_saved(&saved),
                &texts::weekly_summary_button(),
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn handle_report(&self, chat_id: i64, user_id: i64, query: ReportQuery) -> Result<()> {
        let report = self.build_report(user_id, query.period, query.bucket).await?;
        self.bot.send_message(chat_id, &report).await
    }

    pub(crate) async fn build_report(
        &self,
        user_id: i64,
        period: ReportPeriod,
        bucket: Option<AccountBucket>,
    ) -> Result<String> {
        let summary = self
            .store
            .query_summary(user_id, period, bucket, local_today(self.tz()))
            .await?;
        Ok(format_report(&summary, period, bucket))
    }
}
