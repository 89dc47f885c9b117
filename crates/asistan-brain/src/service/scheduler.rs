use std::sync::Arc;
use std::time::Duration;

use asistan_core::error::Result;
use asistan_core::time::now_unix;
use asistan_core::types::Reminder;
use asistan_telegram::bot::TelegramBot;
use async_trait::async_trait;
use tracing::{info, warn};

use super::store::Store;

/// Where due reminders are delivered.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[async_trait]
impl Notifier for TelegramBot {
    async fn notify(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }
}

pub fn reminder_text(reminder: &Reminder) -> String {
    format!("⏰ Hatırlatma: {}", reminder.message)
}

/// Background loop that delivers reminders once their time has come.
///
/// Each reminder is claimed with a conditional update before sending, so a
/// reminder fires at most once even if two polls overlap. A failed send is
/// logged and not retried.
pub struct ReminderPoller {
    store: Arc<Store>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
}

impl ReminderPoller {
    pub fn new(store: Arc<Store>, notifier: Arc<dyn Notifier>, interval: Duration) -> Self {
        Self {
            store,
            notifier,
            interval,
        }
    }

    /// Runs indefinitely. The first check happens immediately to catch
    /// reminders that came due while the process was down.
    pub async fn run(&self) -> Result<()> {
        info!(interval = ?self.interval, "[remind] poller started");

        loop {
            if let Err(e) = self.tick(now_unix()).await {
                warn!(error = %e, "[remind] poll failed");
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One poll. Returns how many reminders were claimed.
    pub async fn tick(&self, now: i64) -> Result<usize> {
        let due = self.store.due_reminders(now).await?;
        let mut claimed = 0;

        for reminder in due {
            if !self.store.mark_sent(reminder.id).await? {
                continue;
            }
            claimed += 1;

            match self.notifier.notify(reminder.chat_id, &reminder_text(&reminder)).await {
                Ok(()) => info!(id = reminder.id, user_id = reminder.user_id, "[remind] sent"),
                Err(e) => warn!(id = reminder.id, error = %e, "[remind] send failed"),
            }
        }

        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use asistan_core::error::AsistanError;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(i64, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, chat_id: i64, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            if self.fail {
                return Err(AsistanError::Telegram("blocked".to_string()));
            }
            Ok(())
        }
    }

    async fn store(dir: &tempfile::TempDir) -> Arc<Store> {
        let db = libsql::Builder::new_local(dir.path().join("asistan.db"))
            .build()
            .await
            .unwrap();
        Arc::new(Store::new(db).await.unwrap())
    }

    #[tokio::test]
    async fn test_due_reminder_fires_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store.insert_reminder(1, 77, "toplantı", 1_000).await.unwrap();
        store.insert_reminder(1, 77, "akşam yemeği", 9_000).await.unwrap();

        let notifier = Arc::new(RecordingNotifier::default());
        let poller = ReminderPoller::new(store.clone(), notifier.clone(), Duration::from_secs(60));

        assert_eq!(poller.tick(2_000).await.unwrap(), 1);
        assert_eq!(poller.tick(2_000).await.unwrap(), 0);

        let sent = notifier.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![(77, "⏰ Hatırlatma: toplantı".to_string())]);
        assert_eq!(store.pending_reminders(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_send_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store.insert_reminder(1, 77, "ilaç", 1_000).await.unwrap();

        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let poller = ReminderPoller::new(store.clone(), notifier.clone(), Duration::from_secs(60));

        assert_eq!(poller.tick(5_000).await.unwrap(), 1);
        assert_eq!(poller.tick(6_000).await.unwrap(), 0);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
        assert!(store.pending_reminders(1).await.unwrap().is_empty());
    }
}
