use std::sync::Arc;
use std::time::Duration;

use asistan_core::config::Config;
use asistan_core::error::{AsistanError, Result};
use asistan_integrations::google::{CalendarClient, GoogleAuth};
use asistan_integrations::TokenStore;
use asistan_llm::gemini::GeminiLlm;
use asistan_nlu::{ClassifierOptions, IntentClassifier};
use asistan_tasks::TaskManager;
use asistan_telegram::bot::TelegramBot;
use tracing::{info, warn};

use crate::service::scheduler::{Notifier, ReminderPoller};
use crate::service::store::{open_database, Store};

mod chat;
mod commands;
mod finance;
mod reminder;
mod router;

/// Google Calendar access, present only when OAuth credentials are configured.
pub(crate) struct Google {
    pub(crate) auth: Arc<GoogleAuth>,
    pub(crate) calendar: CalendarClient,
}

/// Ties the bot, the classifier, storage and the integrations together.
///
/// `run` long-polls Telegram and handles every update on its own task.
/// Reminder delivery is a separate loop, see [`Brain::reminder_poller`].
pub struct Brain {
    pub(crate) store: Arc<Store>,
    pub(crate) tasks: TaskManager,
    pub(crate) bot: Arc<TelegramBot>,
    pub(crate) llm: GeminiLlm,
    pub(crate) classifier: IntentClassifier,
    pub(crate) google: Option<Google>,
    pub(crate) config: Config,
}

impl Brain {
    pub async fn new(config: Config) -> Result<Self> {
        if config.llm.provider != "gemini" {
            return Err(AsistanError::Config(format!(
                "unsupported llm provider {:?}, only \"gemini\" is available",
                config.llm.provider
            )));
        }

        let store = Arc::new(Store::new(open_database(&config.database).await?).await?);

        // TaskManager gets its own Database handle
        let tasks = TaskManager::new(open_database(&config.database).await?);
        tasks.init().await?;

        let bot = Arc::new(TelegramBot::new(
            &config.telegram.token,
            config.telegram.allowed_user_ids.clone(),
        ));
        let llm = GeminiLlm::new(config.llm.api_key.clone(), config.llm.model.clone());
        let classifier = IntentClassifier::new(ClassifierOptions {
            tie_break: config.intent.tie_break,
        });

        let google = if config.google_enabled() {
            info!("[integrations] Google Calendar enabled");
            let google_config = &config.integrations.google;
            let auth = Arc::new(GoogleAuth::new(
                google_config.client_id.clone(),
                google_config.client_secret.clone(),
                google_config.callback_url.clone(),
                Arc::clone(&store) as Arc<dyn TokenStore>,
            ));
            let calendar = CalendarClient::new(Arc::clone(&auth));

            let port = config.integrations.server.port;
            let auth_for_server = Arc::clone(&auth);
            tokio::spawn(async move {
                if let Err(e) = asistan_integrations::http::start_oauth_server(port, auth_for_server).await {
                    warn!(error = %e, "[integrations] OAuth server stopped");
                }
            });

            Some(Google { auth, calendar })
        } else {
            None
        };

        Ok(Self {
            store,
            tasks,
            bot,
            llm,
            classifier,
            google,
            config,
        })
    }

    /// The reminder delivery loop, sharing this brain's store and bot.
    pub fn reminder_poller(&self) -> ReminderPoller {
        ReminderPoller::new(
            Arc::clone(&self.store),
            Arc::clone(&self.bot) as Arc<dyn Notifier>,
            Duration::from_secs(self.config.brain.reminder_poll_secs.max(1)),
        )
    }

    pub(crate) fn tz(&self) -> i32 {
        self.config.brain.timezone_offset
    }
}
