use asistan_core::config::DatabaseConfig;
use asistan_core::error::{AsistanError, Result};
use asistan_core::time::now_unix;
use asistan_core::types::*;
use asistan_integrations::TokenStore;
use asistan_nlu::ParsedTransaction;
use async_trait::async_trait;
use chrono::NaiveDate;
use libsql::{Builder, Connection, Database};

fn map_err(e: libsql::Error) -> AsistanError {
    AsistanError::Database(e.to_string())
}

/// Open the configured database: Turso when a URL is set, else a local file.
pub async fn open_database(config: &DatabaseConfig) -> Result<Database> {
    if !config.turso_url.is_empty() {
        Builder::new_remote(config.turso_url.clone(), config.turso_token.clone())
            .build()
            .await
            .map_err(map_err)
    } else {
        Builder::new_local(&config.path).build().await.map_err(map_err)
    }
}

/// Users, transactions, reminders, chat history and key/value config.
pub struct Store {
    db: Database,
}

impl Store {
    pub async fn new(db: Database) -> Result<Self> {
        let store = Self { db };
        store.init_tables().await?;
        Ok(store)
    }

    /// Fresh connection per operation. Remote databases get a new stream each time.
    fn conn(&self) -> Result<Connection> {
        self.db.connect().map_err(map_err)
    }

    async fn init_tables(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT,
                first_name TEXT NOT NULL,
                onboarded INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                bucket TEXT NOT NULL,
                direction TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS transactions_user_date ON transactions(user_id, date);
            CREATE TABLE IF NOT EXISTS reminders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                chat_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                remind_at INTEGER NOT NULL,
                sent INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS reminders_due ON reminders(sent, remind_at);
            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                telegram_chat_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id INTEGER NOT NULL REFERENCES conversations(id),
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .await
        .map_err(map_err)?;

        Ok(())
    }

    // ─── Users ──────────────────────────────────────────────────────

    /// Record a user on contact, refreshing their names. Keeps the onboarded flag.
    pub async fn upsert_user(&self, id: i64, username: Option<&str>, first_name: &str) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO users (id, username, first_name, onboarded, created_at) VALUES (?1, ?2, ?3, 0, ?4)
                 ON CONFLICT(id) DO UPDATE SET username = excluded.username, first_name = excluded.first_name",
                libsql::params![id, username.map(str::to_string), first_name.to_string(), now_unix()],
            )
            .await
            .map_err(map_err)?;
        Ok(())
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let mut rows = self
            .conn()?
            .query(
                "SELECT id, username, first_name, onboarded, created_at FROM users WHERE id = ?1",
                libsql::params![id],
            )
            .await
            .map_err(map_err)?;

        let Some(row) = rows.next().await.map_err(map_err)? else {
            return Ok(None);
        };
        Ok(Some(User {
            id: row.get::<i64>(0).map_err(map_err)?,
            username: row.get::<Option<String>>(1).map_err(map_err)?,
            first_name: row.get::<String>(2).map_err(map_err)?,
            onboarded: row.get::<i64>(3).map_err(map_err)? != 0,
            created_at: row.get::<i64>(4).map_err(map_err)?,
        }))
    }

    pub async fn is_onboarded(&self, id: i64) -> Result<bool> {
        Ok(self.get_user(id).await?.is_some_and(|u| u.onboarded))
    }

    pub async fn mark_onboarded(&self, id: i64, username: Option<&str>, first_name: &str) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO users (id, username, first_name, onboarded, created_at) VALUES (?1, ?2, ?3, 1, ?4)
                 ON CONFLICT(id) DO UPDATE SET onboarded = 1",
                libsql::params![id, username.map(str::to_string), first_name.to_string(), now_unix()],
            )
            .await
            .map_err(map_err)?;
        Ok(())
    }

    // ─── Transactions ───────────────────────────────────────────────

    pub async fn insert_transaction(
        &self,
        user_id: i64,
        tx: &ParsedTransaction,
        date: NaiveDate,
    ) -> Result<Transaction> {
        let now = now_unix();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transactions (user_id, bucket, direction, amount, category, description, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            libsql::params![
                user_id,
                tx.bucket.as_str(),
                tx.direction.as_str(),
                tx.amount,
                tx.category.clone(),
                tx.description.clone(),
                date.format("%Y-%m-%d").to_string(),
                now,
            ],
        )
        .await
        .map_err(map_err)?;

        Ok(Transaction {
            id: conn.last_insert_rowid(),
            user_id,
            bucket: tx.bucket,
            direction: tx.direction,
            amount: tx.amount,
            category: tx.category.clone(),
            description: tx.description.clone(),
            date,
            created_at: now,
        })
    }

    /// Totals per (direction, category) for the period ending on `today`.
    pub async fn query_summary(
        &self,
        user_id: i64,
        period: ReportPeriod,
        bucket: Option<AccountBucket>,
        today: NaiveDate,
    ) -> Result<Summary> {
        let since = period.start_date(today).format("%Y-%m-%d").to_string();
        let mut rows = self
            .conn()?
            .query(
                "SELECT direction, category, SUM(amount) AS total FROM transactions
                 WHERE user_id = ?1 AND date >= ?2 AND (?3 IS NULL OR bucket = ?3)
                 GROUP BY direction, category
                 ORDER BY total DESC",
                libsql::params![user_id, since, bucket.map(|b| b.as_str().to_string())],
            )
            .await
            .map_err(map_err)?;

        let mut summary = Summary::default();
        while let Some(row) = rows.next().await.map_err(map_err)? {
            let raw = row.get::<String>(0).map_err(map_err)?;
            let direction = Direction::parse(&raw)
                .ok_or_else(|| AsistanError::Database(format!("unknown direction {raw:?}")))?;
            let total = row.get::<f64>(2).map_err(map_err)?;

            match direction {
                Direction::Income => summary.income_total += total,
                Direction::Expense => summary.expense_total += total,
            }
            summary.rows.push(SummaryRow {
                direction,
                category: row.get::<String>(1).map_err(map_err)?,
                total,
            });
        }
        Ok(summary)
    }

    // ─── Reminders ──────────────────────────────────────────────────

    pub async fn insert_reminder(
        &self,
        user_id: i64,
        chat_id: i64,
        message: &str,
        remind_at: i64,
    ) -> Result<Reminder> {
        let now = now_unix();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO reminders (user_id, chat_id, message, remind_at, sent, created_at) VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            libsql::params![user_id, chat_id, message.to_string(), remind_at, now],
        )
        .await
        .map_err(map_err)?;

        Ok(Reminder {
            id: conn.last_insert_rowid(),
            user_id,
            chat_id,
            message: message.to_string(),
            remind_at,
            sent: false,
            created_at: now,
        })
    }

    /// Unsent reminders whose time has come, oldest first.
    pub async fn due_reminders(&self, now: i64) -> Result<Vec<Reminder>> {
        self.query_reminders(
            "SELECT id, user_id, chat_id, message, remind_at, sent, created_at FROM reminders
             WHERE sent = 0 AND remind_at <= ?1 ORDER BY remind_at",
            libsql::params![now],
        )
        .await
    }

    /// A user's upcoming reminders, soonest first.
    pub async fn pending_reminders(&self, user_id: i64) -> Result<Vec<Reminder>> {
        self.query_reminders(
            "SELECT id, user_id, chat_id, message, remind_at, sent, created_at FROM reminders
             WHERE sent = 0 AND user_id = ?1 ORDER BY remind_at",
            libsql::params![user_id],
        )
        .await
    }

    async fn query_reminders(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<Vec<Reminder>> {
        let mut rows = self.conn()?.query(sql, params).await.map_err(map_err)?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next().await.map_err(map_err)? {
            reminders.push(Reminder {
                id: row.get::<i64>(0).map_err(map_err)?,
                user_id: row.get::<i64>(1).map_err(map_err)?,
                chat_id: row.get::<i64>(2).map_err(map_err)?,
                message: row.get::<String>(3).map_err(map_err)?,
                remind_at: row.get::<i64>(4).map_err(map_err)?,
                sent: row.get::<i64>(5).map_err(map_err)? != 0,
                created_at: row.get::<i64>(6).map_err(map_err)?,
            });
        }
        Ok(reminders)
    }

    /// Claim a reminder for delivery. `false` means it was already sent.
    pub async fn mark_sent(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE reminders SET sent = 1 WHERE id = ?1 AND sent = 0",
                libsql::params![id],
            )
            .await
            .map_err(map_err)?;
        Ok(changed == 1)
    }

    // ─── Conversations ──────────────────────────────────────────────

    /// Latest conversation for a chat, created on first use.
    pub async fn get_or_create_conversation(&self, telegram_chat_id: i64) -> Result<Conversation> {
        let mut rows = self
            .conn()?
            .query(
                "SELECT id, telegram_chat_id, created_at FROM conversations
                 WHERE telegram_chat_id = ?1 ORDER BY id DESC LIMIT 1",
                libsql::params![telegram_chat_id],
            )
            .await
            .map_err(map_err)?;

        if let Some(row) = rows.next().await.map_err(map_err)? {
            return Ok(Conversation {
                id: row.get::<i64>(0).map_err(map_err)?,
                telegram_chat_id: row.get::<i64>(1).map_err(map_err)?,
                created_at: row.get::<i64>(2).map_err(map_err)?,
            });
        }

        self.create_new_conversation(telegram_chat_id).await
    }

    /// Start a fresh conversation; earlier history stops being sent to the model.
    pub async fn create_new_conversation(&self, telegram_chat_id: i64) -> Result<Conversation> {
        let now = now_unix();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO conversations (telegram_chat_id, created_at) VALUES (?1, ?2)",
            libsql::params![telegram_chat_id, now],
        )
        .await
        .map_err(map_err)?;

        Ok(Conversation {
            id: conn.last_insert_rowid(),
            telegram_chat_id,
            created_at: now,
        })
    }

    pub async fn insert_message(&self, conversation_id: i64, role: &str, content: &str) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO messages (conversation_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![conversation_id, role.to_string(), content.to_string(), now_unix()],
            )
            .await
            .map_err(map_err)?;
        Ok(())
    }

    /// The last `limit` messages of a conversation in chronological order.
    pub async fn recent_messages(&self, conversation_id: i64, limit: usize) -> Result<Vec<Message>> {
        let mut rows = self
            .conn()?
            .query(
                "SELECT id, conversation_id, role, content, created_at FROM messages
                 WHERE conversation_id = ?1 ORDER BY id DESC LIMIT ?2",
                libsql::params![conversation_id, limit as i64],
            )
            .await
            .map_err(map_err)?;

        let mut messages = Vec::new();
        while let Some(row) = rows.next().await.map_err(map_err)? {
            messages.push(Message {
                id: row.get::<i64>(0).map_err(map_err)?,
                conversation_id: row.get::<i64>(1).map_err(map_err)?,
                role: row.get::<String>(2).map_err(map_err)?,
                content: row.get::<String>(3).map_err(map_err)?,
                created_at: row.get::<i64>(4).map_err(map_err)?,
            });
        }
        messages.reverse();
        Ok(messages)
    }

    // ─── Config ─────────────────────────────────────────────────────

    pub async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
                libsql::params![key.to_string(), value.to_string()],
            )
            .await
            .map_err(map_err)?;
        Ok(())
    }

    pub async fn get_config(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn()?
            .query(
                "SELECT value FROM config WHERE key = ?1",
                libsql::params![key.to_string()],
            )
            .await
            .map_err(map_err)?;

        match rows.next().await.map_err(map_err)? {
            Some(row) => Ok(Some(row.get::<String>(0).map_err(map_err)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TokenStore for Store {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_config(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_config(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(dir: &tempfile::TempDir) -> Store {
        let db = Builder::new_local(dir.path().join("asistan.db"))
            .build()
            .await
            .unwrap();
        Store::new(db).await.unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(amount: f64, direction: Direction, bucket: AccountBucket, category: &str) -> ParsedTransaction {
        ParsedTransaction {
            amount,
            direction,
            bucket,
            category: category.to_string(),
            description: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_onboarding_flag_survives_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        store.upsert_user(1, Some("ali"), "Ali").await.unwrap();
        assert!(!store.is_onboarded(1).await.unwrap());

        store.mark_onboarded(1, Some("ali"), "Ali").await.unwrap();
        store.upsert_user(1, None, "Ali Veli").await.unwrap();

        let user = store.get_user(1).await.unwrap().unwrap();
        assert!(user.onboarded);
        assert_eq!(user.first_name, "Ali Veli");
        assert!(!store.is_onboarded(2).await.unwrap());
    }

    #[tokio::test]
    async fn test_summary_groups_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let today = date(2025, 3, 12);

        store.insert_transaction(1, &tx(350_000.0, Direction::Income, AccountBucket::Business, "satış"), today).await.unwrap();
        store.insert_transaction(1, &tx(500.0, Direction::Expense, AccountBucket::Personal, "yakıt"), today).await.unwrap();
        store.insert_transaction(1, &tx(300.0, Direction::Expense, AccountBucket::Personal, "yakıt"), date(2025, 3, 10)).await.unwrap();
        store.insert_transaction(1, &tx(8_000.0, Direction::Expense, AccountBucket::Household, "kira"), date(2025, 2, 20)).await.unwrap();
        store.insert_transaction(2, &tx(999.0, Direction::Expense, AccountBucket::Personal, "diğer"), today).await.unwrap();

        let week = store.query_summary(1, ReportPeriod::Week, None, today).await.unwrap();
        assert_eq!(week.income_total, 350_000.0);
        assert_eq!(week.expense_total, 800.0);
        assert_eq!(week.rows.len(), 2);
        assert_eq!(week.rows[0].category, "satış");
        assert_eq!(week.rows[1].total, 800.0);

        let day = store.query_summary(1, ReportPeriod::Day, None, today).await.unwrap();
        assert_eq!(day.expense_total, 500.0);

        let year_home = store
            .query_summary(1, ReportPeriod::Year, Some(AccountBucket::Household), today)
            .await
            .unwrap();
        assert_eq!(year_home.expense_total, 8_000.0);
        assert_eq!(year_home.income_total, 0.0);

        let month = store.query_summary(1, ReportPeriod::Month, None, today).await.unwrap();
        assert_eq!(month.expense_total, 800.0);
    }

    #[tokio::test]
    async fn test_reminder_claimed_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let due = store.insert_reminder(1, 10, "toplantı", 1_000).await.unwrap();
        store.insert_reminder(1, 10, "sonra", 5_000).await.unwrap();

        let found = store.due_reminders(2_000).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, due.id);

        assert!(store.mark_sent(due.id).await.unwrap());
        assert!(!store.mark_sent(due.id).await.unwrap());
        assert!(store.due_reminders(2_000).await.unwrap().is_empty());

        let pending = store.pending_reminders(1).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].message, "sonra");
    }

    #[tokio::test]
    async fn test_conversation_history_window() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let conv = store.get_or_create_conversation(10).await.unwrap();
        assert_eq!(store.get_or_create_conversation(10).await.unwrap().id, conv.id);

        for i in 0..5 {
            store.insert_message(conv.id, "user", &format!("m{i}")).await.unwrap();
        }
        let recent = store.recent_messages(conv.id, 3).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m2", "m3", "m4"]);

        let fresh = store.create_new_conversation(10).await.unwrap();
        assert_ne!(fresh.id, conv.id);
        assert_eq!(store.get_or_create_conversation(10).await.unwrap().id, fresh.id);
        assert!(store.recent_messages(fresh.id, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        assert_eq!(store.get_config("telegram_offset").await.unwrap(), None);
        store.set_config("telegram_offset", "41").await.unwrap();
        store.set_config("telegram_offset", "42").await.unwrap();
        assert_eq!(store.get_config("telegram_offset").await.unwrap().as_deref(), Some("42"));
    }
}
