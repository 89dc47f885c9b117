use asistan_core::error::{AsistanError, Result};
use asistan_core::time::now_unix;
use asistan_core::types::{Note, Task};
use libsql::{Connection, Database};

pub const DEFAULT_PRIORITY: &str = "medium";
const PRIORITIES: [&str; 3] = ["low", "medium", "high"];

pub struct TaskManager {
    db: Database,
}

fn db_err(e: libsql::Error) -> AsistanError {
    AsistanError::Database(e.to_string())
}

impl TaskManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn conn(&self) -> Result<Connection> {
        self.db.connect().map_err(db_err)
    }

    /// Create the `tasks` and `notes` tables.
    pub async fn init(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'medium',
                completed INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(db_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(db_err)?;

        Ok(())
    }

    /// Add an open task. Unknown priorities fall back to "medium".
    pub async fn add_task(&self, user_id: i64, title: &str, priority: &str) -> Result<Task> {
        let priority = if PRIORITIES.contains(&priority) {
            priority
        } else {
            DEFAULT_PRIORITY
        };
        let now = now_unix();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO tasks (user_id, title, priority, completed, created_at) VALUES (?1, ?2, ?3, 0, ?4)",
            libsql::params![user_id, title.to_string(), priority.to_string(), now],
        )
        .await
        .map_err(db_err)?;

        Ok(Task {
            id: conn.last_insert_rowid(),
            user_id,
            title: title.to_string(),
            priority: priority.to_string(),
            completed: false,
            created_at: now,
        })
    }

    /// Open tasks for a user, newest first.
    pub async fn list_open_tasks(&self, user_id: i64) -> Result<Vec<Task>> {
        let mut rows = self
            .conn()?
            .query(
                "SELECT id, user_id, title, priority, completed, created_at FROM tasks
                 WHERE user_id = ?1 AND completed = 0 ORDER BY created_at DESC, id DESC",
                libsql::params![user_id],
            )
            .await
            .map_err(db_err)?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            tasks.push(Task {
                id: row.get::<i64>(0).map_err(db_err)?,
                user_id: row.get::<i64>(1).map_err(db_err)?,
                title: row.get::<String>(2).map_err(db_err)?,
                priority: row.get::<String>(3).map_err(db_err)?,
                completed: row.get::<i64>(4).map_err(db_err)? != 0,
                created_at: row.get::<i64>(5).map_err(db_err)?,
            });
        }
        Ok(tasks)
    }

    /// Mark a task done. Returns its title, or `None` when the user has no such task.
    pub async fn complete_task(&self, user_id: i64, task_id: i64) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT title FROM tasks WHERE id = ?1 AND user_id = ?2",
                libsql::params![task_id, user_id],
            )
            .await
            .map_err(db_err)?;

        let Some(row) = rows.next().await.map_err(db_err)? else {
            return Ok(None);
        };
        let title = row.get::<String>(0).map_err(db_err)?;

        conn.execute(
            "UPDATE tasks SET completed = 1 WHERE id = ?1 AND user_id = ?2",
            libsql::params![task_id, user_id],
        )
        .await
        .map_err(db_err)?;

        Ok(Some(title))
    }

    pub async fn add_note(&self, user_id: i64, title: &str, content: &str) -> Result<Note> {
        let now = now_unix();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO notes (user_id, title, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            libsql::params![user_id, title.to_string(), content.to_string(), now],
        )
        .await
        .map_err(db_err)?;

        Ok(Note {
            id: conn.last_insert_rowid(),
            user_id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
        })
    }

    /// Most recent notes first, at most `limit`.
    pub async fn list_notes(&self, user_id: i64, limit: usize) -> Result<Vec<Note>> {
        let mut rows = self
            .conn()?
            .query(
                "SELECT id, user_id, title, content, created_at FROM notes
                 WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
                libsql::params![user_id, limit as i64],
            )
            .await
            .map_err(db_err)?;

        let mut notes = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            notes.push(Note {
                id: row.get::<i64>(0).map_err(db_err)?,
                user_id: row.get::<i64>(1).map_err(db_err)?,
                title: row.get::<String>(2).map_err(db_err)?,
                content: row.get::<String>(3).map_err(db_err)?,
                created_at: row.get::<i64>(4).map_err(db_err)?,
            });
        }
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn manager(dir: &tempfile::TempDir) -> TaskManager {
        let path = dir.path().join("tasks.db");
        let db = libsql::Builder::new_local(path).build().await.unwrap();
        let manager = TaskManager::new(db);
        manager.init().await.unwrap();
        manager
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = manager(&dir).await;

        let first = tasks.add_task(1, "Ruhsatı yenile", "high").await.unwrap();
        let second = tasks.add_task(1, "Lastik değiştir", "urgent").await.unwrap();
        tasks.add_task(2, "Başkasının görevi", "low").await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.priority, DEFAULT_PRIORITY);

        let open = tasks.list_open_tasks(1).await.unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].title, "Lastik değiştir");

        let done = tasks.complete_task(1, first.id).await.unwrap();
        assert_eq!(done.as_deref(), Some("Ruhsatı yenile"));

        let open = tasks.list_open_tasks(1).await.unwrap();
        assert_eq!(open.len(), 1);
        assert!(open.iter().all(|t| !t.completed));
    }

    #[tokio::test]
    async fn test_complete_task_checks_owner() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = manager(&dir).await;

        let task = tasks.add_task(1, "Noter", DEFAULT_PRIORITY).await.unwrap();
        assert_eq!(tasks.complete_task(2, task.id).await.unwrap(), None);
        assert_eq!(tasks.complete_task(1, 9999).await.unwrap(), None);
        assert_eq!(tasks.list_open_tasks(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notes_limit_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = manager(&dir).await;

        for i in 0..12 {
            tasks
                .add_note(1, &format!("not{i}"), "içerik")
                .await
                .unwrap();
        }
        let notes = tasks.list_notes(1, 10).await.unwrap();
        assert_eq!(notes.len(), 10);
        assert_eq!(notes[0].title, "not11");
        assert!(tasks.list_notes(2, 10).await.unwrap().is_empty());
    }
}
