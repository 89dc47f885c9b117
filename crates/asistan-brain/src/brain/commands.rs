use asistan_core::error::Result;
use asistan_core::time::to_local;
use asistan_core::types::{Note, Task};
use asistan_nlu::text::truncate_chars;
use asistan_tasks::manager::DEFAULT_PRIORITY;
use asistan_telegram::types::User;

use super::Brain;
use crate::texts;

const NOTE_LIST_LIMIT: usize = 10;
const NOTE_PREVIEW_CHARS: usize = 100;

/// Split `/command@bot args` into the bare command and its trimmed arguments.
pub(crate) fn parse_command(text: &str) -> Option<(&str, &str)> {
    let rest = text.trim().strip_prefix('/')?;
    let (head, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let command = head.split('@').next().unwrap_or(head);
    if command.is_empty() {
        return None;
    }
    Some((command, args.trim()))
}

fn priority_emoji(priority: &str) -> &'static str {
    match priority {
        "high" => "🔴",
        "low" => "🟢",
        _ => "🟡",
    }
}

fn format_tasks(tasks: &[Task], tz: i32) -> String {
    let mut text = String::from("📋 Aktif Görevleriniz:\n\n");
    for task in tasks {
        text.push_str(&format!(
            "{} {}\n🆔 ID: {} | 📅 {}\n\n",
            priority_emoji(&task.priority),
            task.title,
            task.id,
            to_local(task.created_at, tz).format("%d.%m.%Y"),
        ));
    }
    text.push_str("Görevi tamamlamak için: /gorev_tamam [ID]");
    text
}

fn format_notes(notes: &[Note], tz: i32) -> String {
    let mut text = String::from("📝 Son Notlarınız:\n\n");
    for note in notes {
        let preview = truncate_chars(&note.content, NOTE_PREVIEW_CHARS);
        let ellipsis = if preview.len() < note.content.len() { "..." } else { "" };
        text.push_str(&format!(
            "📌 {}\n{preview}{ellipsis}\n🆔 {} | 📅 {}\n\n",
            note.title,
            note.id,
            to_local(note.created_at, tz).format("%d.%m.%Y"),
        ));
    }
    text
}

impl Brain {
    pub(crate) async fn handle_command(
        &self,
        chat_id: i64,
        user: &User,
        command: &str,
        args: &str,
    ) -> Result<()> {
        match command {
            "start" => {
                if self.store.is_onboarded(user.id).await? {
                    self.bot
                        .send_message_with_keyboard(
                            chat_id,
                            &texts::welcome(&user.first_name),
                            &texts::main_menu(),
                        )
                        .await?;
                    Ok(())
                } else {
                    self.send_onboarding(chat_id).await
                }
            }
            "help" | "yardim" => self.bot.send_message(chat_id, texts::HELP).await,
            "gorev_ekle" => {
                if args.is_empty() {
                    return self.bot.send_message(chat_id, texts::TASK_ADD_USAGE).await;
                }
                let task = self.tasks.add_task(user.id, args, DEFAULT_PRIORITY).await?;
                self.bot
                    .send_message(chat_id, &texts::task_added(&task.title, task.id))
                    .await
            }
            "gorevler" => {
                let tasks = self.tasks.list_open_tasks(user.id).await?;
                if tasks.is_empty() {
                    return self.bot.send_message(chat_id, texts::NO_TASKS).await;
                }
                self.bot
                    .send_message(chat_id, &format_tasks(&tasks, self.tz()))
                    .await
            }
            "gorev_tamam" => {
                let Some(raw) = args.split_whitespace().next() else {
                    return self.bot.send_message(chat_id, texts::TASK_DONE_USAGE).await;
                };
                let Ok(task_id) = raw.parse::<i64>() else {
                    return self.bot.send_message(chat_id, texts::TASK_INVALID_ID).await;
                };
                match self.tasks.complete_task(user.id, task_id).await? {
                    Some(title) => {
                        self.bot
                            .send_message(chat_id, &texts::task_completed(&title))
                            .await
                    }
                    None => self.bot.send_message(chat_id, texts::TASK_NOT_FOUND).await,
                }
            }
            "not_ekle" => {
                let Some((title, content)) = args
                    .split_once(char::is_whitespace)
                    .map(|(t, c)| (t, c.trim()))
                    .filter(|(_, c)| !c.is_empty())
                else {
                    return self.bot.send_message(chat_id, texts::NOTE_ADD_USAGE).await;
                };
                let note = self.tasks.add_note(user.id, title, content).await?;
                self.bot
                    .send_message(chat_id, &texts::note_saved(&note.title, note.id))
                    .await
            }
            "notlar" => {
                let notes = self.tasks.list_notes(user.id, NOTE_LIST_LIMIT).await?;
                if notes.is_empty() {
                    return self.bot.send_message(chat_id, texts::NO_NOTES).await;
                }
                self.bot
                    .send_message(chat_id, &format_notes(&notes, self.tz()))
                    .await
            }
            "hatirlaticilar" => self.list_reminders(chat_id, user.id).await,
            "yeni" => self.reset_chat(chat_id).await,
            _ => {
                self.bot
                    .send_message_with_keyboard(chat_id, texts::NOT_UNDERSTOOD, &texts::help_menu())
                    .await?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start"), Some(("start", "")));
        assert_eq!(
            parse_command("/gorev_ekle  Ruhsatı yenile "),
            Some(("gorev_ekle", "Ruhsatı yenile"))
        );
        assert_eq!(parse_command("/gorevler@asistan_bot"), Some(("gorevler", "")));
        assert_eq!(parse_command("500 TL yakıt aldım"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn test_format_notes_truncates_long_content() {
        let notes = vec![Note {
            id: 4,
            user_id: 1,
            title: "müşteri".to_string(),
            content: "ç".repeat(150),
            created_at: 0,
        }];
        let text = format_notes(&notes, 3);
        assert!(text.contains(&format!("{}...", "ç".repeat(100))));
        assert!(text.contains("🆔 4 | 📅 01.01.1970"));
    }

    #[test]
    fn test_format_tasks_priority_and_footer() {
        let tasks = vec![Task {
            id: 7,
            user_id: 1,
            title: "Noter".to_string(),
            priority: "high".to_string(),
            completed: false,
            created_at: 0,
        }];
        let text = format_tasks(&tasks, 3);
        assert!(text.contains("🔴 Noter\n🆔 ID: 7"));
        assert!(text.ends_with("/gorev_tamam [ID]"));
    }
}
