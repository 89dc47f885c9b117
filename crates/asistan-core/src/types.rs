use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a financial transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    /// Stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "gelir",
            Self::Expense => "gider",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Income => "Gelir",
            Self::Expense => "Gider",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gelir" => Some(Self::Income),
            "gider" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// Closed set of account buckets a transaction is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountBucket {
    Personal,
    Business,
    Household,
}

impl AccountBucket {
    pub const ALL: [AccountBucket; 3] = [Self::Personal, Self::Business, Self::Household];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "kisisel",
            Self::Business => "galeri",
            Self::Household => "ev",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Personal => "Kişisel",
            Self::Business => "Galeri",
            Self::Household => "Ev",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == s)
    }
}

/// Reporting window for financial summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl ReportPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "Bugün",
            Self::Week => "Bu Hafta",
            Self::Month => "Bu Ay",
            Self::Year => "Bu Yıl",
        }
    }

    /// First local date included in the period ending on `today`.
    pub fn start_date(&self, today: NaiveDate) -> NaiveDate {
        use chrono::Datelike;
        match self {
            Self::Day => today,
            Self::Week => today - chrono::Duration::days(7),
            Self::Month => today.with_day(1).unwrap_or(today),
            Self::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub onboarded: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub bucket: AccountBucket,
    pub direction: Direction,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: i64,
}

/// One aggregated line of a summary: total for a (direction, category) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub direction: Direction,
    pub category: String,
    pub total: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Sorted by total, largest first.
    pub rows: Vec<SummaryRow>,
    pub income_total: f64,
    pub expense_total: f64,
}

impl Summary {
    pub fn net(&self) -> f64 {
        self.income_total - self.expense_total
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub user_id: i64,
    pub chat_id: i64,
    pub message: String,
    pub remind_at: i64,
    pub sent: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub priority: String,
    pub completed: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub telegram_chat_id: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub role: String,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_start_dates() {
        let today = date(2025, 3, 12);
        assert_eq!(ReportPeriod::Day.start_date(today), today);
        assert_eq!(ReportPeriod::Week.start_date(today), date(2025, 3, 5));
        assert_eq!(ReportPeriod::Month.start_date(today), date(2025, 3, 1));
        assert_eq!(ReportPeriod::Year.start_date(today), date(2025, 1, 1));
    }

    #[test]
    fn test_bucket_and_direction_round_trip_through_columns() {
        for bucket in AccountBucket::ALL {
            assert_eq!(AccountBucket::parse(bucket.as_str()), Some(bucket));
        }
        assert_eq!(Direction::parse("gelir"), Some(Direction::Income));
        assert_eq!(Direction::parse("gider"), Some(Direction::Expense));
        assert_eq!(Direction::parse("income"), None);
    }

    #[test]
    fn test_summary_net() {
        let summary = Summary {
            rows: vec![],
            income_total: 1500.0,
            expense_total: 2000.0,
        };
        assert_eq!(summary.net(), -500.0);
        assert!(summary.is_empty());
    }
}
