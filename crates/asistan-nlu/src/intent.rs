use asistan_core::config::TieBreak;
use asistan_core::types::{AccountBucket, ReportPeriod};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::finance::{FinancialIntentAnalyzer, ParsedTransaction};
use crate::text::Folded;
use crate::timeparse::{self, ParsedTime};

const REPORT_KEYWORDS: &[&str] = &["ne kadar", "toplam", "ozet", "rapor", "durum"];
const REMINDER_KEYWORDS: &[&str] = &["hatirla", "animsat", "unutma", "alarm"];
const CALENDAR_KEYWORDS: &[&str] = &["takvim", "calendar"];
const RESET_KEYWORDS: &[&str] = &["sifirla", "yeni sohbet"];
const HELP_KEYWORDS: &[&str] = &["yardim", "ne yapabilirsin", "komutlar", "help"];

const WEEK_WORDS: &[&str] = &["hafta"];
const YEAR_WORDS: &[&str] = &["yil", "sene"];
const MONTH_PREFIXES: &[&str] = &["aylik"];
const MONTH_WORDS: &[&str] = &["ay", "ayin", "ayki"];
const DAY_PREFIXES: &[&str] = &["bugun", "gunluk"];
const DAY_WORDS: &[&str] = &["gun"];

const BUSINESS_FILTER: &[&str] = &["galeri", "isyeri", "sirket"];
const BUSINESS_FILTER_WORDS: &[&str] = &["is"];
const HOUSEHOLD_FILTER_WORDS: &[&str] = &["ev", "evin", "evde", "eve"];
const PERSONAL_FILTER: &[&str] = &["kisisel", "sahsi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportQuery {
    pub period: ReportPeriod,
    /// `None` reports every bucket.
    pub bucket: Option<AccountBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderRequest {
    /// `None` when the message asked for a reminder without a usable time.
    pub parsed: Option<ParsedTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Intent {
    Financial(ParsedTransaction),
    FinancialReport(ReportQuery),
    Reminder(ReminderRequest),
    Calendar,
    ResetChat,
    Help,
    Chat,
}

impl Intent {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Financial(_) => "financial",
            Self::FinancialReport(_) => "financial_report",
            Self::Reminder(_) => "reminder",
            Self::Calendar => "calendar",
            Self::ResetChat => "reset_chat",
            Self::Help => "help",
            Self::Chat => "chat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub intent: Intent,
    /// Informational only. Routing is decided by rule order.
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierOptions {
    pub tie_break: TieBreak,
}

/// Ordered keyword classifier. The first rule that matches decides the intent.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier {
    financial: FinancialIntentAnalyzer,
}

impl IntentClassifier {
    pub fn new(options: ClassifierOptions) -> Self {
        Self {
            financial: FinancialIntentAnalyzer::new(options.tie_break),
        }
    }

    pub fn classify(&self, text: &str, now: DateTime<FixedOffset>) -> Classification {
        let folded = Folded::new(text);

        if let Some(analysis) = self.financial.analyze_folded(text, &folded) {
            return Classification {
                confidence: analysis.confidence,
                intent: Intent::Financial(analysis.transaction),
            };
        }

        if folded.any_prefix(REPORT_KEYWORDS) {
            return Classification {
                intent: Intent::FinancialReport(ReportQuery {
                    period: report_period(&folded),
                    bucket: report_bucket(&folded),
                }),
                confidence: 0.8,
            };
        }

        let reminder_keyword = folded.any_prefix(REMINDER_KEYWORDS);
        if reminder_keyword || timeparse::has_time_expression(&folded) {
            let parsed = timeparse::parse_folded(text, &folded, now);
            let confidence = if parsed.is_some() { 0.85 } else { 0.6 };
            // A time-shaped token that does not resolve (e.g. "25:99") is not a reminder.
            if parsed.is_some() || reminder_keyword {
                return Classification {
                    intent: Intent::Reminder(ReminderRequest { parsed }),
                    confidence,
                };
            }
        }

        let fixed = if folded.any_prefix(CALENDAR_KEYWORDS) {
            Some(Intent::Calendar)
        } else if folded.any_prefix(RESET_KEYWORDS) {
            Some(Intent::ResetChat)
        } else if folded.any_prefix(HELP_KEYWORDS) {
            Some(Intent::Help)
        } else {
            None
        };
        if let Some(intent) = fixed {
            return Classification {
                intent,
                confidence: 0.9,
            };
        }

        Classification {
            intent: Intent::Chat,
            confidence: 0.3,
        }
    }
}

/// Classify a message with the given options.
pub fn detect_intent(
    text: &str,
    options: &ClassifierOptions,
    now: DateTime<FixedOffset>,
) -> Classification {
    IntentClassifier::new(*options).classify(text, now)
}

fn report_period(folded: &Folded) -> ReportPeriod {
    if folded.any_prefix(WEEK_WORDS) {
        ReportPeriod::Week
    } else if folded.any_prefix(YEAR_WORDS) {
        ReportPeriod::Year
    } else if folded.any_prefix(MONTH_PREFIXES) || folded.any_whole(MONTH_WORDS) {
        ReportPeriod::Month
    } else if folded.any_prefix(DAY_PREFIXES) || folded.any_whole(DAY_WORDS) {
        ReportPeriod::Day
    } else {
        ReportPeriod::Week
    }
}

fn report_bucket(folded: &Folded) -> Option<AccountBucket> {
    if folded.any_prefix(BUSINESS_FILTER) || folded.any_whole(BUSINESS_FILTER_WORDS) {
        Some(AccountBucket::Business)
    } else if folded.any_whole(HOUSEHOLD_FILTER_WORDS) {
        Some(AccountBucket::Household)
    } else if folded.any_prefix(PERSONAL_FILTER) {
        Some(AccountBucket::Personal)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asistan_core::types::Direction;
    use chrono::TimeZone;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 10, 10, 0, 0)
            .unwrap()
    }

    fn classify(text: &str) -> Classification {
        detect_intent(text, &ClassifierOptions::default(), now())
    }

    #[test]
    fn test_amount_makes_financial() {
        let c = classify("500 TL yakıt aldım");
        match c.intent {
            Intent::Financial(tx) => {
                assert_eq!(tx.amount, 500.0);
                assert_eq!(tx.direction, Direction::Expense);
            }
            other => panic!("expected financial, got {other:?}"),
        }
        assert!(c.confidence > 0.85);
    }

    #[test]
    fn test_financial_wins_over_reminder_words() {
        // Amount check runs first even when a time is present.
        let c = classify("yarın 14:00 noter için 2.000 TL ödedim");
        assert_eq!(c.intent.label(), "financial");
    }

    #[test]
    fn test_report_periods() {
        let period = |text: &str| match classify(text).intent {
            Intent::FinancialReport(q) => q.period,
            other => panic!("expected report for {text:?}, got {other:?}"),
        };
        assert_eq!(period("bu hafta ne kadar harcadım"), ReportPeriod::Week);
        assert_eq!(period("bu ay toplam ne kadar"), ReportPeriod::Month);
        assert_eq!(period("aylık rapor"), ReportPeriod::Month);
        assert_eq!(period("bu yıl özet"), ReportPeriod::Year);
        assert_eq!(period("bugün ne kadar kazandım"), ReportPeriod::Day);
        assert_eq!(period("rapor"), ReportPeriod::Week);
        // "ayrıca" must not read as "ay"
        assert_eq!(period("ayrıca durum nedir"), ReportPeriod::Week);
    }

    #[test]
    fn test_report_bucket_filter() {
        let bucket = |text: &str| match classify(text).intent {
            Intent::FinancialReport(q) => q.bucket,
            other => panic!("expected report, got {other:?}"),
        };
        assert_eq!(bucket("galeri bu ay ne kadar"), Some(AccountBucket::Business));
        assert_eq!(bucket("ev masrafları özet"), Some(AccountBucket::Household));
        assert_eq!(bucket("kişisel rapor"), Some(AccountBucket::Personal));
        assert_eq!(bucket("toplam durum"), None);
    }

    #[test]
    fn test_reminder_with_time() {
        let c = classify("yarın saat 14:30 toplantıyı hatırlat");
        match &c.intent {
            Intent::Reminder(req) => {
                let parsed = req.parsed.as_ref().unwrap();
                assert_eq!(parsed.message, "toplantıyı hatırlat");
            }
            other => panic!("expected reminder, got {other:?}"),
        }
        assert_eq!(c.confidence, 0.85);
    }

    #[test]
    fn test_time_alone_is_reminder() {
        let c = classify("2 saat sonra alışveriş");
        assert_eq!(c.intent.label(), "reminder");
    }

    #[test]
    fn test_reminder_keyword_without_time() {
        let c = classify("ilacımı içmeyi unutma");
        assert_eq!(
            c.intent,
            Intent::Reminder(ReminderRequest { parsed: None })
        );
        assert_eq!(c.confidence, 0.6);
    }

    #[test]
    fn test_fixed_keywords() {
        assert_eq!(classify("takvimi bağla").intent, Intent::Calendar);
        assert_eq!(classify("sohbeti sıfırla").intent, Intent::ResetChat);
        assert_eq!(classify("Yeni sohbet başlat").intent, Intent::ResetChat);
        assert_eq!(classify("YARDIM").intent, Intent::Help);
        assert_eq!(classify("neler yapabilirsin, komutlar?").intent, Intent::Help);
    }

    #[test]
    fn test_everything_else_is_chat() {
        let c = classify("Civic mi Corolla mı daha mantıklı?");
        assert_eq!(c.intent, Intent::Chat);
        assert_eq!(c.confidence, 0.3);
    }

    #[test]
    fn test_unresolvable_clock_falls_through_to_chat() {
        assert_eq!(classify("skor 25:99 oldu").intent, Intent::Chat);
    }
}
