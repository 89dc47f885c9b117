//! Turkish message understanding: intent rules, transaction parsing and
//! time-expression extraction. Everything here is pure and synchronous.

pub mod finance;
pub mod intent;
pub mod text;
pub mod timeparse;

pub use finance::{detect_financial_intent, FinancialAnalysis, FinancialIntentAnalyzer, ParsedTransaction};
pub use intent::{
    detect_intent, Classification, ClassifierOptions, Intent, IntentClassifier, ReminderRequest,
    ReportQuery,
};
pub use timeparse::{parse_time_from_text, ParsedTime};
