//! Financial message analysis: amount, direction, bucket and category.

use std::sync::LazyLock;

use asistan_core::config::TieBreak;
use asistan_core::types::{AccountBucket, Direction};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::{collapse_whitespace, truncate_chars, Folded};

/// Amount followed by a currency marker, matched on folded text.
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d.,]*)\s*(?:tl\b|₺|lira\b)").unwrap());

static THOUSANDS_DOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:\.\d{3})+$").unwrap());

pub const MAX_DESCRIPTION_CHARS: usize = 200;
pub const DEFAULT_DESCRIPTION: &str = "İşlem";
pub const DEFAULT_CATEGORY: &str = "diğer";

const INCOME_KEYWORDS: &[&str] = &[
    "sattim", "sattik", "kazandim", "gelir", "komisyon", "satis", "maas", "tahsil",
];
const EXPENSE_KEYWORDS: &[&str] = &[
    "aldim", "harcadim", "odedim", "masraf", "gider", "fatura",
];
/// Income words strong enough to win a tie against expense words.
const SALE_KEYWORDS: &[&str] = &["sattim", "sattik", "satis", "komisyon"];

const BUSINESS_KEYWORDS: &[&str] = &[
    "galeri", "sirket", "isyeri", "musteri", "araba", "arac", "sattim", "sattik", "satis",
    "komisyon", "noter", "ekspertiz",
];
/// Matched as whole words; "ev" as a prefix would hit "evet" and "evrak".
const HOUSEHOLD_WORDS: &[&str] = &[
    "ev", "eve", "evin", "evde", "evim", "evimin", "evimiz", "aile", "ailem", "cocuk",
    "cocugun", "cocuklar", "okul",
];

struct CategoryRule {
    bucket: AccountBucket,
    direction: Direction,
    category: &'static str,
    keywords: &'static [&'static str],
}

/// Category keywords too short to match as a prefix ("su" would hit "süt").
const WHOLE_WORD_KEYWORDS: &[&str] = &["su", "suyu"];

/// Ordered per-bucket rules; the first rule whose keyword appears wins.
const CATEGORY_RULES: &[CategoryRule] = &[
    // Galeri
    CategoryRule { bucket: AccountBucket::Business, direction: Direction::Income, category: "satış", keywords: &["sattim", "sattik", "satis"] },
    CategoryRule { bucket: AccountBucket::Business, direction: Direction::Income, category: "komisyon", keywords: &["komisyon"] },
    CategoryRule { bucket: AccountBucket::Business, direction: Direction::Income, category: "kiralama", keywords: &["kiraya", "kiralama"] },
    CategoryRule { bucket: AccountBucket::Business, direction: Direction::Expense, category: "yakıt", keywords: &["yakit", "benzin", "mazot", "dizel"] },
    CategoryRule { bucket: AccountBucket::Business, direction: Direction::Expense, category: "kira", keywords: &["kira"] },
    CategoryRule { bucket: AccountBucket::Business, direction: Direction::Expense, category: "bakım", keywords: &["bakim", "tamir", "servis", "lastik", "parca", "yikama"] },
    CategoryRule { bucket: AccountBucket::Business, direction: Direction::Expense, category: "reklam", keywords: &["ilan", "reklam", "sahibinden"] },
    CategoryRule { bucket: AccountBucket::Business, direction: Direction::Expense, category: "noter", keywords: &["noter", "ekspertiz", "plaka", "vergi"] },
    CategoryRule { bucket: AccountBucket::Business, direction: Direction::Expense, category: "personel", keywords: &["maas", "personel", "eleman", "prim"] },
    CategoryRule { bucket: AccountBucket::Business, direction: Direction::Expense, category: "alım", keywords: &["aldim", "araba", "arac"] },
    // Kişisel
    CategoryRule { bucket: AccountBucket::Personal, direction: Direction::Income, category: "maaş", keywords: &["maas"] },
    CategoryRule { bucket: AccountBucket::Personal, direction: Direction::Income, category: "satış", keywords: &["sattim", "satis"] },
    CategoryRule { bucket: AccountBucket::Personal, direction: Direction::Expense, category: "yakıt", keywords: &["yakit", "benzin", "mazot"] },
    CategoryRule { bucket: AccountBucket::Personal, direction: Direction::Expense, category: "market", keywords: &["market", "bakkal", "manav"] },
    CategoryRule { bucket: AccountBucket::Personal, direction: Direction::Expense, category: "yemek", keywords: &["yemek", "restoran", "lokanta", "kahve", "kafe"] },
    CategoryRule { bucket: AccountBucket::Personal, direction: Direction::Expense, category: "ulaşım", keywords: &["taksi", "otobus", "metro", "bilet"] },
    CategoryRule { bucket: AccountBucket::Personal, direction: Direction::Expense, category: "fatura", keywords: &["fatura", "elektrik", "dogalgaz", "internet", "telefon"] },
    CategoryRule { bucket: AccountBucket::Personal, direction: Direction::Expense, category: "sağlık", keywords: &["eczane", "ilac", "doktor", "hastane"] },
    CategoryRule { bucket: AccountBucket::Personal, direction: Direction::Expense, category: "giyim", keywords: &["giyim", "kiyafet", "ayakkabi", "mont"] },
    CategoryRule { bucket: AccountBucket::Personal, direction: Direction::Expense, category: "eğlence", keywords: &["sinema", "konser", "oyun", "tatil"] },
    // Ev
    CategoryRule { bucket: AccountBucket::Household, direction: Direction::Expense, category: "kira", keywords: &["kira", "aidat"] },
    CategoryRule { bucket: AccountBucket::Household, direction: Direction::Expense, category: "fatura", keywords: &["fatura", "elektrik", "dogalgaz", "su", "suyu", "internet"] },
    CategoryRule { bucket: AccountBucket::Household, direction: Direction::Expense, category: "market", keywords: &["market", "bakkal", "manav", "pazar"] },
    CategoryRule { bucket: AccountBucket::Household, direction: Direction::Expense, category: "eğitim", keywords: &["okul", "kurs", "kitap", "harclik"] },
    CategoryRule { bucket: AccountBucket::Household, direction: Direction::Expense, category: "mobilya", keywords: &["mobilya", "esya", "beyaz esya"] },
    CategoryRule { bucket: AccountBucket::Household, direction: Direction::Income, category: "kira geliri", keywords: &["kira"] },
];

/// A financial message reduced to the fields stored as a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub amount: f64,
    pub direction: Direction,
    pub bucket: AccountBucket,
    pub category: String,
    pub description: String,
}

/// Signals behind a parsed transaction, with a confidence score.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialAnalysis {
    pub transaction: ParsedTransaction,
    pub confidence: f32,
    pub income_hits: Vec<&'static str>,
    pub expense_hits: Vec<&'static str>,
    pub bucket_hit: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialIntentAnalyzer {
    tie_break: TieBreak,
}

impl FinancialIntentAnalyzer {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    /// Analyze a message. Returns `None` when it carries no positive amount.
    pub fn analyze(&self, text: &str) -> Option<FinancialAnalysis> {
        self.analyze_folded(text, &Folded::new(text))
    }

    pub(crate) fn analyze_folded(&self, original: &str, folded: &Folded) -> Option<FinancialAnalysis> {
        let caps = AMOUNT_RE.captures(folded.as_str())?;
        let amount = parse_amount(caps.get(1)?.as_str())?;
        if amount <= 0.0 {
            return None;
        }

        let income_hits = folded.hits(INCOME_KEYWORDS);
        let expense_hits = folded.hits(EXPENSE_KEYWORDS);
        let direction = resolve_direction(
            !income_hits.is_empty(),
            !expense_hits.is_empty(),
            folded.any_prefix(SALE_KEYWORDS),
            self.tie_break,
        );

        let (bucket, bucket_hit) = detect_bucket(folded);
        let category = categorize(folded, bucket, direction);

        let description = truncate_chars(&strip_amounts(original, folded), MAX_DESCRIPTION_CHARS);
        let description = if description.is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            description
        };

        let mut confidence = 0.6;
        match (income_hits.is_empty(), expense_hits.is_empty()) {
            (false, true) | (true, false) => confidence += 0.25,
            (false, false) => confidence += 0.1,
            (true, true) => {}
        }
        if bucket_hit {
            confidence += 0.1;
        }
        if category != DEFAULT_CATEGORY {
            confidence += 0.05;
        }

        Some(FinancialAnalysis {
            transaction: ParsedTransaction {
                amount,
                direction,
                bucket,
                category: category.to_string(),
                description,
            },
            confidence: f32::min(confidence, 1.0),
            income_hits,
            expense_hits,
            bucket_hit,
        })
    }
}

/// The original text with every amount cut out, whitespace collapsed.
fn strip_amounts(original: &str, folded: &Folded) -> String {
    let spans: Vec<_> = AMOUNT_RE
        .find_iter(folded.as_str())
        .map(|m| folded.original_range(m.start()..m.end()))
        .collect();

    // Back to front so earlier spans stay valid.
    let mut text = original.to_string();
    for span in spans.into_iter().rev() {
        text.replace_range(span, " ");
    }
    collapse_whitespace(&text)
}

/// Parse a financial message with the given tie-break policy.
pub fn detect_financial_intent(text: &str, tie_break: TieBreak) -> Option<ParsedTransaction> {
    FinancialIntentAnalyzer::new(tie_break)
        .analyze(text)
        .map(|a| a.transaction)
}

/// Decide income vs. expense from keyword hits.
///
/// Messages with no direction keyword count as expenses.
pub fn resolve_direction(
    has_income: bool,
    has_expense: bool,
    has_sale_word: bool,
    tie_break: TieBreak,
) -> Direction {
    match (has_income, has_expense) {
        (true, false) => Direction::Income,
        (false, _) => Direction::Expense,
        (true, true) => match tie_break {
            TieBreak::SaleWeighted if has_sale_word => Direction::Income,
            _ => Direction::Expense,
        },
    }
}

fn detect_bucket(folded: &Folded) -> (AccountBucket, bool) {
    if folded.any_prefix(BUSINESS_KEYWORDS) {
        (AccountBucket::Business, true)
    } else if folded.any_whole(HOUSEHOLD_WORDS) {
        (AccountBucket::Household, true)
    } else {
        (AccountBucket::Personal, false)
    }
}

fn categorize(folded: &Folded, bucket: AccountBucket, direction: Direction) -> &'static str {
    CATEGORY_RULES
        .iter()
        .filter(|r| r.bucket == bucket && r.direction == direction)
        .find(|r| r.keywords.iter().any(|kw| matches_keyword(folded, kw)))
        .map_or(DEFAULT_CATEGORY, |r| r.category)
}

fn matches_keyword(folded: &Folded, keyword: &str) -> bool {
    if WHOLE_WORD_KEYWORDS.contains(&keyword) {
        folded.has_whole_word(keyword)
    } else {
        folded.has_prefix_word(keyword)
    }
}

/// Parse an amount written with Turkish or English separators.
///
/// `350.000` and `1.250,50` use the dot for thousands; a lone comma or a dot
/// not followed by exactly three-digit groups is the decimal separator.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim_end_matches(['.', ',']);
    if raw.is_empty() {
        return None;
    }

    let normalized = match (raw.rfind('.'), raw.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => raw.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => raw.replace(',', ""),
        (None, Some(_)) if raw.matches(',').count() > 1 => raw.replace(',', ""),
        (None, Some(_)) => raw.replace(',', "."),
        (Some(_), None) if THOUSANDS_DOT_RE.is_match(raw) => raw.replace('.', ""),
        (Some(_), None) if raw.matches('.').count() > 1 => return None,
        _ => raw.to_string(),
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
