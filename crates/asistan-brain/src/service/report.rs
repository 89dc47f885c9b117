use asistan_core::types::{AccountBucket, Direction, ReportPeriod, Summary, Transaction};

/// Whole lira with Turkish thousands grouping: `350000.0` → `350.000`.
pub fn format_amount(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Capitalize the first letter of each word, Turkish-aware for `i`.
fn title_case(text: &str) -> String {
    text.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some('i') => format!("İ{}", chars.as_str()),
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn heading(period: ReportPeriod, bucket: Option<AccountBucket>) -> String {
    match bucket {
        Some(bucket) => format!("{} ({})", period.label(), bucket.label()),
        None => period.label().to_string(),
    }
}

pub fn format_report(summary: &Summary, period: ReportPeriod, bucket: Option<AccountBucket>) -> String {
    if summary.is_empty() {
        return format!("📊 {} hiç işlem yok.", heading(period, bucket));
    }

    let net = summary.net();
    let net_emoji = if net >= 0.0 { "💰" } else { "📉" };

    let mut report = format!("📊 {} Mali Durum\n", heading(period, bucket));
    report.push_str(&"=".repeat(30));
    report.push_str("\n\n");
    report.push_str(&format!("📈 Toplam Gelir: {} TL\n", format_amount(summary.income_total)));
    report.push_str(&format!("📉 Toplam Gider: {} TL\n", format_amount(summary.expense_total)));
    report.push_str(&format!("{net_emoji} Net Durum: {} TL\n", format_amount(net)));

    for (direction, title) in [
        (Direction::Income, "📈 Gelir Detayları:"),
        (Direction::Expense, "📉 Gider Detayları:"),
    ] {
        let items: Vec<String> = summary
            .rows
            .iter()
            .filter(|row| row.direction == direction)
            .map(|row| format!("  • {}: {} TL", title_case(&row.category), format_amount(row.total)))
            .collect();
        if !items.is_empty() {
            report.push_str(&format!("\n{title}\n{}\n", items.join("\n")));
        }
    }

    report
}

/// Confirmation shown after a transaction is recorded.
pub fn format_transaction_saved(tx: &Transaction) -> String {
    let emoji = match tx.direction {
        Direction::Income => "📈",
        Direction::Expense => "📉",
    };
    format!(
        "{emoji} İşlem kaydedildi!\n\n\
         💰 Miktar: {} TL\n\
         📁 Kategori: {}\n\
         🏦 Hesap: {}\n\
         📝 Açıklama: {}\n\
         🏷️ Tür: {}",
        format_amount(tx.amount),
        title_case(&tx.category),
        tx.bucket.label(),
        tx.description,
        tx.direction.label(),
    )
}
