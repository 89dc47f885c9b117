//! Time-expression extraction for reminders.
//!
//! Patterns are tried in order on the folded text and the first one that
//! yields a valid time wins. Absolute times ("yarın 14:30", "saat 9") are
//! resolved against `now` in its own offset; relative ones ("2 saat sonra")
//! are added to `now`.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::text::{remove_span, Folded};

/// Words that mark a time as intentionally in the future.
const FUTURE_MARKERS: &[&str] = &["yarin", "sonra"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKind {
    TomorrowAt,
    TodayAt,
    DaysLaterAt,
    At,
    TomorrowHour,
    TodayHour,
    Hour,
    HoursLater,
    MinutesLater,
}

struct TimePattern {
    kind: PatternKind,
    re: Regex,
}

static PATTERNS: LazyLock<Vec<TimePattern>> = LazyLock::new(|| {
    let p = |kind, re: &str| TimePattern {
        kind,
        re: Regex::new(re).unwrap(),
    };
    vec![
        p(PatternKind::TomorrowAt, r"yarin\s+(?:saat\s+)?(\d{1,2})[:.](\d{2})\b"),
        p(PatternKind::TodayAt, r"bugun\s+(?:saat\s+)?(\d{1,2})[:.](\d{2})\b"),
        p(PatternKind::DaysLaterAt, r"\b(\d{1,3})\s*gun\s+sonra\s+(?:saat\s+)?(\d{1,2})[:.](\d{2})\b"),
        // A dot separator only counts after "saat"; bare "14.30" reads as a number.
        p(PatternKind::At, r"saat\s+(\d{1,2})[:.](\d{2})\b|\b(\d{1,2}):(\d{2})\b"),
        p(PatternKind::TomorrowHour, r"yarin\s+saat\s+(\d{1,2})\b"),
        p(PatternKind::TodayHour, r"bugun\s+saat\s+(\d{1,2})\b"),
        p(PatternKind::Hour, r"saat\s+(\d{1,2})\b"),
        p(PatternKind::HoursLater, r"\b(\d{1,3})\s*saat\s+sonra"),
        p(PatternKind::MinutesLater, r"\b(\d{1,4})\s*dakika\s+sonra"),
    ]
});

/// A time expression found in a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTime {
    /// Absolute trigger time, in the offset of the `now` passed in.
    pub at: DateTime<FixedOffset>,
    /// Message with the time expression removed, whitespace collapsed.
    pub message: String,
    /// The time expression as written in the original text.
    pub matched: String,
}

enum Resolved {
    Absolute(DateTime<FixedOffset>),
    Relative(DateTime<FixedOffset>),
}

/// Extract the first time expression from `text`.
pub fn parse_time_from_text(text: &str, now: DateTime<FixedOffset>) -> Option<ParsedTime> {
    parse_folded(text, &Folded::new(text), now)
}

pub(crate) fn parse_folded(
    original: &str,
    folded: &Folded,
    now: DateTime<FixedOffset>,
) -> Option<ParsedTime> {
    for pattern in PATTERNS.iter() {
        let Some(caps) = pattern.re.captures(folded.as_str()) else {
            continue;
        };
        let Some(resolved) = resolve(pattern.kind, &caps, now) else {
            continue;
        };

        let at = match resolved {
            Resolved::Absolute(at) if at < now && !folded.any_prefix(FUTURE_MARKERS) => {
                at + Duration::days(1)
            }
            Resolved::Absolute(at) | Resolved::Relative(at) => at,
        };

        let whole = caps.get(0)?;
        let span = folded.original_range(whole.start()..whole.end());
        return Some(ParsedTime {
            at,
            matched: original[span.clone()].trim().to_string(),
            message: remove_span(original, span),
        });
    }
    None
}

/// Whether any time pattern matches, without resolving it.
pub(crate) fn has_time_expression(folded: &Folded) -> bool {
    PATTERNS.iter().any(|p| p.re.is_match(folded.as_str()))
}

fn resolve(kind: PatternKind, caps: &Captures, now: DateTime<FixedOffset>) -> Option<Resolved> {
    let num = |i: usize| caps.get(i)?.as_str().parse::<i64>().ok();

    let resolved = match kind {
        PatternKind::TomorrowAt => Resolved::Absolute(at_day(now, 1, num(1)?, num(2)?)?),
        PatternKind::TodayAt => Resolved::Absolute(at_day(now, 0, num(1)?, num(2)?)?),
        PatternKind::DaysLaterAt => Resolved::Absolute(at_day(now, num(1)?, num(2)?, num(3)?)?),
        PatternKind::At => {
            let (hour, minute) = match (num(1), num(2)) {
                (Some(hour), Some(minute)) => (hour, minute),
                _ => (num(3)?, num(4)?),
            };
            Resolved::Absolute(at_day(now, 0, hour, minute)?)
        }
        PatternKind::TomorrowHour => Resolved::Absolute(at_day(now, 1, num(1)?, 0)?),
        PatternKind::TodayHour => Resolved::Absolute(at_day(now, 0, num(1)?, 0)?),
        PatternKind::Hour => Resolved::Absolute(at_day(now, 0, num(1)?, 0)?),
        PatternKind::HoursLater => Resolved::Relative(now + Duration::hours(num(1)?)),
        PatternKind::MinutesLater => Resolved::Relative(now + Duration::minutes(num(1)?)),
    };
    Some(resolved)
}

/// `now`'s date plus `days`, at `hour:minute:00` in `now`'s offset.
fn at_day(now: DateTime<FixedOffset>, days: i64, hour: i64, minute: i64) -> Option<DateTime<FixedOffset>> {
    let time = NaiveTime::from_hms_opt(u32::try_from(hour).ok()?, u32::try_from(minute).ok()?, 0)?;
    let date = now.date_naive().checked_add_signed(Duration::days(days))?;
    now.timezone()
        .from_local_datetime(&date.and_time(time))
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2025-03-10 10:00:00 +03:00
    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 10, 10, 0, 0)
            .unwrap()
    }

    fn local(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, day, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_tomorrow_with_time() {
        let parsed = parse_time_from_text("yarın saat 14:30 toplantı", now()).unwrap();
        assert_eq!(parsed.at, local(11, 14, 30));
        assert_eq!(parsed.message, "toplantı");
        assert_eq!(parsed.matched, "yarın saat 14:30");
    }

    #[test]
    fn test_hours_later_is_relative() {
        let parsed = parse_time_from_text("2 saat sonra alışveriş", now()).unwrap();
        assert_eq!(parsed.at, now() + Duration::hours(2));
        assert_eq!(parsed.message, "alışveriş");
    }

    #[test]
    fn test_relative_keeps_seconds_of_now() {
        let now = now() + Duration::seconds(17);
        let parsed = parse_time_from_text("15 dakika sonra çayı kapat", now).unwrap();
        assert_eq!(parsed.at, now + Duration::minutes(15));
        assert_eq!(parsed.message, "çayı kapat");
    }

    #[test]
    fn test_past_bare_time_rolls_forward_one_day() {
        let parsed = parse_time_from_text("09:15 ilaç iç", now()).unwrap();
        assert_eq!(parsed.at, local(11, 9, 15));
        assert_eq!(parsed.message, "ilaç iç");
    }

    #[test]
    fn test_future_bare_time_stays_today() {
        let parsed = parse_time_from_text("müşteriyi ara 16:45", now()).unwrap();
        assert_eq!(parsed.at, local(10, 16, 45));
        assert_eq!(parsed.message, "müşteriyi ara");
    }

    #[test]
    fn test_past_today_rolls_forward() {
        let parsed = parse_time_from_text("bugün 08:00 rapor", now()).unwrap();
        assert_eq!(parsed.at, local(11, 8, 0));
    }

    #[test]
    fn test_tomorrow_marker_blocks_roll_forward() {
        // The bare time matches, but "yarın" elsewhere in the text means no roll.
        let parsed = parse_time_from_text("09:00 yarın değil", now()).unwrap();
        assert_eq!(parsed.at, local(10, 9, 0));
    }

    #[test]
    fn test_hour_only_defaults_minute_to_zero() {
        let parsed = parse_time_from_text("yarın saat 9 noter", now()).unwrap();
        assert_eq!(parsed.at, local(11, 9, 0));
        assert_eq!(parsed.message, "noter");

        let parsed = parse_time_from_text("saat 17 galeriyi kapat", now()).unwrap();
        assert_eq!(parsed.at, local(10, 17, 0));
        assert_eq!(parsed.message, "galeriyi kapat");
    }

    #[test]
    fn test_days_later_with_time() {
        let parsed = parse_time_from_text("3 gün sonra 10:30 sigorta yenile", now()).unwrap();
        assert_eq!(parsed.at, local(13, 10, 30));
        assert_eq!(parsed.message, "sigorta yenile");
    }

    #[test]
    fn test_dotted_time_after_day_word() {
        let parsed = parse_time_from_text("Yarın 18.00 ekspertiz", now()).unwrap();
        assert_eq!(parsed.at, local(11, 18, 0));
        assert_eq!(parsed.message, "ekspertiz");
    }

    #[test]
    fn test_dotted_time_after_saat_keeps_minutes() {
        let parsed = parse_time_from_text("saat 14.30 toplantı", now()).unwrap();
        assert_eq!(parsed.at, local(10, 14, 30));
        assert_eq!(parsed.message, "toplantı");
        assert_eq!(parsed.matched, "saat 14.30");

        let parsed = parse_time_from_text("galeri Saat 16:15 kapanış", now()).unwrap();
        assert_eq!(parsed.at, local(10, 16, 15));
        assert_eq!(parsed.message, "galeri kapanış");
    }

    #[test]
    fn test_exactly_now_is_not_rolled() {
        let parsed = parse_time_from_text("10:00 çay", now()).unwrap();
        assert_eq!(parsed.at, now());
    }

    #[test]
    fn test_first_pattern_wins() {
        let parsed = parse_time_from_text("yarın 11:00 ve 15:00 arası", now()).unwrap();
        assert_eq!(parsed.at, local(11, 11, 0));
        assert_eq!(parsed.message, "ve 15:00 arası");
    }

    #[test]
    fn test_invalid_clock_is_not_a_match() {
        assert!(parse_time_from_text("25:99 olmaz", now()).is_none());
    }

    #[test]
    fn test_only_time_leaves_empty_message() {
        let parsed = parse_time_from_text("yarın saat 14:30", now()).unwrap();
        assert!(parsed.message.is_empty());
    }

    #[test]
    fn test_no_time_expression() {
        assert!(parse_time_from_text("araba yıkamayı unutma", now()).is_none());
    }
}
