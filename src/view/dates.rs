use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};
use regex::Regex;
use std::sync::LazyLock;

use crate::feed::parse_published;

pub const UNKNOWN_DATE: &str = "Date inconnue";

const WEEKDAYS: [&str; 7] = [
    "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
];

const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// `14h`, `14h05`, `9H30`
static BARE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\s*[hH]\s*(\d{2})?$").expect("static regex"));

/// `03/05`, `3-5`, `3.5`
static BARE_DAY_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})$").expect("static regex"));

/// Render an item's `date_published` for the list, relative to `now`.
///
/// Three shapes come out of the upstream generator: a bare time for today's
/// items, a bare day/month, or a full date.
pub fn format_published(raw: &str, now: DateTime<FixedOffset>) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return UNKNOWN_DATE.to_string();
    }

    if let Some(caps) = BARE_TIME.captures(raw) {
        let hour: u32 = caps[1].parse().unwrap_or(u32::MAX);
        let minute: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().unwrap_or(u32::MAX),
            None => 0,
        };
        if hour < 24 && minute < 60 {
            return format!("Aujourd'hui à {:02}:{:02}", hour, minute);
        }
        return UNKNOWN_DATE.to_string();
    }

    if let Some(caps) = BARE_DAY_MONTH.captures(raw) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        return match NaiveDate::from_ymd_opt(now.year(), month, day) {
            Some(date) => format!(
                "le {} {} {}",
                weekday_name(date),
                date.day(),
                month_name(date.month())
            ),
            None => UNKNOWN_DATE.to_string(),
        };
    }

    let Some(published) = parse_published(raw) else {
        return UNKNOWN_DATE.to_string();
    };
    let published = published.with_timezone(&now.timezone());

    if published.date_naive() == now.date_naive() {
        format!(
            "Aujourd'hui à {:02}:{:02}",
            published.hour(),
            published.minute()
        )
    } else {
        format!(
            "le {} {} à {:02}:{:02}",
            published.day(),
            month_name(published.month()),
            published.hour(),
            published.minute()
        )
    }
}

fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

fn month_name(month: u32) -> &'static str {
    MONTHS[(month as usize).saturating_sub(1) % 12]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<FixedOffset> {
        // Wednesday 15 May 2024, 18:00 in Paris (summer time).
        DateTime::parse_from_rfc3339("2024-05-15T18:00:00+02:00").unwrap()
    }

    #[test]
    fn test_empty_is_unknown() {
        assert_eq!(format_published("", now()), UNKNOWN_DATE);
        assert_eq!(format_published("   ", now()), UNKNOWN_DATE);
    }

    #[test]
    fn test_bare_time() {
        assert_eq!(format_published("14h05", now()), "Aujourd'hui à 14:05");
        assert_eq!(format_published("9H30", now()), "Aujourd'hui à 09:30");
        assert_eq!(format_published("14h", now()), "Aujourd'hui à 14:00");
        assert_eq!(format_published("25h00", now()), UNKNOWN_DATE);
    }

    #[test]
    fn test_bare_day_month_uses_current_year() {
        // 3 May 2024 was a Friday.
        assert_eq!(format_published("03/05", now()), "le vendredi 3 mai");
        assert_eq!(format_published("3-5", now()), "le vendredi 3 mai");
        assert_eq!(format_published("25.12", now()), "le mercredi 25 décembre");
    }

    #[test]
    fn test_bare_day_month_invalid_calendar_day() {
        assert_eq!(format_published("31/02", now()), UNKNOWN_DATE);
        assert_eq!(format_published("12/13", now()), UNKNOWN_DATE);
    }

    #[test]
    fn test_full_date_same_day() {
        assert_eq!(
            format_published("2024-05-15T07:45:00Z", now()),
            "Aujourd'hui à 09:45"
        );
    }

    #[test]
    fn test_full_date_other_day() {
        assert_eq!(
            format_published("2024-02-01T10:00:00+02:00", now()),
            "le 1 février à 10:00"
        );
        assert_eq!(
            format_published("Tue, 14 May 2024 08:30:00 +0200", now()),
            "le 14 mai à 08:30"
        );
    }

    #[test]
    fn test_full_date_crossing_midnight_uses_now_offset() {
        // 23:30 UTC on the 14th is 01:30 on the 15th in Paris.
        assert_eq!(
            format_published("2024-05-14T23:30:00Z", now()),
            "Aujourd'hui à 01:30"
        );
    }

    #[test]
    fn test_garbage_is_unknown() {
        assert_eq!(format_published("hier soir", now()), UNKNOWN_DATE);
    }
}
