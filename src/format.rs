//! Display strings for the tables and cards, in the `en-IN` locale.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::model::parse_date;

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sept", "Oct", "Nov", "Dec",
];

pub const NOT_AVAILABLE: &str = "N/A";

/// `₹1,23,456.50` style: two decimals, last three integer digits grouped
/// together, pairs above that.
pub fn format_salary(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let grouped = if whole.len() <= 3 {
        whole
    } else {
        let (head, tail) = whole.split_at(whole.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{tail}", groups.join(","))
    };

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}₹{grouped}.{fraction:02}")
}

pub fn month_short(month: u32) -> &'static str {
    MONTHS_SHORT
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// `5 Jan 2025`.
pub fn format_date(date: NaiveDate) -> String {
    format!("{} {} {}", date.day(), month_short(date.month()), date.year())
}

/// Formats an ISO date or instant; anything unreadable renders as
/// `Invalid Date`.
pub fn format_date_str(text: &str) -> String {
    parse_date(text)
        .map(format_date)
        .unwrap_or_else(|| "Invalid Date".to_string())
}

/// `Jan 2025`, the key used for hires-per-month buckets.
pub fn month_label(year: i32, month: u32) -> String {
    format!("{} {year}", month_short(month))
}

pub fn display_salary(salary: Option<f64>) -> String {
    salary
        .map(format_salary)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn display_date(date: Option<NaiveDate>) -> String {
    date.map(format_date)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

const INTERVALS: [(&str, i64); 7] = [
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// `3 hours ago`, `1 day ago`, or `just now`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    for (unit, length) in INTERVALS {
        let count = seconds / length;
        if count >= 1 {
            return if count == 1 {
                format!("1 {unit} ago")
            } else {
                format!("{count} {unit}s ago")
            };
        }
    }
    "just now".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn indian_grouping() {
        assert_eq!(format_salary(0.0), "₹0.00");
        assert_eq!(format_salary(999.5), "₹999.50");
        assert_eq!(format_salary(1000.0), "₹1,000.00");
        assert_eq!(format_salary(123456.0), "₹1,23,456.00");
        assert_eq!(format_salary(12345678.9), "₹1,23,45,678.90");
        assert_eq!(format_salary(-5.0), "-₹5.00");
    }

    #[test]
    fn short_dates() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(format_date(date), "5 Jan 2025");
        assert_eq!(format_date_str("2024-09-30"), "30 Sept 2024");
        assert_eq!(format_date_str("2025-03-05T09:30:00.000Z"), "5 Mar 2025");
        assert_eq!(format_date_str("soon"), "Invalid Date");
        assert_eq!(display_date(None), "N/A");
        assert_eq!(month_label(2025, 12), "Dec 2025");
    }

    #[test]
    fn relative_times() {
        let now = Utc::now();
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(now - Duration::seconds(1), now), "1 second ago");
        assert_eq!(time_ago(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(time_ago(now - Duration::days(1), now), "1 day ago");
        assert_eq!(time_ago(now - Duration::days(400), now), "1 year ago");
    }
}
