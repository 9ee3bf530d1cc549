use chrono::{Datelike, NaiveDate};

fn parse_release_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

pub fn release_year(date: &str) -> String {
    parse_release_date(date)
        .map(|d| d.year().to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn release_date_long(date: &str) -> String {
    parse_release_date(date)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "Unknown date".to_string())
}

pub fn format_rating(vote_average: f64) -> String {
    format!("{vote_average:.1}")
}

pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{}h {}min", m / 60, m % 60),
        _ => "Unknown runtime".to_string(),
    }
}

/// Whole US dollars with thousands separators.
pub fn format_usd(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("${out}")
}
