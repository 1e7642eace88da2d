//! Date helper functions

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use chrono_tz::Tz;

/// Abbreviated month names, pt-BR
const MONTHS_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Abbreviated month names, English
const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Abbreviated month names for a language, January first
pub fn month_names(language: &str) -> &'static [&'static str; 12] {
    if language.to_ascii_lowercase().starts_with("pt") {
        &MONTHS_PT_BR
    } else {
        &MONTHS_EN
    }
}

/// Parse a publication date as sent by the CMS.
///
/// Accepts full timestamps (`2021-03-15T19:25:28+0000`, RFC 3339) and plain
/// dates (`2021-03-15`).
pub fn parse_publication_date(value: &str, tz: &Tz) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(tz).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(tz).date_naive());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Format a date with a date-fns style pattern (`dd`, `MMM`, `MM`, `yyyy`)
pub fn format_date(date: &NaiveDate, format: &str, language: &str) -> String {
    let month_name = month_names(language)[date.month0() as usize];

    // Longest tokens first so `MMM` is not eaten by `MM`
    let replacements = [
        ("yyyy", format!("{:04}", date.year())),
        ("MMM", month_name.to_string()),
        ("MM", format!("{:02}", date.month())),
        ("dd", format!("{:02}", date.day())),
    ];

    let mut result = String::new();
    let mut rest = format;
    'outer: while !rest.is_empty() {
        for (token, value) in &replacements {
            if let Some(tail) = rest.strip_prefix(token) {
                result.push_str(value);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            result.push(c);
        }
        rest = chars.as_str();
    }
    result
}

/// Parse and format a publication date, empty when missing or unparseable
pub fn display_date(value: Option<&str>, format: &str, language: &str, timezone: &str) -> String {
    let tz: Tz = timezone.parse().unwrap_or(Tz::UTC);
    value
        .and_then(|v| parse_publication_date(v, &tz))
        .map(|d| format_date(&d, format, language))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_pt_br() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
        assert_eq!(format_date(&date, "dd MMM yyyy", "pt-BR"), "15 mar 2021");
        assert_eq!(format_date(&date, "yyyy-MM-dd", "pt-BR"), "2021-03-15");
        assert_eq!(format_date(&date, "dd MMM yyyy", "en"), "15 Mar 2021");
    }

    #[test]
    fn test_parse_publication_date() {
        let tz: Tz = "America/Sao_Paulo".parse().unwrap();
        // 02:00 UTC is still the previous day in Sao Paulo
        assert_eq!(
            parse_publication_date("2021-03-16T02:00:00+0000", &tz),
            NaiveDate::from_ymd_opt(2021, 3, 15)
        );
        assert_eq!(
            parse_publication_date("2021-03-15", &tz),
            NaiveDate::from_ymd_opt(2021, 3, 15)
        );
        assert_eq!(parse_publication_date("someday", &tz), None);
    }

    #[test]
    fn test_display_date() {
        assert_eq!(
            display_date(Some("2021-03-15T19:25:28+0000"), "dd MMM yyyy", "pt-BR", "America/Sao_Paulo"),
            "15 mar 2021"
        );
        assert_eq!(display_date(None, "dd MMM yyyy", "pt-BR", "UTC"), "");
    }
}
