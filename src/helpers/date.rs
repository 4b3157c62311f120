//! Date helper functions

use chrono::{DateTime, Datelike, TimeZone};

use crate::i18n::I18n;

/// Format a date with a date-fns style pattern, using localized month names
///
/// Supported tokens: `yyyy`, `yy`, `MMMM`, `MMM`, `MM`, `M`, `dd`, `d`,
/// `HH`, `mm`, `ss`. The Moment.js spellings `YYYY` and `DD` are accepted
/// too. Text inside single quotes is copied as-is.
///
/// # Examples
/// ```ignore
/// format_date(&date, "dd MMM yyyy", &I18n::new("pt-BR")) // -> "15 mar 2021"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, pattern: &str, i18n: &I18n) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            let end = chars[i + 1..]
                .iter()
                .position(|&q| q == '\'')
                .map(|p| i + 1 + p)
                .unwrap_or(chars.len());
            out.extend(&chars[i + 1..end]);
            i = end + 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&r| r == c).count();
        let token: String = chars[i..i + run].iter().collect();
        match render_token(date, &token, i18n) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&token),
        }
        i += run;
    }

    out
}

fn render_token<Tz: TimeZone>(date: &DateTime<Tz>, token: &str, i18n: &I18n) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    let month = date.month0() as usize;
    let value = match token {
        "yyyy" | "YYYY" => date.format("%Y").to_string(),
        "yy" | "YY" => date.format("%y").to_string(),
        "MMMM" => month_name(i18n, "months.long", month)
            .unwrap_or_else(|| date.format("%B").to_string()),
        "MMM" => month_name(i18n, "months.short", month)
            .unwrap_or_else(|| date.format("%b").to_string()),
        "MM" => date.format("%m").to_string(),
        "M" => date.month().to_string(),
        "dd" | "DD" => date.format("%d").to_string(),
        "d" | "D" => date.day().to_string(),
        "HH" => date.format("%H").to_string(),
        "mm" => date.format("%M").to_string(),
        "ss" => date.format("%S").to_string(),
        _ => return None,
    };
    Some(value)
}

fn month_name(i18n: &I18n, key: &str, month0: usize) -> Option<String> {
    i18n.get_list(key).into_iter().nth(month0)
}

/// Format a date in ISO 8601 / XML format (for `<time datetime>`)
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_date_pt_br() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 10, 30, 0).unwrap();
        let i18n = I18n::new("pt-BR");
        assert_eq!(format_date(&date, "dd MMM yyyy", &i18n), "15 mar 2021");
        assert_eq!(format_date(&date, "d 'de' MMMM", &i18n), "15 de março");
    }

    #[test]
    fn test_format_date_en() {
        let date = Utc.with_ymd_and_hms(2024, 1, 5, 9, 7, 3).unwrap();
        let i18n = I18n::new("en");
        assert_eq!(format_date(&date, "yyyy-MM-dd", &i18n), "2024-01-05");
        assert_eq!(format_date(&date, "YYYY/MM/DD HH:mm:ss", &i18n), "2024/01/05 09:07:03");
        assert_eq!(format_date(&date, "MMM d, yyyy", &i18n), "Jan 5, 2024");
    }

    #[test]
    fn test_unknown_tokens_are_literal() {
        let date = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        assert_eq!(format_date(&date, "yyyy xx", &I18n::default()), "2024 xx");
        assert_eq!(format_date(&date, "'open", &I18n::default()), "open");
    }

    #[test]
    fn test_date_xml() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 10, 30, 0).unwrap();
        assert_eq!(date_xml(&date), "2021-03-15T10:30:00+00:00");
    }
}
