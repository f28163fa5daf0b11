use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::NormalizedDate;

static DATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}").unwrap());

/// True when `text` contains something shaped like `DD-MM-YY[YY]`.
pub fn is_date_like(text: &str) -> bool {
    DATE_TOKEN.is_match(text)
}

/// First date-shaped token in `text`.
pub fn find_date(text: &str) -> Option<&str> {
    DATE_TOKEN.find(text).map(|m| m.as_str())
}

/// Canonicalizes statement dates to ISO. Never fails: anything it cannot read
/// becomes `today`, flagged as defaulted.
#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    today: NaiveDate,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DateNormalizer {
    pub fn new() -> Self {
        Self {
            today: Local::now().date_naive(),
        }
    }

    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn normalize(&self, raw: &str) -> NormalizedDate {
        match parse_day_first(raw) {
            Some(date) => NormalizedDate {
                date,
                defaulted: false,
            },
            None => {
                debug!(raw, "unrecognized date, substituting today");
                self.fallback()
            }
        }
    }

    pub fn normalize_str(&self, raw: &str) -> String {
        self.normalize(raw).iso()
    }

    pub fn fallback(&self) -> NormalizedDate {
        NormalizedDate {
            date: self.today,
            defaulted: true,
        }
    }
}

// DD-MM-YYYY when the last part is a 4-digit year, YYYY-MM-DD when the first is.
fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '/')
        .collect();
    let parts: Vec<&str> = clean.split(['-', '/']).collect();
    if parts.len() != 3 {
        return None;
    }
    let (year, month, day) = if parts[2].len() == 4 {
        (parts[2], parts[1], parts[0])
    } else if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Excel serial day number to a calendar date. Epoch is 1899-12-30, which
/// absorbs the 1900 leap-year bug. `None` for values no calendar date can hold.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::try_days(serial.trunc() as i64)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> DateNormalizer {
        DateNormalizer::with_today(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
    }

    #[test]
    fn test_day_first_formats() {
        let n = normalizer();
        assert_eq!(n.normalize_str("02/07/2025"), "2025-07-02");
        assert_eq!(n.normalize_str("2-7-2025"), "2025-07-02");
        assert_eq!(n.normalize_str("Date: 31/12/2024"), "2024-12-31");
    }

    #[test]
    fn test_year_first_format() {
        let n = normalizer();
        assert_eq!(n.normalize_str("2025-7-2"), "2025-07-02");
        assert!(!n.normalize("2025/07/02").defaulted);
    }

    #[test]
    fn test_two_digit_year_falls_back_to_today() {
        let n = normalizer();
        let d = n.normalize("05-1-25");
        assert!(d.defaulted);
        assert_eq!(d.iso(), "2026-01-15");
    }

    #[test]
    fn test_malformed_inputs_default() {
        let n = normalizer();
        for raw in ["", "garbage", "02.07.2025", "1/2", "31-02-2025", "1//2025"] {
            let d = n.normalize(raw);
            assert!(d.defaulted, "expected default for {raw:?}");
            assert_eq!(d.date, n.today());
        }
    }

    #[test]
    fn test_idempotent_on_iso() {
        let n = normalizer();
        for raw in ["2025-07-02", "1999-12-31", "2024-02-29"] {
            let once = n.normalize_str(raw);
            assert_eq!(once, raw);
            assert_eq!(n.normalize_str(&once), once);
        }
    }

    #[test]
    fn test_date_token_detection() {
        assert!(is_date_like("on 02.07.2025 paid"));
        assert!(is_date_like("5/1/25"));
        assert!(!is_date_like("Balance 30790.41"));
        assert_eq!(find_date("x 02/07/2025 y"), Some("02/07/2025"));
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(
            excel_serial_to_date(45667.0),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
        assert_eq!(
            excel_serial_to_date(45667.75),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
    }

    #[test]
    fn test_excel_serial_out_of_range_is_none() {
        assert_eq!(excel_serial_to_date(1e300), None);
        assert_eq!(excel_serial_to_date(-1e300), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
        assert_eq!(excel_serial_to_date(f64::INFINITY), None);
        assert_eq!(excel_serial_to_date(1e12), None);
    }
}
