//! Date parsing and range validation helpers

use chrono::{NaiveDate, TimeZone, Utc};

use crate::{Error, Result, types::DateRange};

/// Wire format of dates in URLs and storage
pub const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

/// Display and edit format of dates in the dashboard
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Parse an 8-digit `YYYYMMDD` date
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if the input is not exactly eight digits
/// forming a valid calendar date.
pub fn parse_compact_date(input: &str) -> Result<NaiveDate> {
    if input.len() != 8 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidDate {
            input: input.to_string(),
        });
    }
    NaiveDate::parse_from_str(input, COMPACT_DATE_FORMAT).map_err(|_| Error::InvalidDate {
        input: input.to_string(),
    })
}

/// Format a date as `YYYYMMDD`
#[must_use]
pub fn format_compact_date(date: NaiveDate) -> String {
    date.format(COMPACT_DATE_FORMAT).to_string()
}

/// Parse a `DD/MM/YYYY` date as typed in the range picker
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if the input does not match the display format.
pub fn parse_display_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DISPLAY_DATE_FORMAT).map_err(|_| Error::InvalidDate {
        input: trimmed.to_string(),
    })
}

/// Format a date as `DD/MM/YYYY`
#[must_use]
pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Current calendar day in the given timezone
#[must_use]
pub fn today_in<Tz: TimeZone>(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

/// Reject reversed ranges and ranges ending after `today`
///
/// # Errors
///
/// Returns [`Error::InvalidDateRange`] describing the failed check.
pub fn check_valid_date_range(range: &DateRange, today: NaiveDate) -> Result<()> {
    if !range.is_ordered() {
        return Err(Error::InvalidDateRange {
            reason: "start date is after end date".to_string(),
        });
    }
    if range.end > today {
        return Err(Error::InvalidDateRange {
            reason: "end date is in the future".to_string(),
        });
    }
    Ok(())
}

/// Reject ranges whose span `end - start` reaches `max_days`
///
/// # Errors
///
/// Returns [`Error::DateRangeTooLong`] when the range is too wide.
pub fn check_max_range(range: &DateRange, max_days: i64) -> Result<()> {
    if (range.end - range.start).num_days() >= max_days {
        return Err(Error::DateRangeTooLong { max_days });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_compact_date() {
        assert_eq!(parse_compact_date("20240107").unwrap(), date(2024, 1, 7));
        assert_eq!(format_compact_date(date(2024, 1, 7)), "20240107");
    }

    #[test]
    fn test_parse_compact_date_rejects_bad_input() {
        for input in ["2024017", "2024-01-07", "20241301", "20240230", "", "2024010a", "202401070"] {
            assert!(
                matches!(parse_compact_date(input), Err(Error::InvalidDate { .. })),
                "accepted {input}"
            );
        }
    }

    #[test]
    fn test_display_format() {
        assert_eq!(parse_display_date("07/01/2024").unwrap(), date(2024, 1, 7));
        assert_eq!(parse_display_date(" 29/02/2024 ").unwrap(), date(2024, 2, 29));
        assert_eq!(format_display_date(date(2024, 1, 7)), "07/01/2024");
        assert!(parse_display_date("2024-01-07").is_err());
        assert!(parse_display_date("31/02/2024").is_err());
    }

    #[test]
    fn test_check_valid_date_range() {
        let today = date(2024, 3, 10);
        assert!(check_valid_date_range(&DateRange::new(date(2024, 3, 1), today), today).is_ok());
        assert!(matches!(
            check_valid_date_range(&DateRange::new(date(2024, 3, 5), date(2024, 3, 1)), today),
            Err(Error::InvalidDateRange { .. })
        ));
        assert!(matches!(
            check_valid_date_range(&DateRange::new(date(2024, 3, 5), date(2024, 3, 11)), today),
            Err(Error::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_check_max_range() {
        let start = date(2024, 1, 1);
        assert!(check_max_range(&DateRange::new(start, date(2024, 1, 31)), 31).is_ok());
        assert!(matches!(
            check_max_range(&DateRange::new(start, date(2024, 2, 1)), 31),
            Err(Error::DateRangeTooLong { max_days: 31 })
        ));
    }

    #[test]
    fn test_today_in_timezone_is_close_to_utc() {
        let paris = today_in(&chrono_tz::Europe::Paris);
        let utc = Utc::now().date_naive();
        assert!((paris - utc).num_days().abs() <= 1);
    }
}
