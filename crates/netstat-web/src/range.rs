//! Date range selection
//!
//! The selector owns the active interval. Edits happen on a detached
//! [`RangeEdit`] draft and only reach subscribers once committed, so typing
//! in the picker never triggers a refresh.

use chrono::NaiveDate;
use netstat_core::{
    DateRange, Result,
    utils::{format_display_date, parse_display_date},
};
use tokio::sync::broadcast;
use tracing::debug;

/// Pending notifications a slow subscriber may fall behind by
const CHANNEL_CAPACITY: usize = 16;

/// Separator between the two dates in the picker text
const RANGE_SEPARATOR: &str = " - ";

/// Owner of the dashboard's selected date range
#[derive(Debug)]
pub struct RangeSelector {
    range: DateRange,
    changes: broadcast::Sender<DateRange>,
}

impl RangeSelector {
    /// Start on the `window_days` days ending `today`
    #[must_use]
    pub fn new(today: NaiveDate, window_days: i64) -> Self {
        Self::with_range(DateRange::ending_at(today, window_days))
    }

    /// Start on an explicit range
    #[must_use]
    pub fn with_range(range: DateRange) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { range, changes }
    }

    /// Currently selected range
    #[must_use]
    pub const fn range(&self) -> DateRange {
        self.range
    }

    /// Receive one message per committed change
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DateRange> {
        self.changes.subscribe()
    }

    /// Open an uncommitted draft prefilled with the current range
    #[must_use]
    pub fn begin_edit(&self) -> RangeEdit {
        RangeEdit {
            start: format_display_date(self.range.start),
            end: format_display_date(self.range.end),
        }
    }

    /// Apply a draft and notify subscribers
    ///
    /// Reversed ranges are accepted as typed; the statistics service decides
    /// what to do with them.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the range untouched and notifying no one, if
    /// either date does not parse as `DD/MM/YYYY`.
    pub fn commit(&mut self, edit: &RangeEdit) -> Result<DateRange> {
        let range = edit.parse()?;
        self.set_range(range);
        Ok(range)
    }

    /// Replace the range programmatically and notify subscribers
    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
        // No subscriber is not an error
        let receivers = self.changes.send(range).unwrap_or(0);
        debug!(range = %range.cache_key(), receivers, "Date range committed");
    }

    /// Text shown in the picker, `DD/MM/YYYY - DD/MM/YYYY`
    #[must_use]
    pub fn display(&self) -> String {
        display_range(&self.range)
    }
}

/// Format a range the way the picker shows it
#[must_use]
pub fn display_range(range: &DateRange) -> String {
    format!(
        "{}{RANGE_SEPARATOR}{}",
        format_display_date(range.start),
        format_display_date(range.end)
    )
}

/// Picker draft, edited keystroke by keystroke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeEdit {
    start: String,
    end: String,
}

impl RangeEdit {
    /// Draft from raw picker fields
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Draft from the combined picker text, `DD/MM/YYYY - DD/MM/YYYY`
    #[must_use]
    pub fn from_display(text: &str) -> Self {
        match text.split_once(RANGE_SEPARATOR.trim()) {
            Some((start, end)) => Self::new(start.trim(), end.trim()),
            None => Self::new(text.trim(), ""),
        }
    }

    /// Replace the start field
    pub fn set_start(&mut self, text: impl Into<String>) {
        self.start = text.into();
    }

    /// Replace the end field
    pub fn set_end(&mut self, text: impl Into<String>) {
        self.end = text.into();
    }

    /// Type one character at the end of the start field
    pub fn type_start(&mut self, c: char) {
        self.start.push(c);
    }

    /// Type one character at the end of the end field
    pub fn type_end(&mut self, c: char) {
        self.end.push(c);
    }

    /// Parse both fields
    ///
    /// # Errors
    ///
    /// Returns an error if either field is not a `DD/MM/YYYY` date.
    pub fn parse(&self) -> Result<DateRange> {
        Ok(DateRange::new(
            parse_display_date(&self.start)?,
            parse_display_date(&self.end)?,
        ))
    }
}
