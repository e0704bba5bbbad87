//! Timestamp layouts for rotated file names
//!
//! A layout is a chrono strftime pattern appended to the base path. It is used
//! both to name new files and to recognise existing ones during retention, so
//! whatever it formats has to parse back. Fields the layout leaves out (the
//! day of a monthly layout, the date of a time-only one) are simply absent.
//! Retention orders files by name, which is only an age ordering when the
//! layout is zero-padded and most-significant-field first (like
//! [`crate::FINE_LAYOUT`]).

use chrono::format::{self, Item, ParseErrorKind, Parsed, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write;

use crate::error::{Error, Result};

/// A validated strftime layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pattern: String,
}

impl Layout {
    /// Validate a layout pattern
    pub fn new<S: Into<String>>(pattern: S) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(Error::layout("layout must not be empty"));
        }

        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(Error::layout(format!(
                "'{}' contains an invalid format specifier",
                pattern
            )));
        }

        if !StrftimeItems::new(&pattern)
            .any(|item| matches!(item, Item::Numeric(..) | Item::Fixed(..)))
        {
            return Err(Error::layout(format!(
                "'{}' has no time fields, every file would get the same name",
                pattern
            )));
        }

        let layout = Self { pattern };

        // Reference instant with every field distinct
        let sample = NaiveDate::from_ymd_opt(2006, 1, 2)
            .and_then(|d| d.and_hms_opt(15, 4, 5))
            .ok_or_else(|| Error::layout("invalid reference instant"))?;
        let stamp = layout.format(sample)?;
        if !layout.matches(&stamp) {
            return Err(Error::layout(format!(
                "'{}' does not parse back (formatted '{}')",
                layout.pattern, stamp
            )));
        }

        Ok(layout)
    }

    /// Format an instant with this layout
    pub fn format(&self, at: NaiveDateTime) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", at.format_with_items(StrftimeItems::new(&self.pattern))).map_err(
            |_| {
                Error::layout(format!(
                    "'{}' cannot be formatted without a time zone",
                    self.pattern
                ))
            },
        )?;
        Ok(out)
    }

    /// True if the whole of `stamp` was produced by this layout.
    ///
    /// Every field present must be in range; when year, month and day are
    /// all present they must also name a real date.
    pub fn matches(&self, stamp: &str) -> bool {
        let mut parsed = Parsed::new();
        if format::parse(&mut parsed, stamp, StrftimeItems::new(&self.pattern)).is_err() {
            return false;
        }

        match parsed.to_naive_date() {
            Ok(_) => true,
            Err(e) => e.kind() == ParseErrorKind::NotEnough,
        }
    }

    /// The raw strftime pattern
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pattern)
    }
}
