//! Directory name formatters for common index value types.

use std::fmt::Display;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// Any `Display` value, as displayed
pub fn display<T: Display>(value: &T) -> String {
    value.to_string()
}

/// `2021-01-31`
pub fn iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `2021-01`
pub fn iso_month(date: &NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Hour of day without padding, `0` to `23`
pub fn hour(time: &NaiveDateTime) -> String {
    time.hour().to_string()
}
