//! Time and date replies

use chrono::NaiveDateTime;

/// Spoken description of the given local time
#[must_use]
pub fn describe(now: NaiveDateTime) -> String {
    format!(
        "The current time is {} and the date is {}",
        now.format("%I:%M %p"),
        now.format("%A, %B %d, %Y")
    )
}
