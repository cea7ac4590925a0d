//! UK daylight-saving rule and local display time.
//!
//! One fixed regional policy, not general timezone logic: summer time runs
//! from the last Sunday of March up to (but excluding) the last Sunday of
//! October, evaluated on whole UTC dates.
//!
//! The decision engine works purely in UTC minutes, so nothing in this
//! module can change an actuator state. It feeds the display only.

use core::fmt::Write;

use serde::Serialize;

use super::calendar::{days_in_month, weekday, CalendarDate, SECS_PER_DAY};

/// Highest day-of-month in `month` that falls on a Sunday.
///
/// Scans day 31 down to 25, skipping days the month does not have.
pub fn last_sunday(year: i32, month: u8) -> u8 {
    let last = days_in_month(year, month);
    (25..=31)
        .rev()
        .filter(|&d| d <= last)
        .find(|&d| weekday(year, month, d) == Some(0))
        .unwrap_or(last)
}

/// True when the local clock runs one hour ahead of UTC.
pub fn is_dst(date: &CalendarDate) -> bool {
    match date.month() {
        m if m < 3 || m > 10 => false,
        3 => date.day() >= last_sunday(date.year(), 3),
        10 => date.day() < last_sunday(date.year(), 10),
        _ => true,
    }
}

/// Wall-clock time for display, DST-adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
    pub dst: bool,
}

impl LocalTime {
    pub fn from_epoch_secs(epoch_secs: u64) -> Self {
        let dst = is_dst(&CalendarDate::from_epoch_secs(epoch_secs));
        let local = epoch_secs + if dst { 3600 } else { 0 };
        let secs_of_day = local % SECS_PER_DAY;
        Self {
            hour: (secs_of_day / 3600) as u8,
            minute: ((secs_of_day % 3600) / 60) as u8,
            dst,
        }
    }

    /// "HH:MM"
    pub fn hhmm(&self) -> heapless::String<5> {
        let mut s = heapless::String::new();
        let _ = write!(s, "{:02}:{:02}", self.hour, self.minute);
        s
    }
}
