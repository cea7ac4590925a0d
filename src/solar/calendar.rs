//! Proleptic Gregorian calendar arithmetic on UTC epoch seconds.

use core::fmt;

use serde::Serialize;

pub const SECS_PER_DAY: u64 = 86_400;
pub const MINUTES_PER_DAY: u16 = 1440;

/// Cumulative days before the first of each month in a common year.
const DAYS_BEFORE_MONTH: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// A UTC calendar date. Always a real date: the only constructors are
/// [`CalendarDate::new`] and [`CalendarDate::from_epoch_secs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CalendarDate {
    year: i32,
    month: u8,
    day: u8,
}

impl CalendarDate {
    /// Build a date, rejecting impossible month/day combinations.
    pub fn new(year: i32, month: u8, day: u8) -> Option<Self> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// Decompose epoch seconds into a UTC date (days-from-civil inverse).
    pub fn from_epoch_secs(epoch_secs: u64) -> Self {
        let days = (epoch_secs / SECS_PER_DAY) as i64;
        let z = days + 719_468;
        let era = z.div_euclid(146_097);
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
        let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
        let year = (yoe + era * 400) as i32 + i32::from(month <= 2);
        Self { year, month, day }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1–12
    pub fn month(&self) -> u8 {
        self.month
    }

    /// 1–31
    pub fn day(&self) -> u8 {
        self.day
    }

    /// 1-based ordinal day within the year, leap-aware.
    pub fn day_of_year(&self) -> u16 {
        let mut n = DAYS_BEFORE_MONTH[usize::from(self.month - 1)] + u16::from(self.day);
        if self.month > 2 && is_leap_year(self.year) {
            n += 1;
        }
        n
    }

    /// Day of week (Sakamoto), 0 = Sunday.
    pub fn weekday(&self) -> u8 {
        const T: [i32; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
        let y = if self.month < 3 { self.year - 1 } else { self.year };
        let w = y + y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400)
            + T[usize::from(self.month - 1)]
            + i32::from(self.day);
        w.rem_euclid(7) as u8
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Divisible by 4, not by 100 unless by 400.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Weekday of a civil date, 0 = Sunday; `None` if the date does not exist.
pub fn weekday(year: i32, month: u8, day: u8) -> Option<u8> {
    CalendarDate::new(year, month, day).map(|d| d.weekday())
}

/// Minute of the UTC day, 0–1439.
pub fn minute_of_day(epoch_secs: u64) -> u16 {
    ((epoch_secs % SECS_PER_DAY) / 60) as u16
}
