//! Solar scheduling: daily sunrise/sunset from site coordinates and date.
//!
//! Uses a single-harmonic declination approximation
//!
//! ```text
//! decl = 23.45° · sin(360°/365 · (N − 81))
//! H    = acos(clamp(−tan(lat) · tan(decl), −1, 1))
//! rise = 720 − 4 · (lon + H)      minutes UTC
//! set  = 720 − 4 · (lon − H)      minutes UTC
//! ```
//!
//! which is good to a few minutes at temperate latitudes. The clamp turns
//! polar conditions into permanent day (H = 180°) or permanent night
//! (H = 0°) instead of NaN.

pub mod calendar;
pub mod dst;

use serde::Serialize;

use calendar::{CalendarDate, MINUTES_PER_DAY};

const AXIAL_TILT_DEG: f64 = 23.45;
const SOLAR_NOON_MIN: f64 = 720.0;
/// Minutes of clock time per degree of Earth rotation.
const MIN_PER_DEG: f64 = 4.0;

/// Whether the sun crosses the horizon on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayKind {
    Regular,
    /// Sun never sets.
    PolarDay,
    /// Sun never rises.
    PolarNight,
}

/// Daylight interval `[sunrise, sunset)` in UTC minutes of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DaylightWindow {
    /// 0–1439
    pub sunrise_min: u16,
    /// 0–1439
    pub sunset_min: u16,
    pub kind: DayKind,
}

impl DaylightWindow {
    /// Sunrise inclusive, sunset exclusive.
    ///
    /// A window that wraps past UTC midnight (far east/west sites) counts
    /// the minutes on both sides of midnight.
    pub fn is_daytime(&self, minute_utc: u16) -> bool {
        match self.kind {
            DayKind::PolarDay => true,
            DayKind::PolarNight => false,
            DayKind::Regular if self.sunrise_min <= self.sunset_min => {
                (self.sunrise_min..self.sunset_min).contains(&minute_utc)
            }
            DayKind::Regular => minute_utc >= self.sunrise_min || minute_utc < self.sunset_min,
        }
    }

    /// Length of daylight in minutes.
    pub fn day_length_min(&self) -> u16 {
        match self.kind {
            DayKind::PolarDay => MINUTES_PER_DAY,
            DayKind::PolarNight => 0,
            DayKind::Regular => {
                (self.sunset_min + MINUTES_PER_DAY - self.sunrise_min) % MINUTES_PER_DAY
            }
        }
    }
}

/// Solar declination in degrees for a 1-based day of year.
pub fn declination_deg(day_of_year: u16) -> f64 {
    let angle = (360.0 / 365.0) * (f64::from(day_of_year) - 81.0);
    AXIAL_TILT_DEG * angle.to_radians().sin()
}

/// Sunrise and sunset for `date` at the given site. Pure.
pub fn daylight_window(date: &CalendarDate, latitude: f64, longitude: f64) -> DaylightWindow {
    let decl = declination_deg(date.day_of_year()).to_radians();
    let cos_h = (-latitude.to_radians().tan() * decl.tan()).clamp(-1.0, 1.0);
    let hour_angle = cos_h.acos().to_degrees();

    let kind = if cos_h <= -1.0 {
        DayKind::PolarDay
    } else if cos_h >= 1.0 {
        DayKind::PolarNight
    } else {
        DayKind::Regular
    };

    DaylightWindow {
        sunrise_min: wrap_minutes(SOLAR_NOON_MIN - MIN_PER_DEG * (longitude + hour_angle)),
        sunset_min: wrap_minutes(SOLAR_NOON_MIN - MIN_PER_DEG * (longitude - hour_angle)),
        kind,
    }
}

/// Sun elevation above the horizon in degrees at `minute_utc` on `date`.
pub fn sun_elevation_deg(date: &CalendarDate, minute_utc: u16, latitude: f64, longitude: f64) -> f64 {
    let decl = declination_deg(date.day_of_year()).to_radians();
    let lat = latitude.to_radians();
    let hour_angle =
        ((f64::from(minute_utc) + MIN_PER_DEG * longitude - SOLAR_NOON_MIN) / MIN_PER_DEG).to_radians();
    let sin_elev = lat.sin() * decl.sin() + lat.cos() * decl.cos() * hour_angle.cos();
    sin_elev.clamp(-1.0, 1.0).asin().to_degrees()
}

fn wrap_minutes(minutes: f64) -> u16 {
    let wrapped = minutes.rem_euclid(f64::from(MINUTES_PER_DAY)) as u16;
    // rem_euclid can round up to exactly 1440.0 for tiny negatives
    wrapped % MINUTES_PER_DAY
}
