//! System clock adapter.
//!
//! Implements [`ClockPort`] for the pond controller.
//!
//! - **`target_os = "espidf"`**: wall clock from `gettimeofday()` (set by
//!   SNTP), uptime from `esp_timer_get_time()` (microsecond precision,
//!   monotonic).
//! - **`not(target_os = "espidf")`**: `std::time::SystemTime` and
//!   `std::time::Instant` for host-side testing and simulation.
//!
//! Until SNTP has synced, the RTC counts up from 1970. Any reading before
//! 2020-01-01 is reported as unsynced.

use crate::app::ports::ClockPort;

/// 2020-01-01T00:00:00Z
pub const EPOCH_2020: u64 = 1_577_836_800;

/// Clock adapter for the ESP32 platform.
pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    #[cfg(target_os = "espidf")]
    fn raw_epoch_secs(&self) -> Option<u64> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        u64::try_from(tv.tv_sec).ok()
    }

    #[cfg(not(target_os = "espidf"))]
    fn raw_epoch_secs(&self) -> Option<u64> {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs())
    }
}

impl ClockPort for SystemClock {
    fn epoch_secs(&self) -> Option<u64> {
        self.raw_epoch_secs().filter(|&s| s >= EPOCH_2020)
    }

    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
