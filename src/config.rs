//! System configuration parameters
//!
//! All tunable parameters for the pond controller. Values can be
//! overridden via NVS (see [`crate::adapters::nvs`]); the defaults suit a
//! garden pond in the English Midlands.

use serde::{Deserialize, Serialize};

/// Capacity of the temperature source URL.
pub const URL_CAPACITY: usize = 128;
/// Capacity of the textual marker that precedes the temperature token.
pub const MARKER_CAPACITY: usize = 32;

/// How cycle events from the two channels share the debounce clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebouncePolicy {
    /// One clock for both channels: a press on channel 1 swallows a press
    /// on channel 0 that follows within the debounce window.
    Shared,
    /// Each channel debounces independently.
    PerChannel,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Site ---
    /// Latitude in degrees, north positive
    pub latitude: f64,
    /// Longitude in degrees, east positive
    pub longitude: f64,

    // --- Decision ---
    /// Below this air temperature (Celsius) both pumps are locked out
    pub frost_threshold_c: f32,
    /// Minutes after sunset that AUTO_EXTEND keeps a pump running
    pub extend_window_min: u16,

    // --- Temperature source ---
    /// Interval between temperature refreshes (milliseconds)
    pub temperature_refresh_interval_ms: u64,
    /// Upper bound on a single fetch (milliseconds)
    pub fetch_timeout_ms: u64,
    /// A sample older than this is treated as invalid (milliseconds)
    pub temperature_max_age_ms: u64,
    /// URL the temperature payload is fetched from
    pub temperature_url: heapless::String<URL_CAPACITY>,
    /// Text that immediately precedes the temperature token in the payload
    pub temperature_marker: heapless::String<MARKER_CAPACITY>,

    // --- Input ---
    /// Minimum spacing between accepted cycle events (milliseconds)
    pub touch_debounce_ms: u64,
    pub debounce_policy: DebouncePolicy,

    // --- Output ---
    /// Relay inputs are driven low to energise
    pub relay_active_low: bool,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub tick_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Site
            latitude: 51.89,
            longitude: -2.07,

            // Decision
            frost_threshold_c: 3.0,
            extend_window_min: 60,

            // Temperature source
            temperature_refresh_interval_ms: 600_000, // 10 min
            fetch_timeout_ms: 15_000,
            temperature_max_age_ms: 1_800_000, // 3 missed refreshes
            temperature_url: bounded("http://weather.local/current"),
            temperature_marker: bounded("\"temp\":"),

            // Input
            touch_debounce_ms: 300,
            debounce_policy: DebouncePolicy::Shared,

            // Output
            relay_active_low: false,

            // Timing
            tick_interval_ms: 1000, // 1 Hz
        }
    }
}

/// Copy `s` into a fixed-capacity string, truncating on a char boundary.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
