//! GPIO assignments for the ESP32-2432S028 ("CYD") board.
//!
//! Single source of truth: `main.rs` builds every pin driver from these
//! numbers. Only pins broken out on the CN1 and P3 headers or already wired
//! to a button are used; GPIO 6-11 belong to the SPI flash and GPIO 4/16/17
//! drive the onboard RGB LED.

// ---------------------------------------------------------------------------
// Pump relays (digital outputs, polarity set by `relay_active_low`)
// ---------------------------------------------------------------------------

/// Relay for pump channel 0 (CN1 header).
pub const PUMP0_RELAY_GPIO: i32 = 22;
/// Relay for pump channel 1 (CN1 header).
pub const PUMP1_RELAY_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Cycle buttons (active-low, external pull-ups)
// ---------------------------------------------------------------------------

/// Onboard BOOT button; already pulled up on the board.
/// Holding it through a reset enters the ROM download mode.
pub const PUMP0_BUTTON_GPIO: i32 = 0;
/// P3 header. Input-only pin without internal pulls, so the button needs an
/// external pull-up to 3V3.
pub const PUMP1_BUTTON_GPIO: i32 = 35;

/// Relay pins indexed by channel.
pub const RELAY_GPIOS: [i32; 2] = [PUMP0_RELAY_GPIO, PUMP1_RELAY_GPIO];
/// Button pins indexed by channel.
pub const BUTTON_GPIOS: [i32; 2] = [PUMP0_BUTTON_GPIO, PUMP1_BUTTON_GPIO];

/// GPIO 34-39 on the classic ESP32 have no output stage and no pulls.
pub fn is_input_only(gpio: i32) -> bool {
    (34..=39).contains(&gpio)
}
