//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A display or web status adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(modes) => {
                info!("START | pump0={} pump1={}", modes[0], modes[1]);
            }
            AppEvent::DaylightUpdated { date, window } => {
                info!(
                    "SOLAR | {} | rise={} set={} UTC min | len={} min | {:?}",
                    date,
                    window.sunrise_min,
                    window.sunset_min,
                    window.day_length_min(),
                    window.kind,
                );
            }
            AppEvent::TemperatureUpdated(s) => {
                info!(
                    "TEMP  | {:.1}\u{00b0}C | {}",
                    s.value_c,
                    if s.valid { "valid" } else { "INVALID" }
                );
            }
            AppEvent::LockoutChanged(true) => warn!("FROST | lockout entered"),
            AppEvent::LockoutChanged(false) => info!("FROST | lockout cleared"),
            AppEvent::ModeChanged(c) => {
                info!(
                    "MODE  | {} {} -> {}{}",
                    c.channel,
                    c.from,
                    c.to,
                    if c.persisted { "" } else { " (NOT persisted)" }
                );
            }
            AppEvent::CycleIgnored(ch) => {
                info!("MODE  | {} cycle ignored (debounce)", ch);
            }
            AppEvent::ActuatorChanged { channel, on } => {
                info!("RELAY | {} {}", channel, if *on { "ON" } else { "OFF" });
            }
            AppEvent::Status(s) => match s.to_json() {
                Ok(json) => info!("STATUS| {}", json),
                Err(e) => warn!("STATUS| serialise failed: {}", e),
            },
        }
    }
}
