//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, redraw the display,
//! refresh the web status page.

use serde::Serialize;

use crate::mode::{CHANNEL_COUNT, ChannelId, ModeChange, PumpMode};
use crate::safety::TemperatureSample;
use crate::solar::DaylightWindow;
use crate::solar::calendar::CalendarDate;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started with these restored modes.
    Started([PumpMode; CHANNEL_COUNT]),

    /// Sunrise/sunset recomputed for a new UTC date.
    DaylightUpdated {
        date: CalendarDate,
        window: DaylightWindow,
    },

    /// A fetch finished (successfully or not).
    TemperatureUpdated(TemperatureSample),

    /// Frost lockout entered (`true`) or left (`false`).
    LockoutChanged(bool),

    /// A cycle event was accepted.
    ModeChanged(ModeChange),

    /// A cycle event arrived inside the debounce window.
    CycleIgnored(ChannelId),

    /// A relay was switched.
    ActuatorChanged { channel: ChannelId, on: bool },

    /// Presentation snapshot after an evaluation.
    Status(StatusSnapshot),
}

/// Per-channel part of a [`StatusSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelStatus {
    pub channel: ChannelId,
    pub mode: &'static str,
    pub mode_byte: u8,
    pub on: bool,
}

/// Everything the display and the web page need, in one value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub date: Option<CalendarDate>,
    pub minute_utc: Option<u16>,
    pub window: Option<DaylightWindow>,
    pub is_daytime: bool,
    pub sun_elevation_deg: Option<f64>,
    /// DST-adjusted wall clock, display only.
    pub local_time: Option<heapless::String<5>>,
    pub dst: bool,
    /// The sample as the decision engine saw it (age check applied).
    pub temperature: TemperatureSample,
    pub frost_lockout: bool,
    pub channels: [ChannelStatus; CHANNEL_COUNT],
}

impl StatusSnapshot {
    /// Serialise for the web status endpoint. NaN temperatures become `null`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
