//! Hardware adapter: bridges the pump relays to the domain port.
//!
//! Owns both [`RelayDriver`]s and exposes them through [`ActuatorPort`].
//! This is the only module in the system that switches actual hardware.

use log::error;

use embedded_hal::digital::OutputPin;

use crate::app::ports::ActuatorPort;
use crate::drivers::relay::RelayDriver;
use crate::error::ActuatorError;
use crate::mode::{CHANNEL_COUNT, ChannelId};

/// Concrete adapter over the two pump relays, indexed by channel.
pub struct HardwareAdapter<P> {
    relays: [RelayDriver<P>; CHANNEL_COUNT],
}

impl<P: OutputPin> HardwareAdapter<P> {
    pub fn new(relays: [RelayDriver<P>; CHANNEL_COUNT]) -> Self {
        Self { relays }
    }

    pub fn is_on(&self, channel: ChannelId) -> bool {
        self.relays[channel.index()].is_on()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: OutputPin> ActuatorPort for HardwareAdapter<P> {
    fn set_actuator(&mut self, channel: ChannelId, on: bool) -> Result<(), ActuatorError> {
        self.relays[channel.index()].set(on)
    }

    fn all_off(&mut self) {
        for (i, relay) in self.relays.iter_mut().enumerate() {
            if let Err(e) = relay.set(false) {
                error!("pump{}: release failed: {}", i, e);
            }
        }
    }
}
