//! Pump relay driver.
//!
//! One GPIO per pump, switching a relay module. Many cheap modules are
//! active-low (input pulled low energises the coil), so polarity is a
//! constructor flag rather than baked into the pin level.
//!
//! ## Dual-target design
//!
//! Generic over [`embedded_hal::digital::OutputPin`]: on ESP-IDF this is an
//! `esp_idf_hal` `PinDriver`, on host/test a mock pin.

use embedded_hal::digital::OutputPin;

use crate::error::ActuatorError;

pub struct RelayDriver<P> {
    pin: P,
    active_low: bool,
    energised: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take the pin and drive it to the released level immediately.
    pub fn new(pin: P, active_low: bool) -> Result<Self, ActuatorError> {
        let mut relay = Self {
            pin,
            active_low,
            energised: true,
        };
        relay.set(false)?;
        Ok(relay)
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let high = on != self.active_low;
        let res = if high { self.pin.set_high() } else { self.pin.set_low() };
        res.map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.energised = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.energised
    }
}
