//! Pump decision engine.
//!
//! Pure function of mode, daylight, clock and temperature:
//!
//! | Frost lockout | Mode        | Result                                   |
//! |---------------|-------------|------------------------------------------|
//! | yes           | any         | off                                      |
//! | no            | ON          | on                                       |
//! | no            | OFF         | off                                      |
//! | no            | AUTO        | daytime                                  |
//! | no            | AUTO_EXTEND | daytime or now < sunset + extend window  |
//!
//! The lockout is checked first: a sample that is invalid, unknown (NaN)
//! or below the frost threshold forces every channel off regardless of
//! mode. All minute arithmetic is UTC; daylight saving never enters here.
//!
//! Before the wall clock is synced there is no daytime or sunset to compare
//! against. [`PumpDecisionEngine::decide_unscheduled`] covers that case: ON
//! and OFF still hold, the AUTO modes stay off.

use crate::config::SystemConfig;
use crate::mode::PumpMode;
use crate::safety::{self, TemperatureSample};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PumpDecisionEngine {
    frost_threshold_c: f32,
    extend_window_min: u16,
}

impl PumpDecisionEngine {
    pub fn new(frost_threshold_c: f32, extend_window_min: u16) -> Self {
        Self {
            frost_threshold_c,
            extend_window_min,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.frost_threshold_c, config.extend_window_min)
    }

    /// True when the sample forbids running any pump.
    pub fn frost_lockout(&self, sample: &TemperatureSample) -> bool {
        safety::frost_lockout(sample, self.frost_threshold_c)
    }

    /// On/off verdict for one channel.
    pub fn decide(
        &self,
        mode: PumpMode,
        is_daytime: bool,
        now_min_utc: u16,
        sunset_min_utc: u16,
        sample: &TemperatureSample,
    ) -> bool {
        if self.frost_lockout(sample) {
            return false;
        }
        match mode {
            PumpMode::On => true,
            PumpMode::Off => false,
            PumpMode::Auto => is_daytime,
            PumpMode::AutoExtend => {
                is_daytime
                    || u32::from(now_min_utc)
                        < u32::from(sunset_min_utc) + u32::from(self.extend_window_min)
            }
        }
    }

    /// On/off verdict when no daylight window is known yet.
    pub fn decide_unscheduled(&self, mode: PumpMode, sample: &TemperatureSample) -> bool {
        !self.frost_lockout(sample) && mode == PumpMode::On
    }
}

impl Default for PumpDecisionEngine {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}
