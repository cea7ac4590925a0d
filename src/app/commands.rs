//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (touch panel,
//! web handler, serial console) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.
//! Producers on other threads hand them over through
//! [`CommandQueue`](crate::events::CommandQueue).

use crate::mode::ChannelId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Advance one channel to its next mode. Debounced.
    CycleChannel(ChannelId),

    /// Fetch the temperature on the next tick instead of waiting for the
    /// refresh interval.
    RefreshTemperature,
}
