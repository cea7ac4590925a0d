//! Pump operating modes and the per-channel mode state machine.
//!
//! ```text
//!   ┌────┐    ┌─────┐    ┌──────┐    ┌─────────────┐
//!   │ ON │───▶│ OFF │───▶│ AUTO │───▶│ AUTO_EXTEND │──┐
//!   └────┘    └─────┘    └──────┘    └─────────────┘  │
//!     ▲                                               │
//!     └───────────────────────────────────────────────┘
//! ```
//!
//! The only trigger is a "cycle channel i" event. Every transition is
//! written to [`PumpModeStore`] before [`ModeStateMachine::cycle`] returns,
//! since the controller can lose power at any moment.

pub mod store;

use core::fmt;

use log::{error, info};
use serde::Serialize;

use crate::app::ports::StoragePort;
pub use store::PumpModeStore;

/// Number of pump outputs.
pub const CHANNEL_COUNT: usize = 2;

// ---------------------------------------------------------------------------
// PumpMode
// ---------------------------------------------------------------------------

/// User-selected operating mode. Discriminants are the persisted bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum PumpMode {
    On = 1,
    Off = 2,
    Auto = 3,
    AutoExtend = 4,
}

/// A persisted byte that is not a [`PumpMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMode(pub u8);

impl fmt::Display for InvalidMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pump mode byte {}", self.0)
    }
}

impl PumpMode {
    pub const ALL: [PumpMode; 4] = [Self::On, Self::Off, Self::Auto, Self::AutoExtend];

    /// Next mode in the fixed cycle order.
    pub const fn next(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::Auto,
            Self::Auto => Self::AutoExtend,
            Self::AutoExtend => Self::On,
        }
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Decode a persisted byte; anything out of range falls back to AUTO.
    pub fn from_persisted(byte: u8) -> Self {
        Self::try_from(byte).unwrap_or(Self::Auto)
    }

    /// Label shown on the display and the status page.
    pub const fn name(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Auto => "AUTO",
            Self::AutoExtend => "AUTO+",
        }
    }
}

impl TryFrom<u8> for PumpMode {
    type Error = InvalidMode;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            1 => Ok(Self::On),
            2 => Ok(Self::Off),
            3 => Ok(Self::Auto),
            4 => Ok(Self::AutoExtend),
            other => Err(InvalidMode(other)),
        }
    }
}

impl fmt::Display for PumpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Index of one of the two pump outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChannelId(u8);

impl ChannelId {
    pub const ALL: [ChannelId; CHANNEL_COUNT] = [ChannelId(0), ChannelId(1)];

    pub fn new(index: usize) -> Option<Self> {
        (index < CHANNEL_COUNT).then(|| Self(index as u8))
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pump{}", self.0)
    }
}

/// One pump output: its persisted mode and its derived relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PumpChannel {
    pub id: ChannelId,
    pub mode: PumpMode,
    /// Last decided actuator state. Recomputed, never persisted.
    pub on: bool,
}

/// Record of one accepted cycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub channel: ChannelId,
    pub from: PumpMode,
    pub to: PumpMode,
    /// False when every write attempt failed; the new mode holds in RAM only.
    pub persisted: bool,
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Owns the mode transition rule and its persistence side effect.
/// The channel array itself lives in the caller.
pub struct ModeStateMachine {
    store: PumpModeStore,
}

impl ModeStateMachine {
    pub fn new(store: PumpModeStore) -> Self {
        Self { store }
    }

    /// Restore both channels from storage. Invalid or missing bytes reset
    /// that channel alone to AUTO. Actuators start released.
    pub fn boot(&self, storage: &impl StoragePort) -> [PumpChannel; CHANNEL_COUNT] {
        ChannelId::ALL.map(|id| {
            let mode = self.store.load(id, storage);
            info!("Mode: {} restored as {}", id, mode);
            PumpChannel { id, mode, on: false }
        })
    }

    /// Advance `channel` one step and persist the result.
    pub fn cycle(&self, channel: &mut PumpChannel, storage: &mut impl StoragePort) -> ModeChange {
        let from = channel.mode;
        let to = from.next();

        let persisted = match self.store.save(channel.id, to, storage) {
            Ok(()) => true,
            Err(e) => {
                error!("Mode: {} -> {} not persisted ({}); holding in RAM", channel.id, to, e);
                false
            }
        };
        channel.mode = to;
        info!("Mode: {} {} -> {}", channel.id, from, to);

        ModeChange {
            channel: channel.id,
            from,
            to,
            persisted,
        }
    }
}
