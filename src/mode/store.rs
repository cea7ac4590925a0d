//! Durable storage of the per-channel mode byte.
//!
//! Key layout: `<namespace>::mode<channel>` → one byte, the [`PumpMode`]
//! discriminant. Decoding happens here, at the persistence boundary, so
//! the rest of the crate only ever sees a typed mode.

use core::fmt::Write;

use log::warn;

use super::{ChannelId, PumpMode};
use crate::app::ports::{StorageError, StoragePort};

pub const MODE_NAMESPACE: &str = "pumps";
/// Write attempts per mode change before giving up.
pub const MAX_PERSIST_ATTEMPTS: u8 = 3;

pub struct PumpModeStore {
    namespace: &'static str,
}

impl Default for PumpModeStore {
    fn default() -> Self {
        Self::new(MODE_NAMESPACE)
    }
}

impl PumpModeStore {
    pub fn new(namespace: &'static str) -> Self {
        Self { namespace }
    }

    /// `"mode0"`, `"mode1"`
    pub fn key(channel: ChannelId) -> heapless::String<8> {
        let mut key = heapless::String::new();
        let _ = write!(key, "mode{}", channel.index());
        key
    }

    /// Read the channel's mode. Missing, unreadable or out-of-range → AUTO.
    pub fn load(&self, channel: ChannelId, storage: &impl StoragePort) -> PumpMode {
        let key = Self::key(channel);
        let mut buf = [0u8; 1];
        match storage.read(self.namespace, &key, &mut buf) {
            Ok(1) => match PumpMode::try_from(buf[0]) {
                Ok(mode) => mode,
                Err(e) => {
                    warn!("ModeStore: {} has {}, defaulting to AUTO", key, e);
                    PumpMode::Auto
                }
            },
            Ok(len) => {
                warn!("ModeStore: {} has {} bytes, defaulting to AUTO", key, len);
                PumpMode::Auto
            }
            Err(StorageError::NotFound) => PumpMode::Auto,
            Err(e) => {
                warn!("ModeStore: reading {} failed ({}), defaulting to AUTO", key, e);
                PumpMode::Auto
            }
        }
    }

    /// Write the channel's mode, retrying transient failures.
    pub fn save(
        &self,
        channel: ChannelId,
        mode: PumpMode,
        storage: &mut impl StoragePort,
    ) -> Result<(), StorageError> {
        let key = Self::key(channel);
        let mut last_err = StorageError::IoError;
        for attempt in 1..=MAX_PERSIST_ATTEMPTS {
            match storage.write(self.namespace, &key, &[mode.as_byte()]) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        "ModeStore: write {} attempt {}/{} failed: {}",
                        key, attempt, MAX_PERSIST_ATTEMPTS, e
                    );
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}
