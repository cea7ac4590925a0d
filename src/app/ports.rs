//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (relays, clock, temperature source, event sinks, storage)
//! implement these traits. The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware,
//! the network or flash directly.

use crate::config::SystemConfig;
use crate::error::{ActuatorError, FetchError};
use crate::mode::ChannelId;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the two binary pump outputs.
pub trait ActuatorPort {
    /// Energise or release one pump relay.
    fn set_actuator(&mut self, channel: ChannelId, on: bool) -> Result<(), ActuatorError>;

    /// Release both relays (safe shutdown).
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: time source → domain)
// ───────────────────────────────────────────────────────────────

/// Wall clock plus a monotonic millisecond counter.
pub trait ClockPort {
    /// UTC epoch seconds, or `None` while the wall clock is unsynced.
    fn epoch_secs(&self) -> Option<u64>;

    /// Milliseconds since boot; never decreases.
    fn uptime_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Temperature source and feed
// ───────────────────────────────────────────────────────────────

/// Fetch-and-parse of the ambient temperature.
///
/// Implementations may await network I/O; callers bound them with a
/// timeout (see [`crate::sensors::fetch_task`]).
#[allow(async_fn_in_trait)]
pub trait TemperatureSource {
    async fn fetch_celsius(&mut self) -> Result<f32, FetchError>;
}

/// Result of one fetch request, tagged with the request sequence number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchOutcome {
    pub seq: u32,
    pub result: Result<f32, FetchError>,
}

/// Non-blocking request/response bridge to a temperature source.
///
/// The control loop never waits on a feed: it files a request and picks
/// the outcome up on a later tick.
pub trait TemperatureFeed {
    /// Queue a fetch. Fails if the worker cannot accept it.
    fn request(&mut self, seq: u32) -> Result<(), FetchError>;

    /// Collect a finished fetch, if any.
    fn poll_outcome(&mut self) -> Option<FetchOutcome>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / presentation)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, display,
/// web status page).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped. A frost threshold of -50 °C would disable the
/// lockout entirely.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    ///
    /// [`ConfigError::NotFound`] on first boot; [`ConfigError::Corrupted`]
    /// when the stored blob does not decode or no longer validates. The
    /// caller picks the fallback.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Write operations MUST be atomic: no partial writes on power loss.
/// The ESP-IDF NVS API guarantees this natively; in-memory simulation
/// achieves it trivially.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl core::error::Error for StorageError {}
