//! Error types for the fetch and actuator paths.
//!
//! Storage and config errors live beside their ports in `app::ports`. All
//! variants are `Copy` so they can travel through channels and events
//! without allocation.
//!
//! None of these errors is fatal: the control loop logs them and continues in
//! a degraded, fail-safe mode.

use core::fmt;

// ---------------------------------------------------------------------------
// Temperature fetch errors
// ---------------------------------------------------------------------------

/// Every way a temperature fetch can fail. All of them collapse to an
/// invalid sample, which the decision engine treats as frost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// No network route (Wi-Fi down, DNS failure, connection refused).
    NetworkUnavailable,
    /// The server answered with a non-success status code.
    HttpStatus(u16),
    /// The payload does not contain the expected textual marker.
    MarkerNotFound,
    /// The marker was found but no numeric token follows it.
    NoNumericToken,
    /// The fetch did not complete within the configured timeout.
    Timeout,
    /// The background fetch worker is not running or its queue is full.
    WorkerUnavailable,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkUnavailable => write!(f, "network unavailable"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::MarkerNotFound => write!(f, "marker not found in payload"),
            Self::NoNumericToken => write!(f, "no numeric token after marker"),
            Self::Timeout => write!(f, "timed out"),
            Self::WorkerUnavailable => write!(f, "fetch worker unavailable"),
        }
    }
}

impl core::error::Error for FetchError {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl core::error::Error for ActuatorError {}
