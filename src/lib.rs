//! Pond pump controller library.
//!
//! Exposes the pure-logic modules for integration testing and the device
//! binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod events;
pub mod mode;
pub mod pins;
pub mod safety;
pub mod scheduler;
pub mod solar;

pub mod error;

pub mod adapters;
pub mod drivers;
pub mod sensors;
