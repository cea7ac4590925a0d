//! Mock adapters for integration tests.
//!
//! Records every actuator call and event so tests can assert on the full
//! history without touching real GPIO, the network or flash.

use std::cell::Cell;
use std::collections::HashMap;

use pondctl::app::events::AppEvent;
use pondctl::app::ports::{
    ActuatorPort, ClockPort, EventSink, FetchOutcome, StorageError, StoragePort, TemperatureFeed,
};
use pondctl::error::{ActuatorError, FetchError};
use pondctl::mode::{CHANNEL_COUNT, ChannelId};

/// 2024-06-20 12:00:00 UTC.
pub const NOON: u64 = 1_718_884_800;
/// 2024-06-20 23:00:00 UTC.
pub const LATE_EVENING: u64 = NOON + 11 * 3600;

pub fn ch(index: usize) -> ChannelId {
    ChannelId::ALL[index]
}

// ── MockClock ─────────────────────────────────────────────────

pub struct MockClock {
    epoch: Cell<Option<u64>>,
    uptime: Cell<u64>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(epoch: u64) -> Self {
        Self {
            epoch: Cell::new(Some(epoch)),
            uptime: Cell::new(0),
        }
    }

    pub fn unsynced() -> Self {
        Self {
            epoch: Cell::new(None),
            uptime: Cell::new(0),
        }
    }

    pub fn set_epoch(&self, epoch: Option<u64>) {
        self.epoch.set(epoch);
    }

    /// Move both clocks forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.uptime.set(self.uptime.get() + ms);
        if let Some(e) = self.epoch.get() {
            self.epoch.set(Some(e + ms / 1000));
        }
    }
}

impl ClockPort for MockClock {
    fn epoch_secs(&self) -> Option<u64> {
        self.epoch.get()
    }

    fn uptime_ms(&self) -> u64 {
        self.uptime.get()
    }
}

// ── MockActuators ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    Set { channel: ChannelId, on: bool },
    AllOff,
}

pub struct MockActuators {
    pub calls: Vec<ActuatorCall>,
    pub state: [bool; CHANNEL_COUNT],
    /// When set, every `set_actuator` fails.
    pub fail: bool,
}

#[allow(dead_code)]
impl MockActuators {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            state: [false; CHANNEL_COUNT],
            fail: false,
        }
    }

    pub fn is_on(&self, channel: ChannelId) -> bool {
        self.state[channel.index()]
    }

    pub fn set_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::Set { .. }))
            .count()
    }
}

impl Default for MockActuators {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockActuators {
    fn set_actuator(&mut self, channel: ChannelId, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Set { channel, on });
        if self.fail {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.state[channel.index()] = on;
        Ok(())
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
        self.state = [false; CHANNEL_COUNT];
    }
}

// ── ScriptedFeed ──────────────────────────────────────────────

/// Answers every request on the next poll with `reading`, unless `hang`
/// is set, in which case requests are swallowed.
pub struct ScriptedFeed {
    pub reading: Result<f32, FetchError>,
    pub hang: bool,
    pub requests: u32,
    pending: Option<FetchOutcome>,
}

#[allow(dead_code)]
impl ScriptedFeed {
    pub fn reading(celsius: f32) -> Self {
        Self {
            reading: Ok(celsius),
            hang: false,
            requests: 0,
            pending: None,
        }
    }

    pub fn failing(err: FetchError) -> Self {
        Self {
            reading: Err(err),
            hang: false,
            requests: 0,
            pending: None,
        }
    }
}

impl TemperatureFeed for ScriptedFeed {
    fn request(&mut self, seq: u32) -> Result<(), FetchError> {
        self.requests += 1;
        if !self.hang {
            self.pending = Some(FetchOutcome {
                seq,
                result: self.reading,
            });
        }
        Ok(())
    }

    fn poll_outcome(&mut self) -> Option<FetchOutcome> {
        self.pending.take()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Storage ───────────────────────────────────────────────────

/// Storage whose writes always fail; reads behave like an empty store.
pub struct FailingStorage {
    pub write_attempts: u32,
}

impl StoragePort for FailingStorage {
    fn read(&self, _namespace: &str, _key: &str, _buf: &mut [u8]) -> Result<usize, StorageError> {
        Err(StorageError::NotFound)
    }

    fn write(&mut self, _namespace: &str, _key: &str, _data: &[u8]) -> Result<(), StorageError> {
        self.write_attempts += 1;
        Err(StorageError::IoError)
    }

    fn delete(&mut self, _namespace: &str, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn exists(&self, _namespace: &str, _key: &str) -> bool {
        false
    }
}

/// Plain in-memory store, independent of the crate's own NVS simulation.
#[derive(Default)]
pub struct MemStorage {
    store: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&format!("{namespace}::{key}")) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store.insert(format!("{namespace}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{namespace}::{key}"));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{namespace}::{key}"))
    }
}
