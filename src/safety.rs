//! Frost safety gate.
//!
//! Holds the latest ambient temperature sample and decides whether it is
//! safe to run the pumps. A pump running in frost can freeze its impeller
//! housing and the return pipe, so the rule is conservative:
//!
//! 1. A failed fetch marks the sample invalid. The old value is kept for
//!    display, but it no longer counts.
//! 2. A fetch that is still running after `fetch_timeout_ms` counts as
//!    failed. Its late result is discarded.
//! 3. A sample older than `temperature_max_age_ms` is treated as invalid
//!    even if it arrived successfully.
//! 4. Invalid, NaN or below-threshold samples all mean "not safe".
//!
//! ## Refresh lifecycle
//!
//! ```text
//!  refresh() ──▶ feed.request(seq) ──▶ in flight ──▶ collect() ──▶ apply()
//!                      │                    │
//!                      └─ Err ─▶ apply(Err) └─ timeout ─▶ apply(Err(Timeout))
//! ```

use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::TemperatureFeed;
use crate::config::SystemConfig;
use crate::error::FetchError;

/// Latest temperature reading and whether it can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureSample {
    pub value_c: f32,
    pub valid: bool,
    /// Uptime at which `value_c` was captured.
    pub captured_at_ms: u64,
}

impl TemperatureSample {
    /// Boot state: nothing known, fail safe.
    pub const UNKNOWN: Self = Self {
        value_c: f32::NAN,
        valid: false,
        captured_at_ms: 0,
    };
}

/// True when `sample` forbids running any pump.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub fn frost_lockout(sample: &TemperatureSample, frost_threshold_c: f32) -> bool {
    // Negated `>=` so NaN also locks out.
    !sample.valid || !(sample.value_c >= frost_threshold_c)
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    seq: u32,
    since_ms: u64,
}

/// Owner of the current [`TemperatureSample`].
pub struct TemperatureGate {
    sample: TemperatureSample,
    frost_threshold_c: f32,
    fetch_timeout_ms: u64,
    max_age_ms: u64,
    in_flight: Option<InFlight>,
    next_seq: u32,
}

impl TemperatureGate {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            sample: TemperatureSample::UNKNOWN,
            frost_threshold_c: config.frost_threshold_c,
            fetch_timeout_ms: config.fetch_timeout_ms,
            max_age_ms: config.temperature_max_age_ms,
            in_flight: None,
            next_seq: 0,
        }
    }

    /// Ask the feed for a fresh reading. No-op while one is outstanding.
    pub fn refresh(&mut self, feed: &mut impl TemperatureFeed, now_ms: u64) {
        if let Some(f) = self.in_flight {
            debug!("TempGate: fetch #{} still in flight, not re-requesting", f.seq);
            return;
        }
        self.next_seq = self.next_seq.wrapping_add(1);
        let seq = self.next_seq;
        match feed.request(seq) {
            Ok(()) => {
                debug!("TempGate: fetch #{} requested", seq);
                self.in_flight = Some(InFlight { seq, since_ms: now_ms });
            }
            Err(e) => self.apply(Err(e), now_ms),
        }
    }

    /// Pick up finished fetches and expire a hung one.
    ///
    /// Returns `true` if the sample changed.
    pub fn collect(&mut self, feed: &mut impl TemperatureFeed, now_ms: u64) -> bool {
        let mut changed = false;

        while let Some(outcome) = feed.poll_outcome() {
            match self.in_flight {
                Some(f) if f.seq == outcome.seq => {
                    self.in_flight = None;
                    self.apply(outcome.result, now_ms);
                    changed = true;
                }
                _ => debug!("TempGate: discarding late result of fetch #{}", outcome.seq),
            }
        }

        if let Some(f) = self.in_flight {
            if now_ms.saturating_sub(f.since_ms) >= self.fetch_timeout_ms {
                self.in_flight = None;
                self.apply(Err(FetchError::Timeout), now_ms);
                changed = true;
            }
        }

        changed
    }

    /// Record the result of a fetch.
    pub fn apply(&mut self, result: Result<f32, FetchError>, now_ms: u64) {
        match result {
            Ok(value_c) => {
                if !self.sample.valid {
                    info!("TempGate: sensor valid again ({:.1}\u{00b0}C)", value_c);
                }
                self.sample = TemperatureSample {
                    value_c,
                    valid: true,
                    captured_at_ms: now_ms,
                };
            }
            Err(e) => {
                warn!("TempGate: fetch failed ({}), sample marked invalid", e);
                self.sample.valid = false;
            }
        }
    }

    /// Whether a fetch is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The sample as last recorded, without the age check.
    pub fn sample(&self) -> TemperatureSample {
        self.sample
    }

    /// The sample as the decision engine must see it at `now_ms`.
    pub fn effective_sample(&self, now_ms: u64) -> TemperatureSample {
        let mut s = self.sample;
        if s.valid && now_ms.saturating_sub(s.captured_at_ms) > self.max_age_ms {
            s.valid = false;
        }
        s
    }

    /// True when the pumps may run at all.
    pub fn is_safe_to_run(&self, now_ms: u64) -> bool {
        !frost_lockout(&self.effective_sample(now_ms), self.frost_threshold_c)
    }
}
