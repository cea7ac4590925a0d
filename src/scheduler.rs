//! Re-evaluation gating for the control loop.
//!
//! The scheduler owns no domain state. Each tick it compares the clock
//! against what it saw last time and reports which pieces of work are due;
//! [`AppService`](crate::app::service::AppService) then does that work.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Clock reading                          │
//! │            epoch secs (maybe unsynced) + uptime ms           │
//! └───────────────┬───────────────┬──────────────────┬───────────┘
//!                 │               │                  │
//!                 ▼               ▼                  ▼
//!          ┌────────────┐  ┌─────────────┐   ┌──────────────┐
//!          │ date moved │  │ refresh due │   │ minute moved │
//!          │  → solar   │  │  → gate     │   │  → decide    │
//!          └────────────┘  └─────────────┘   └──────────────┘
//! ```
//!
//! A clock that has not advanced since the previous tick triggers nothing.
//! Cycle events are debounced here as well, against uptime.

use log::{debug, info};

use crate::app::ports::ClockPort;
use crate::config::{DebouncePolicy, SystemConfig};
use crate::mode::{CHANNEL_COUNT, ChannelId};
use crate::solar::calendar::{CalendarDate, minute_of_day};

/// One clock reading, taken once at the top of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Now {
    /// UTC epoch seconds, `None` until the wall clock is synced.
    pub epoch_secs: Option<u64>,
    pub uptime_ms: u64,
}

impl Now {
    pub fn read(clock: &impl ClockPort) -> Self {
        Self {
            epoch_secs: clock.epoch_secs(),
            uptime_ms: clock.uptime_ms(),
        }
    }

    pub fn date(&self) -> Option<CalendarDate> {
        self.epoch_secs.map(CalendarDate::from_epoch_secs)
    }

    pub fn minute(&self) -> Option<u16> {
        self.epoch_secs.map(minute_of_day)
    }
}

/// Work due on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickPlan {
    /// Set when the UTC date differs from the last one seen.
    pub new_date: Option<CalendarDate>,
    /// Temperature refresh interval elapsed, never refreshed, or forced.
    pub refresh_due: bool,
    /// Set when the UTC minute-of-day differs from the last one seen.
    pub new_minute: Option<u16>,
}

impl TickPlan {
    pub fn is_idle(&self) -> bool {
        self.new_date.is_none() && !self.refresh_due && self.new_minute.is_none()
    }
}

pub struct Scheduler {
    last_date: Option<CalendarDate>,
    last_epoch_minute: Option<u64>,
    last_refresh_ms: Option<u64>,
    refresh_interval_ms: u64,
    force_refresh: bool,
    debounce_ms: u64,
    debounce_policy: DebouncePolicy,
    /// Uptime of the last accepted cycle event. Only slot 0 is used when
    /// the policy is [`DebouncePolicy::Shared`].
    last_accept_ms: [Option<u64>; CHANNEL_COUNT],
}

impl Scheduler {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            last_date: None,
            last_epoch_minute: None,
            last_refresh_ms: None,
            refresh_interval_ms: config.temperature_refresh_interval_ms,
            force_refresh: false,
            debounce_ms: config.touch_debounce_ms,
            debounce_policy: config.debounce_policy,
            last_accept_ms: [None; CHANNEL_COUNT],
        }
    }

    /// Report the UTC date at `now` if it differs from the last one seen,
    /// and remember it. Commands handled between ticks call this too, so
    /// they never evaluate against the previous day's window.
    pub fn observe_date(&mut self, now: Now) -> Option<CalendarDate> {
        let date = now.date()?;
        if self.last_date == Some(date) {
            return None;
        }
        info!("Scheduler: date is now {}", date);
        self.last_date = Some(date);
        Some(date)
    }

    /// Work out what is due at `now` and mark it as done.
    pub fn tick(&mut self, now: Now) -> TickPlan {
        let mut plan = TickPlan::default();

        plan.new_date = self.observe_date(now);
        if let Some(epoch) = now.epoch_secs {
            // Compare whole epoch minutes, not minute-of-day, so a jump of
            // exactly 24 h still counts as a rollover.
            let epoch_minute = epoch / 60;
            if self.last_epoch_minute != Some(epoch_minute) {
                self.last_epoch_minute = Some(epoch_minute);
                plan.new_minute = Some(minute_of_day(epoch));
            }
        }

        let interval_elapsed = match self.last_refresh_ms {
            None => true,
            Some(last) => now.uptime_ms.saturating_sub(last) >= self.refresh_interval_ms,
        };
        if self.force_refresh || interval_elapsed {
            self.force_refresh = false;
            self.last_refresh_ms = Some(now.uptime_ms);
            plan.refresh_due = true;
        }

        plan
    }

    /// Make the next [`tick`](Self::tick) report a refresh.
    pub fn request_refresh(&mut self) {
        self.force_refresh = true;
    }

    /// Apply the debounce rule to a cycle event. `true` means accepted.
    pub fn accept_cycle(&mut self, channel: ChannelId, uptime_ms: u64) -> bool {
        let slot = match self.debounce_policy {
            DebouncePolicy::Shared => 0,
            DebouncePolicy::PerChannel => channel.index(),
        };
        if let Some(last) = self.last_accept_ms[slot] {
            let since = uptime_ms.saturating_sub(last);
            if since < self.debounce_ms {
                debug!("Scheduler: {} cycle ignored ({} ms after last)", channel, since);
                return false;
            }
        }
        self.last_accept_ms[slot] = Some(uptime_ms);
        true
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
