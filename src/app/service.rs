//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the pump channels, the frost gate, the cached
//! daylight window and the scheduler. It is the single writer of all of
//! them. All I/O flows through port traits injected at call sites, making
//! the entire service testable with mock adapters.
//!
//! ```text
//!     ClockPort ──▶ ┌──────────────────────────┐ ──▶ ActuatorPort
//! TemperatureFeed ◀▶│        AppService        │ ──▶ EventSink
//!   StoragePort ◀──▶│ Modes · Gate · Scheduler │
//!                   └──────────────────────────┘
//! ```
//!
//! ## Tick order
//!
//! 1. Read the clock once.
//! 2. New UTC date → recompute the daylight window.
//! 3. Collect finished fetches; request a new one if due.
//! 4. Lockout verdict flipped → evaluate now.
//! 5. Minute rolled over → evaluate.
//!
//! A cycle command evaluates both channels immediately, outside the minute
//! gate, because AUTO_EXTEND compares against a sunset they share. It picks
//! up a UTC date change first, so a press just after midnight never sees
//! the previous day's window.

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::control::decision::PumpDecisionEngine;
use crate::mode::{CHANNEL_COUNT, ModeStateMachine, PumpChannel, PumpModeStore};
use crate::safety::{TemperatureGate, TemperatureSample};
use crate::scheduler::{Now, Scheduler};
use crate::solar::calendar::CalendarDate;
use crate::solar::dst::LocalTime;
use crate::solar::{self, DaylightWindow};

use super::commands::AppCommand;
use super::events::{AppEvent, ChannelStatus, StatusSnapshot};
use super::ports::{ActuatorPort, ClockPort, EventSink, StoragePort, TemperatureFeed};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    modes: ModeStateMachine,
    channels: [PumpChannel; CHANNEL_COUNT],
    engine: PumpDecisionEngine,
    gate: TemperatureGate,
    scheduler: Scheduler,
    date: Option<CalendarDate>,
    window: Option<DaylightWindow>,
    /// Clock reading of the most recent tick or command.
    now: Now,
    locked_out: bool,
    tick_count: u64,
}

impl AppService {
    /// Construct the service and restore both channel modes.
    ///
    /// Does **not** touch the relays; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, storage: &impl StoragePort) -> Self {
        let modes = ModeStateMachine::new(PumpModeStore::default());
        let channels = modes.boot(storage);
        Self {
            engine: PumpDecisionEngine::from_config(&config),
            gate: TemperatureGate::new(&config),
            scheduler: Scheduler::new(&config),
            config,
            modes,
            channels,
            date: None,
            window: None,
            now: Now {
                epoch_secs: None,
                uptime_ms: 0,
            },
            // No sample yet, so the gate starts closed.
            locked_out: true,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Release both relays and announce the restored modes.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        hw.all_off();
        for ch in self.channels.iter_mut() {
            ch.on = false;
        }
        let modes = self.channels.map(|c| c.mode);
        sink.emit(&AppEvent::Started(modes));
        info!("AppService started (modes {} / {})", modes[0], modes[1]);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one pass of the control loop.
    pub fn tick(
        &mut self,
        clock: &impl ClockPort,
        hw: &mut impl ActuatorPort,
        feed: &mut impl TemperatureFeed,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let now = Now::read(clock);
        self.now = now;
        let plan = self.scheduler.tick(now);

        // 1. Daylight window, once per UTC date
        if let Some(date) = plan.new_date {
            self.update_window(date, sink);
        }

        // 2. Temperature: collect, request if due, collect again so an
        //    inline feed lands on this same tick.
        let mut sample_changed = self.gate.collect(feed, now.uptime_ms);
        if plan.refresh_due {
            self.gate.refresh(feed, now.uptime_ms);
            sample_changed |= self.gate.collect(feed, now.uptime_ms);
        }
        if sample_changed {
            sink.emit(&AppEvent::TemperatureUpdated(self.gate.sample()));
        }

        // 3. Lockout transitions
        let locked_out = !self.gate.is_safe_to_run(now.uptime_ms);
        let lockout_flipped = locked_out != self.locked_out;
        if lockout_flipped {
            self.locked_out = locked_out;
            if locked_out {
                warn!("Frost lockout ENTERED: {:?}", self.gate.effective_sample(now.uptime_ms));
            } else {
                info!("Frost lockout CLEARED");
            }
            sink.emit(&AppEvent::LockoutChanged(locked_out));
        }

        // 4. Decide
        if plan.new_minute.is_some() || plan.new_date.is_some() || lockout_flipped {
            self.evaluate(hw, sink);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        clock: &impl ClockPort,
        storage: &mut impl StoragePort,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::CycleChannel(id) => {
                let now = Now::read(clock);
                if !self.scheduler.accept_cycle(id, now.uptime_ms) {
                    sink.emit(&AppEvent::CycleIgnored(id));
                    return;
                }
                self.now = now;
                if let Some(date) = self.scheduler.observe_date(now) {
                    self.update_window(date, sink);
                }
                let change = self.modes.cycle(&mut self.channels[id.index()], storage);
                sink.emit(&AppEvent::ModeChanged(change));
                self.evaluate(hw, sink);
            }
            AppCommand::RefreshTemperature => {
                info!("Temperature refresh requested");
                self.scheduler.request_refresh();
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build the presentation snapshot for the last clock reading.
    pub fn snapshot(&self) -> StatusSnapshot {
        let minute = self.now.minute();
        let is_daytime = self.is_daytime(minute);
        let sun_elevation_deg = match (self.date, minute) {
            (Some(date), Some(m)) => Some(solar::sun_elevation_deg(
                &date,
                m,
                self.config.latitude,
                self.config.longitude,
            )),
            _ => None,
        };
        let local = self.now.epoch_secs.map(LocalTime::from_epoch_secs);

        StatusSnapshot {
            date: self.date,
            minute_utc: minute,
            window: self.window,
            is_daytime,
            sun_elevation_deg,
            local_time: local.map(|l| l.hhmm()),
            dst: local.is_some_and(|l| l.dst),
            temperature: self.gate.effective_sample(self.now.uptime_ms),
            frost_lockout: self.locked_out,
            channels: self.channels.map(|c| ChannelStatus {
                channel: c.id,
                mode: c.mode.name(),
                mode_byte: c.mode.as_byte(),
                on: c.on,
            }),
        }
    }

    pub fn channels(&self) -> &[PumpChannel; CHANNEL_COUNT] {
        &self.channels
    }

    pub fn window(&self) -> Option<DaylightWindow> {
        self.window
    }

    pub fn sample(&self) -> TemperatureSample {
        self.gate.sample()
    }

    pub fn is_locked_out(&self) -> bool {
        self.locked_out
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn is_daytime(&self, minute: Option<u16>) -> bool {
        match (self.window, minute) {
            (Some(w), Some(m)) => w.is_daytime(m),
            _ => false,
        }
    }

    fn update_window(&mut self, date: CalendarDate, sink: &mut impl EventSink) {
        let window = solar::daylight_window(&date, self.config.latitude, self.config.longitude);
        info!(
            "Daylight {}: sunrise {} sunset {} UTC ({:?})",
            date, window.sunrise_min, window.sunset_min, window.kind
        );
        self.date = Some(date);
        self.window = Some(window);
        sink.emit(&AppEvent::DaylightUpdated { date, window });
    }

    /// Decide both channels, drive the relays, publish a snapshot.
    ///
    /// Without a synced clock (no window yet) ON and OFF still apply and
    /// both AUTO modes are held off.
    fn evaluate(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        let minute = self.now.minute();
        let sample = self.gate.effective_sample(self.now.uptime_ms);
        let is_daytime = self.is_daytime(minute);

        for ch in self.channels.iter_mut() {
            let want = match (self.window, minute) {
                (Some(w), Some(m)) => self.engine.decide(ch.mode, is_daytime, m, w.sunset_min, &sample),
                _ => self.engine.decide_unscheduled(ch.mode, &sample),
            };
            if want == ch.on {
                continue;
            }
            match hw.set_actuator(ch.id, want) {
                Ok(()) => {
                    ch.on = want;
                    info!("{} {} ({})", ch.id, if want { "ON" } else { "OFF" }, ch.mode);
                    sink.emit(&AppEvent::ActuatorChanged { channel: ch.id, on: want });
                }
                Err(e) => error!("{}: relay write failed: {}", ch.id, e),
            }
        }

        sink.emit(&AppEvent::Status(self.snapshot()));
    }
}
