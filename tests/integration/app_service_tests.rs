//! Integration tests for the AppService → decision engine → relays pipeline.
//!
//! These run on the host (x86_64) and drive the service through its ports
//! with a settable clock, a scripted temperature feed and recording mocks.

use pondctl::adapters::nvs::NvsAdapter;
use pondctl::app::commands::AppCommand;
use pondctl::app::events::AppEvent;
use pondctl::app::ports::StoragePort;
use pondctl::app::service::AppService;
use pondctl::config::{DebouncePolicy, SystemConfig};
use pondctl::error::FetchError;
use pondctl::mode::PumpMode;
use pondctl::solar::calendar::CalendarDate;
use pondctl::solar::daylight_window;

use crate::mock_hw::{
    ActuatorCall, LATE_EVENING, MockActuators, MockClock, NOON, RecordingSink, ScriptedFeed, ch,
};

struct Rig {
    app: AppService,
    nvs: NvsAdapter,
    hw: MockActuators,
    sink: RecordingSink,
    clock: MockClock,
    feed: ScriptedFeed,
}

impl Rig {
    fn new(config: SystemConfig, clock: MockClock, feed: ScriptedFeed) -> Self {
        Self::with_nvs(config, NvsAdapter::new().unwrap(), clock, feed)
    }

    fn with_nvs(config: SystemConfig, nvs: NvsAdapter, clock: MockClock, feed: ScriptedFeed) -> Self {
        let mut app = AppService::new(config, &nvs);
        let mut hw = MockActuators::new();
        let mut sink = RecordingSink::new();
        app.start(&mut hw, &mut sink);
        Self { app, nvs, hw, sink, clock, feed }
    }

    fn tick(&mut self) {
        self.app.tick(&self.clock, &mut self.hw, &mut self.feed, &mut self.sink);
    }

    fn command(&mut self, cmd: AppCommand) {
        self.app
            .handle_command(cmd, &self.clock, &mut self.nvs, &mut self.hw, &mut self.sink);
    }

    fn cycle(&mut self, index: usize) {
        self.command(AppCommand::CycleChannel(ch(index)));
    }
}

fn warm_noon() -> Rig {
    Rig::new(SystemConfig::default(), MockClock::at(NOON), ScriptedFeed::reading(12.0))
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_releases_relays_and_announces_modes() {
    let rig = warm_noon();
    assert_eq!(rig.hw.calls, vec![ActuatorCall::AllOff]);
    assert_eq!(
        rig.sink.events,
        vec![AppEvent::Started([PumpMode::Auto, PumpMode::Auto])]
    );
}

// ── Daylight ──────────────────────────────────────────────────

#[test]
fn auto_runs_during_the_day_when_warm() {
    let mut rig = warm_noon();
    rig.tick();

    assert!(!rig.app.is_locked_out());
    assert!(rig.hw.is_on(ch(0)));
    assert!(rig.hw.is_on(ch(1)));
    assert!(rig.app.channels().iter().all(|c| c.on));
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::DaylightUpdated { .. })), 1);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::LockoutChanged(false)), 1);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ActuatorChanged { on: true, .. })), 2);
}

#[test]
fn auto_and_extend_stay_off_late_at_night() {
    let mut rig = Rig::new(
        SystemConfig::default(),
        MockClock::at(LATE_EVENING),
        ScriptedFeed::reading(12.0),
    );
    rig.tick();
    rig.cycle(1); // AUTO → AUTO+

    assert!(!rig.app.is_locked_out());
    assert_eq!(rig.app.channels()[1].mode, PumpMode::AutoExtend);
    assert!(!rig.hw.is_on(ch(0)));
    assert!(!rig.hw.is_on(ch(1)));
    assert_eq!(rig.hw.set_calls(), 0, "no relay write when nothing changes");
}

#[test]
fn extend_mode_keeps_running_just_after_sunset() {
    let mut rig = warm_noon();
    rig.cycle(0); // AUTO → AUTO+
    rig.tick();
    let sunset = rig.app.window().unwrap().sunset_min;

    // Ten minutes past sunset: AUTO stops, AUTO+ keeps going.
    let target_min = u64::from(sunset) + 10;
    let ms = (target_min - 12 * 60) * 60_000;
    rig.clock.advance(ms);
    rig.tick();

    assert!(rig.hw.is_on(ch(0)));
    assert!(!rig.hw.is_on(ch(1)));
}

#[test]
fn cycle_just_after_midnight_uses_the_new_dates_window() {
    let midnight = NOON + 12 * 3600;
    let mut rig = Rig::new(
        SystemConfig::default(),
        MockClock::at(midnight - 30),
        ScriptedFeed::reading(12.0),
    );
    rig.tick();

    // The press lands before the loop has ticked past midnight.
    rig.clock.advance(60_000);
    rig.cycle(1);

    let today = CalendarDate::new(2024, 6, 21).unwrap();
    let cfg = rig.app.config();
    let expected = daylight_window(&today, cfg.latitude, cfg.longitude);
    assert_eq!(rig.app.window(), Some(expected));
    assert_eq!(rig.app.snapshot().date, Some(today));

    let updated = rig
        .sink
        .events
        .iter()
        .position(|e| matches!(e, AppEvent::DaylightUpdated { date, .. } if *date == today))
        .expect("window recomputed for the new date");
    let changed = rig
        .sink
        .events
        .iter()
        .position(|e| matches!(e, AppEvent::ModeChanged(_)))
        .unwrap();
    assert!(updated < changed);

    // The next tick does not recompute it again.
    rig.clock.advance(1000);
    rig.tick();
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::DaylightUpdated { .. })), 2);
}

#[test]
fn date_rollover_recomputes_the_window() {
    let mut rig = warm_noon();
    rig.tick();
    rig.clock.advance(24 * 3600 * 1000);
    rig.tick();
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::DaylightUpdated { .. })), 2);
}

// ── Frost lockout ─────────────────────────────────────────────

#[test]
fn cold_reading_keeps_every_mode_off() {
    let mut rig = Rig::new(SystemConfig::default(), MockClock::at(NOON), ScriptedFeed::reading(1.0));
    rig.cycle(0); // AUTO → AUTO+
    rig.clock.advance(1000);
    rig.cycle(0); // AUTO+ → ON
    rig.tick();

    assert_eq!(rig.app.channels()[0].mode, PumpMode::On);
    assert!(rig.app.is_locked_out());
    assert!(!rig.hw.is_on(ch(0)));
    assert!(!rig.hw.is_on(ch(1)));
}

#[test]
fn frost_arriving_later_switches_pumps_off() {
    let mut rig = warm_noon();
    rig.tick();
    assert!(rig.hw.is_on(ch(0)));

    rig.feed.reading = Ok(-2.0);
    rig.clock.advance(600_000);
    rig.tick();

    assert!(rig.app.is_locked_out());
    assert_eq!(rig.sink.count(|e| *e == AppEvent::LockoutChanged(true)), 1);
    assert!(!rig.hw.is_on(ch(0)));
    assert!(!rig.hw.is_on(ch(1)));
}

#[test]
fn threshold_itself_is_not_frost() {
    let mut rig = Rig::new(SystemConfig::default(), MockClock::at(NOON), ScriptedFeed::reading(3.0));
    rig.tick();
    assert!(!rig.app.is_locked_out());
    assert!(rig.hw.is_on(ch(0)));
}

#[test]
fn failed_fetch_locks_out() {
    let mut rig = Rig::new(
        SystemConfig::default(),
        MockClock::at(NOON),
        ScriptedFeed::failing(FetchError::MarkerNotFound),
    );
    rig.tick();
    assert!(rig.app.is_locked_out());
    assert!(!rig.app.sample().valid);
    assert!(!rig.hw.is_on(ch(0)));
}

#[test]
fn hung_fetch_times_out_into_lockout() {
    let mut rig = warm_noon();
    rig.tick();
    assert!(rig.hw.is_on(ch(0)));

    rig.feed.hang = true;
    rig.clock.advance(600_000);
    rig.tick();
    assert!(rig.hw.is_on(ch(0)), "still running while the fetch is outstanding");

    rig.clock.advance(15_000);
    rig.tick();
    assert!(rig.app.is_locked_out());
    assert!(!rig.hw.is_on(ch(0)));
    assert!(rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::TemperatureUpdated(s) if !s.valid)));
}

#[test]
fn one_outstanding_fetch_at_a_time() {
    let mut rig = warm_noon();
    rig.feed.hang = true;
    rig.tick();
    rig.command(AppCommand::RefreshTemperature);
    rig.clock.advance(1000);
    rig.tick();
    assert_eq!(rig.feed.requests, 1);
}

#[test]
fn stale_sample_expires_into_lockout() {
    let config = SystemConfig {
        temperature_refresh_interval_ms: 3_600_000,
        temperature_max_age_ms: 1_800_000,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(config, MockClock::at(NOON), ScriptedFeed::reading(12.0));
    rig.tick();
    assert!(rig.hw.is_on(ch(0)));

    rig.clock.advance(1_800_001);
    rig.tick();
    assert!(rig.app.is_locked_out());
    assert!(!rig.hw.is_on(ch(0)));
}

#[test]
fn refresh_command_fetches_on_the_next_tick() {
    let mut rig = warm_noon();
    rig.tick();
    assert_eq!(rig.feed.requests, 1);

    rig.feed.reading = Ok(2.0);
    rig.command(AppCommand::RefreshTemperature);
    rig.clock.advance(5000);
    rig.tick();

    assert_eq!(rig.feed.requests, 2);
    assert!(rig.app.is_locked_out());
    assert!(!rig.hw.is_on(ch(1)));
}

// ── Clock ─────────────────────────────────────────────────────

#[test]
fn unsynced_clock_runs_on_mode_but_holds_auto_off() {
    let mut nvs = NvsAdapter::new().unwrap();
    nvs.write("pumps", "mode0", &[PumpMode::On.as_byte()]).unwrap();
    let mut rig = Rig::with_nvs(
        SystemConfig::default(),
        nvs,
        MockClock::unsynced(),
        ScriptedFeed::reading(12.0),
    );

    rig.tick();
    assert_eq!(rig.app.channels()[0].mode, PumpMode::On);
    assert!(!rig.app.is_locked_out());
    assert!(rig.hw.is_on(ch(0)), "ON needs no window");
    assert!(!rig.hw.is_on(ch(1)), "AUTO waits for the clock");
    assert!(rig.app.snapshot().date.is_none());

    rig.clock.set_epoch(Some(NOON));
    rig.clock.advance(1000);
    rig.tick();
    assert!(rig.hw.is_on(ch(0)));
    assert!(rig.hw.is_on(ch(1)));
}

// ── Mode cycling ──────────────────────────────────────────────

#[test]
fn cycling_walks_the_fixed_order_and_reevaluates() {
    let mut rig = warm_noon();
    rig.tick();
    assert!(rig.hw.is_on(ch(0)));

    let expected = [PumpMode::AutoExtend, PumpMode::On, PumpMode::Off, PumpMode::Auto];
    let mut seen = Vec::new();
    for _ in 0..4 {
        rig.clock.advance(500);
        rig.cycle(0);
        seen.push(rig.app.channels()[0].mode);
        // Relay follows the mode immediately, without waiting for a tick.
        let want_on = seen.last() != Some(&PumpMode::Off);
        assert_eq!(rig.hw.is_on(ch(0)), want_on, "after {:?}", seen.last());
    }
    assert_eq!(seen, expected);
    assert!(rig.hw.is_on(ch(1)), "other channel untouched");
    assert_eq!(rig.app.channels()[1].mode, PumpMode::Auto);
}

#[test]
fn shared_debounce_ignores_a_second_touch_on_either_channel() {
    let mut rig = warm_noon();
    rig.clock.advance(1000);
    rig.cycle(0);
    rig.clock.advance(100);
    rig.cycle(1);

    assert_eq!(rig.app.channels()[0].mode, PumpMode::AutoExtend);
    assert_eq!(rig.app.channels()[1].mode, PumpMode::Auto);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::CycleIgnored(ch(1))), 1);

    rig.clock.advance(200);
    rig.cycle(1);
    assert_eq!(rig.app.channels()[1].mode, PumpMode::AutoExtend);
}

#[test]
fn per_channel_debounce_tracks_channels_separately() {
    let config = SystemConfig {
        debounce_policy: DebouncePolicy::PerChannel,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(config, MockClock::at(NOON), ScriptedFeed::reading(12.0));
    rig.clock.advance(1000);
    rig.cycle(0);
    rig.clock.advance(100);
    rig.cycle(1);
    rig.clock.advance(100);
    rig.cycle(0);

    assert_eq!(rig.app.channels()[0].mode, PumpMode::AutoExtend);
    assert_eq!(rig.app.channels()[1].mode, PumpMode::AutoExtend);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::CycleIgnored(ch(0))), 1);
}

// ── Relay failures ────────────────────────────────────────────

#[test]
fn relay_failure_leaves_recorded_state_unchanged() {
    let mut rig = warm_noon();
    rig.hw.fail = true;
    rig.tick();

    assert!(rig.app.channels().iter().all(|c| !c.on));
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ActuatorChanged { .. })), 0);

    // Retried on the next evaluation once the relay recovers.
    rig.hw.fail = false;
    rig.clock.advance(60_000);
    rig.tick();
    assert!(rig.app.channels().iter().all(|c| c.on));
}

// ── Status ────────────────────────────────────────────────────

#[test]
fn status_snapshot_follows_each_evaluation() {
    let mut rig = warm_noon();
    rig.tick();

    let snap = match rig.sink.events.last() {
        Some(AppEvent::Status(s)) => s.clone(),
        other => panic!("expected status, got {other:?}"),
    };
    assert_eq!(snap.minute_utc, Some(720));
    assert!(snap.is_daytime);
    assert!(!snap.frost_lockout);
    assert!(snap.dst);
    assert_eq!(snap.local_time.as_deref(), Some("13:00"));
    assert!(snap.sun_elevation_deg.unwrap() > 50.0);
    assert!(snap.channels.iter().all(|c| c.on && c.mode == "AUTO"));

    let json = snap.to_json().unwrap();
    assert!(json.contains("\"frost_lockout\":false"));
    assert!(json.contains("\"mode\":\"AUTO\""));
}

#[test]
fn idle_ticks_do_not_reevaluate() {
    let mut rig = warm_noon();
    rig.tick();
    rig.sink.clear();

    // Same minute, nothing due.
    rig.clock.advance(1000);
    rig.tick();
    assert!(rig.sink.events.is_empty());
    assert_eq!(rig.app.tick_count(), 2);
}
