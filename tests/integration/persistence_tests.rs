//! Mode and config persistence across simulated reboots.

use pondctl::adapters::nvs::NvsAdapter;
use pondctl::app::commands::AppCommand;
use pondctl::app::events::AppEvent;
use pondctl::app::ports::{ConfigError, ConfigPort, StoragePort};
use pondctl::app::service::AppService;
use pondctl::config::SystemConfig;
use pondctl::mode::PumpMode;
use pondctl::mode::store::MAX_PERSIST_ATTEMPTS;

use crate::mock_hw::{FailingStorage, MemStorage, MockActuators, MockClock, NOON, RecordingSink, ch};

fn cycle_once(app: &mut AppService, storage: &mut impl StoragePort, index: usize) -> RecordingSink {
    let clock = MockClock::at(NOON);
    let mut hw = MockActuators::new();
    let mut sink = RecordingSink::new();
    app.handle_command(
        AppCommand::CycleChannel(ch(index)),
        &clock,
        storage,
        &mut hw,
        &mut sink,
    );
    sink
}

#[test]
fn modes_survive_a_reboot() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut app = AppService::new(SystemConfig::default(), &nvs);
    cycle_once(&mut app, &mut nvs, 1);
    drop(app);

    let rebooted = AppService::new(SystemConfig::default(), &nvs);
    assert_eq!(rebooted.channels()[0].mode, PumpMode::Auto);
    assert_eq!(rebooted.channels()[1].mode, PumpMode::AutoExtend);
    assert!(rebooted.channels().iter().all(|c| !c.on));
}

#[test]
fn mode_byte_layout_is_stable() {
    let mut mem = MemStorage::default();
    let mut app = AppService::new(SystemConfig::default(), &mem);
    cycle_once(&mut app, &mut mem, 0);

    let mut buf = [0u8; 4];
    let n = mem.read("pumps", "mode0", &mut buf).unwrap();
    assert_eq!(&buf[..n], &[4]);
    assert!(!mem.exists("pumps", "mode1"));
}

#[test]
fn corrupted_bytes_fall_back_to_auto_per_channel() {
    let mut mem = MemStorage::default();
    mem.write("pumps", "mode0", &[1]).unwrap();
    mem.write("pumps", "mode1", &[9]).unwrap();

    let app = AppService::new(SystemConfig::default(), &mem);
    assert_eq!(app.channels()[0].mode, PumpMode::On);
    assert_eq!(app.channels()[1].mode, PumpMode::Auto);
}

#[test]
fn empty_and_zero_values_fall_back_to_auto() {
    let mut mem = MemStorage::default();
    mem.write("pumps", "mode0", &[]).unwrap();
    mem.write("pumps", "mode1", &[0]).unwrap();

    let app = AppService::new(SystemConfig::default(), &mem);
    assert_eq!(app.channels()[0].mode, PumpMode::Auto);
    assert_eq!(app.channels()[1].mode, PumpMode::Auto);
}

#[test]
fn failed_persist_keeps_the_new_mode_in_ram() {
    let mut storage = FailingStorage { write_attempts: 0 };
    let mut app = AppService::new(SystemConfig::default(), &storage);
    let sink = cycle_once(&mut app, &mut storage, 0);

    assert_eq!(app.channels()[0].mode, PumpMode::AutoExtend);
    assert_eq!(storage.write_attempts, u32::from(MAX_PERSIST_ATTEMPTS));
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ModeChanged(change) if !change.persisted && change.to == PumpMode::AutoExtend
    )));
}

#[test]
fn config_round_trips_through_nvs() {
    let nvs = NvsAdapter::new().unwrap();
    let config = SystemConfig {
        frost_threshold_c: 1.5,
        extend_window_min: 90,
        ..SystemConfig::default()
    };
    nvs.save(&config).unwrap();

    let loaded = nvs.load().unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn invalid_config_is_rejected_not_clamped() {
    let nvs = NvsAdapter::new().unwrap();
    let config = SystemConfig {
        frost_threshold_c: -50.0,
        ..SystemConfig::default()
    };
    assert!(matches!(nvs.save(&config), Err(ConfigError::ValidationFailed(_))));
    assert_eq!(nvs.load(), Err(ConfigError::NotFound));
}

#[test]
fn corrupted_config_is_erased_and_boot_uses_defaults() {
    let mut nvs = NvsAdapter::new().unwrap();
    nvs.write("pumps", "mode0", &[PumpMode::On.as_byte()]).unwrap();
    nvs.write("pondctl", "syscfg", &[0xFF, 0xFF, 0xFF]).unwrap();
    assert_eq!(nvs.load(), Err(ConfigError::Corrupted));

    nvs.discard_config().unwrap();
    assert!(!nvs.exists("pondctl", "syscfg"));

    // Mode keys in their own namespace survive the erase.
    let app = AppService::new(SystemConfig::default(), &nvs);
    assert_eq!(app.channels()[0].mode, PumpMode::On);
    assert_eq!(app.channels()[1].mode, PumpMode::Auto);
}
