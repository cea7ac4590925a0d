//! Pond controller firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   SystemClock     │
//! │  (ActuatorPort)    (EventSink)    (Config+NVS) (ClockPort)     │
//! │  FetchWorker ── MarkedTemperatureSource ── HttpPayloadFetcher  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Modes · Frost gate · Solar · Scheduler                │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Threads: main (control loop) · wifi · temp-fetch · buttons    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pin numbers live in [`pondctl::pins`].
#![deny(unused_must_use)]

use core::time::Duration;

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver};
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use pondctl::adapters::hardware::HardwareAdapter;
use pondctl::adapters::http::HttpPayloadFetcher;
use pondctl::adapters::log_sink::LogEventSink;
use pondctl::adapters::nvs::NvsAdapter;
use pondctl::adapters::time::SystemClock;
use pondctl::app::commands::AppCommand;
use pondctl::app::ports::{ConfigError, ConfigPort};
use pondctl::app::service::AppService;
use pondctl::config::SystemConfig;
use pondctl::drivers::relay::RelayDriver;
use pondctl::events::{CommandQueue, CommandSender};
use pondctl::mode::ChannelId;
use pondctl::pins;
use pondctl::sensors::{FetchWorker, MarkedTemperatureSource};

const WIFI_SSID: &str = match option_env!("PONDCTL_WIFI_SSID") {
    Some(s) => s,
    None => "",
};
const WIFI_PASS: &str = match option_env!("PONDCTL_WIFI_PASS") {
    Some(s) => s,
    None => "",
};

/// Button poll period; presses shorter than this are missed.
const BUTTON_POLL: Duration = Duration::from_millis(20);
const WIFI_RETRY: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  pondctl v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(ConfigError::NotFound) => {
            info!("No stored config, using defaults");
            SystemConfig::default()
        }
        Err(ConfigError::Corrupted) => {
            warn!("Stored config corrupted, erasing it and using defaults");
            if let Err(e) = nvs.discard_config() {
                warn!("Config erase failed: {}", e);
            }
            SystemConfig::default()
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Network: Wi-Fi keeper thread + SNTP ────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    spawn_wifi(peripherals.modem, sysloop, nvs_partition)?;
    let _sntp = EspSntp::new_default()?;

    // ── 4. Relays ─────────────────────────────────────────────
    let mut hw = HardwareAdapter::new([
        RelayDriver::new(output_pin(pins::PUMP0_RELAY_GPIO)?, config.relay_active_low)?,
        RelayDriver::new(output_pin(pins::PUMP1_RELAY_GPIO)?, config.relay_active_low)?,
    ]);
    info!(
        "Relays on GPIO {:?} (active {})",
        pins::RELAY_GPIOS,
        if config.relay_active_low { "low" } else { "high" }
    );

    // ── 5. Temperature worker ─────────────────────────────────
    let timeout = Duration::from_millis(config.fetch_timeout_ms);
    let source_cfg = config.clone();
    let mut feed = FetchWorker::spawn(
        move || MarkedTemperatureSource::new(HttpPayloadFetcher::new(timeout), &source_cfg),
        timeout,
    )?;

    // ── 6. Command producers ──────────────────────────────────
    let queue = CommandQueue::new();
    // Both button pins rely on external pull-ups; GPIO 35 has no internal ones.
    let buttons = [
        input_pin(pins::PUMP0_BUTTON_GPIO)?,
        input_pin(pins::PUMP1_BUTTON_GPIO)?,
    ];
    info!("Cycle buttons on GPIO {:?}", pins::BUTTON_GPIOS);
    spawn_buttons(buttons, queue.sender())?;

    // ── 7. App service ────────────────────────────────────────
    let clock = SystemClock::new();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(config.clone(), &nvs);
    app.start(&mut hw, &mut sink);

    info!("System ready. Entering control loop.");

    // ── 8. Control loop ───────────────────────────────────────
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));
    loop {
        queue.drain(|cmd| app.handle_command(cmd, &clock, &mut nvs, &mut hw, &mut sink));
        app.tick(&clock, &mut hw, &mut feed, &mut sink);
        std::thread::sleep(tick);
    }
}

fn output_pin(gpio: i32) -> Result<PinDriver<'static, AnyOutputPin, Output>> {
    // SAFETY: `Peripherals::take()` has succeeded and every number in
    // `pins` is claimed exactly once, here or in `input_pin`.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    Ok(PinDriver::output(pin)?)
}

fn input_pin(gpio: i32) -> Result<PinDriver<'static, AnyInputPin, Input>> {
    // SAFETY: see `output_pin`.
    let pin = unsafe { AnyInputPin::new(gpio) };
    Ok(PinDriver::input(pin)?)
}

/// Bring Wi-Fi up and keep reconnecting it on a thread of its own, so a
/// slow association never delays the control loop.
fn spawn_wifi(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
) -> Result<()> {
    if WIFI_SSID.is_empty() {
        warn!("Wi-Fi: no SSID configured; clock stays unsynced, AUTO pumps stay off");
        return Ok(());
    }
    let esp_wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID
            .try_into()
            .map_err(|_| anyhow::anyhow!("Wi-Fi SSID too long"))?,
        password: WIFI_PASS
            .try_into()
            .map_err(|_| anyhow::anyhow!("Wi-Fi password too long"))?,
        ..Default::default()
    }))?;
    wifi.start()?;

    std::thread::Builder::new()
        .name("wifi".into())
        .stack_size(8 * 1024)
        .spawn(move || {
            loop {
                if !wifi.is_connected().unwrap_or(false) {
                    match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
                        Ok(()) => info!("Wi-Fi: connected"),
                        Err(e) => warn!("Wi-Fi: connect failed: {:?}", e),
                    }
                }
                std::thread::sleep(WIFI_RETRY);
            }
        })?;
    Ok(())
}

/// Poll the two cycle buttons and queue a command on each press.
fn spawn_buttons(
    buttons: [PinDriver<'static, AnyInputPin, Input>; 2],
    tx: CommandSender,
) -> Result<()> {
    std::thread::Builder::new()
        .name("buttons".into())
        .stack_size(4 * 1024)
        .spawn(move || {
            let mut was_down = [false; 2];
            loop {
                for (i, (pin, prev)) in buttons.iter().zip(was_down.iter_mut()).enumerate() {
                    let down = pin.is_low();
                    if down && !*prev {
                        if let Some(id) = ChannelId::new(i) {
                            tx.send(AppCommand::CycleChannel(id));
                        }
                    }
                    *prev = down;
                }
                std::thread::sleep(BUTTON_POLL);
            }
        })?;
    Ok(())
}
