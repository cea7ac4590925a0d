//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                   |
//! |------------|----------------|-------------------------------|
//! | `hardware` | ActuatorPort   | pump relays (embedded-hal)    |
//! | `http`     | PayloadFetcher | ESP-IDF HTTP client           |
//! | `log_sink` | EventSink      | Serial log output             |
//! | `nvs`      | ConfigPort     | NVS / in-memory store         |
//! |            | StoragePort    |                               |
//! | `time`     | ClockPort      | SNTP wall clock, ESP32 timer  |

pub mod hardware;
#[cfg(target_os = "espidf")]
pub mod http;
pub mod log_sink;
pub mod nvs;
pub mod time;
