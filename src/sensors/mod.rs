//! Sensor subsystem.
//!
//! The only sensor is remote: ambient air temperature parsed out of a
//! weather payload ([`temperature`]), fetched off the control thread
//! ([`fetch_task`]).

pub mod fetch_task;
pub mod temperature;

pub use fetch_task::{FetchWorker, InlineFeed};
pub use temperature::{MarkedTemperatureSource, PayloadFetcher, parse_marked_temperature};
