//! Ambient temperature from a remote text payload.
//!
//! The weather endpoint returns a document (JSON, HTML, whatever) in which
//! the current temperature is the first numeric token after a fixed marker,
//! e.g. `"temp":` in `{"main":{"temp": 7.4, ...}}`. Parsing is deliberately
//! format-agnostic: find the marker, skip blanks and an optional quote,
//! read a signed decimal.
//!
//! ## Dual-target design
//!
//! On ESP-IDF the payload comes from [`crate::adapters::http::HttpPayloadFetcher`].
//! On host/test any [`PayloadFetcher`] can be plugged in.

use log::debug;

use crate::app::ports::TemperatureSource;
use crate::config::{MARKER_CAPACITY, SystemConfig, URL_CAPACITY};
use crate::error::FetchError;

/// Payload bytes kept per fetch. Anything past this is ignored.
pub const PAYLOAD_CAPACITY: usize = 2048;

/// Plausible ambient range. Values outside are a parse of the wrong token.
const MIN_PLAUSIBLE_C: f32 = -60.0;
const MAX_PLAUSIBLE_C: f32 = 60.0;

/// Transport half of a temperature fetch: GET `url` into `buf`.
pub trait PayloadFetcher {
    /// Returns the number of bytes written into `buf`.
    fn fetch(&mut self, url: &str, buf: &mut [u8]) -> Result<usize, FetchError>;
}

/// Extract the first numeric token following `marker`.
pub fn parse_marked_temperature(payload: &str, marker: &str) -> Result<f32, FetchError> {
    let start = payload.find(marker).ok_or(FetchError::MarkerNotFound)? + marker.len();
    let rest = payload[start..].trim_start_matches([' ', '\t', '\r', '\n', '"', '\'']);

    let bytes = rest.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end = 1;
    }
    let digits_start = end;
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }

    let token = &rest[..end];
    if !token[digits_start..].bytes().any(|b| b.is_ascii_digit()) {
        return Err(FetchError::NoNumericToken);
    }
    let value: f32 = token.parse().map_err(|_| FetchError::NoNumericToken)?;
    if !(MIN_PLAUSIBLE_C..=MAX_PLAUSIBLE_C).contains(&value) {
        debug!("Temp: token {} outside plausible range", token);
        return Err(FetchError::NoNumericToken);
    }
    Ok(value)
}

/// [`TemperatureSource`] that fetches a payload and parses it by marker.
pub struct MarkedTemperatureSource<F> {
    fetcher: F,
    url: heapless::String<URL_CAPACITY>,
    marker: heapless::String<MARKER_CAPACITY>,
    buf: Box<[u8; PAYLOAD_CAPACITY]>,
}

impl<F: PayloadFetcher> MarkedTemperatureSource<F> {
    pub fn new(fetcher: F, config: &SystemConfig) -> Self {
        Self {
            fetcher,
            url: config.temperature_url.clone(),
            marker: config.temperature_marker.clone(),
            buf: Box::new([0u8; PAYLOAD_CAPACITY]),
        }
    }

    /// Blocking fetch-and-parse.
    pub fn fetch_blocking(&mut self) -> Result<f32, FetchError> {
        let len = self.fetcher.fetch(&self.url, &mut self.buf[..])?;
        let bytes = &self.buf[..len.min(PAYLOAD_CAPACITY)];
        // A truncated multi-byte character at the end is not an error.
        let text = match core::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
        };
        parse_marked_temperature(text, &self.marker)
    }
}

impl<F: PayloadFetcher> TemperatureSource for MarkedTemperatureSource<F> {
    async fn fetch_celsius(&mut self) -> Result<f32, FetchError> {
        self.fetch_blocking()
    }
}
