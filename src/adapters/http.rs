//! ESP-IDF HTTP client adapter.
//!
//! Implements [`PayloadFetcher`] over `esp_idf_svc::http::client`. A fresh
//! connection is opened per fetch; at one request every ten minutes keeping
//! a socket alive costs more than it saves.
//!
//! Error mapping:
//!
//! | Failure                          | FetchError           |
//! |----------------------------------|----------------------|
//! | connect / DNS / TLS / read error | `NetworkUnavailable` |
//! | status outside 200..300          | `HttpStatus(code)`   |
//! | socket timeout                   | `Timeout`            |

use core::time::Duration;

use esp_idf_svc::http::Method;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use log::{debug, warn};

use crate::error::FetchError;
use crate::sensors::temperature::PayloadFetcher;

pub struct HttpPayloadFetcher {
    timeout: Duration,
}

impl HttpPayloadFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl PayloadFetcher for HttpPayloadFetcher {
    fn fetch(&mut self, url: &str, buf: &mut [u8]) -> Result<usize, FetchError> {
        let conf = Configuration {
            timeout: Some(self.timeout),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let mut conn = EspHttpConnection::new(&conf).map_err(|e| {
            warn!("HTTP: connection setup failed: {:?}", e);
            FetchError::NetworkUnavailable
        })?;

        conn.initiate_request(Method::Get, url, &[("accept", "application/json")])
            .map_err(|e| {
                warn!("HTTP: GET {} failed: {:?}", url, e);
                map_esp_err(e)
            })?;
        conn.initiate_response().map_err(map_esp_err)?;

        let status = conn.status();
        if !(200..300).contains(&status) {
            return Err(FetchError::HttpStatus(status));
        }

        let mut total = 0;
        while total < buf.len() {
            let n = conn.read(&mut buf[total..]).map_err(map_esp_err)?;
            if n == 0 {
                break;
            }
            total += n;
        }
        debug!("HTTP: {} bytes from {}", total, url);
        Ok(total)
    }
}

fn map_esp_err(e: esp_idf_svc::sys::EspError) -> FetchError {
    let code = e.code();
    if code == esp_idf_svc::sys::ESP_ERR_HTTP_EAGAIN as i32
        || code == esp_idf_svc::sys::ESP_ERR_TIMEOUT as i32
    {
        FetchError::Timeout
    } else {
        FetchError::NetworkUnavailable
    }
}
