//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for the pond
//! controller.
//!
//! - Config validation: all fields are range-checked before persistence.
//!   A stored blob that fails validation on load is ignored.
//! - Namespace isolation: pump modes live under `pumps`, the config blob
//!   under `pondctl`.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`,
//!   so a power cut leaves either the old or the new mode byte.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "pondctl";
const CONFIG_KEY: &str = "syscfg";
/// Upper bound of the postcard-encoded config blob.
const CONFIG_BLOB_CAP: usize = 512;

/// NVS keys and namespaces are at most 15 characters plus NUL.
#[cfg(target_os = "espidf")]
const NVS_NAME_CAP: usize = 16;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised, which resets both pumps to AUTO.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of an NVS name, truncated to 15 bytes.
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; NVS_NAME_CAP] {
        let mut buf = [0u8; NVS_NAME_CAP];
        let len = name.len().min(NVS_NAME_CAP - 1);
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        buf
    }

    /// Open an NVS namespace, run `f` with the handle, then close it.
    #[cfg(target_os = "espidf")]
    fn with_handle<T>(
        namespace: &str,
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    ) -> Result<T, esp_err_t> {
        let ns = Self::c_name(namespace);
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn commit(handle: nvs_handle_t) -> Result<(), esp_err_t> {
        let ret = unsafe { nvs_commit(handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn map_err(e: esp_err_t) -> StorageError {
        if e == ESP_ERR_NVS_NOT_FOUND {
            StorageError::NotFound
        } else if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
            StorageError::Full
        } else {
            StorageError::IoError
        }
    }
}

pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(-90.0..=90.0).contains(&cfg.latitude) {
        return Err(ConfigError::ValidationFailed("latitude must be -90..90"));
    }
    if !(-180.0..=180.0).contains(&cfg.longitude) {
        return Err(ConfigError::ValidationFailed("longitude must be -180..180"));
    }
    if !(-10.0..=15.0).contains(&cfg.frost_threshold_c) {
        return Err(ConfigError::ValidationFailed(
            "frost_threshold_c must be -10.0..15.0",
        ));
    }
    if cfg.extend_window_min > 720 {
        return Err(ConfigError::ValidationFailed(
            "extend_window_min must be 0..720",
        ));
    }
    if !(60_000..=86_400_000).contains(&cfg.temperature_refresh_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "temperature_refresh_interval_ms must be 1 min..24 h",
        ));
    }
    if !(1_000..=120_000).contains(&cfg.fetch_timeout_ms)
        || cfg.fetch_timeout_ms >= cfg.temperature_refresh_interval_ms
    {
        return Err(ConfigError::ValidationFailed(
            "fetch_timeout_ms must be 1..120 s and shorter than the refresh interval",
        ));
    }
    if cfg.temperature_max_age_ms < cfg.temperature_refresh_interval_ms {
        return Err(ConfigError::ValidationFailed(
            "temperature_max_age_ms must be >= the refresh interval",
        ));
    }
    if cfg.touch_debounce_ms > 5_000 {
        return Err(ConfigError::ValidationFailed(
            "touch_debounce_ms must be 0..5000",
        ));
    }
    if !(100..=60_000).contains(&cfg.tick_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "tick_interval_ms must be 100..60000",
        ));
    }
    if cfg.temperature_url.is_empty() || cfg.temperature_marker.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "temperature_url and temperature_marker must be set",
        ));
    }
    Ok(())
}

/// Decode and re-validate a stored blob. A blob that no longer passes
/// validation is as unusable as one that fails to decode.
fn decode_config(bytes: &[u8]) -> Result<SystemConfig, ConfigError> {
    let cfg = postcard::from_bytes::<SystemConfig>(bytes).map_err(|_| ConfigError::Corrupted)?;
    validate_config(&cfg).map_err(|e| {
        warn!("NvsAdapter: stored config rejected ({})", e);
        ConfigError::Corrupted
    })?;
    info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
    Ok(cfg)
}

impl NvsAdapter {
    /// Erase the stored config blob so the next boot starts from defaults.
    pub fn discard_config(&mut self) -> Result<(), StorageError> {
        self.delete(CONFIG_NAMESPACE, CONFIG_KEY)?;
        info!("NvsAdapter: stored config erased");
        Ok(())
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; CONFIG_BLOB_CAP];
        match self.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => decode_config(&buf[..len]),
            Err(StorageError::NotFound) => Err(ConfigError::NotFound),
            Err(StorageError::Full) => Err(ConfigError::StorageFull),
            Err(StorageError::IoError) => Err(ConfigError::IoError),
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > CONFIG_BLOB_CAP {
            return Err(ConfigError::StorageFull);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(CONFIG_KEY);
            let result = Self::with_handle(CONFIG_NAMESPACE, true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(handle, key.as_ptr() as *const _, bytes.as_ptr() as *const _, bytes.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Self::commit(handle)
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(ConfigError::StorageFull),
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_handle(namespace, false, |handle| {
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(handle, key.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            })
            .map_err(Self::map_err)
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_handle(namespace, true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(handle, key.as_ptr() as *const _, data.as_ptr() as *const _, data.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Self::commit(handle)
            })
            .map_err(Self::map_err)
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_erase_key(handle, key.as_ptr() as *const _) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                Self::commit(handle)
            })
            .map_err(Self::map_err)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_handle(namespace, false, |handle| {
                let ret =
                    unsafe { nvs_find_key(handle, key.as_ptr() as *const _, core::ptr::null_mut()) };
                Ok(ret == ESP_OK)
            })
            .unwrap_or(false)
        }
    }
}
