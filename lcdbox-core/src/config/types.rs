//! Configuration type definitions

use heapless::String;
use lcdbox_protocol::MAX_MODE_ID_LEN;

/// Maximum SSID length (802.11)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA2 passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// Maximum host name length for outbound requests
pub const MAX_HOST_LEN: usize = 64;

/// Maximum request path length for outbound requests
pub const MAX_PATH_LEN: usize = 96;

/// Mode booted into when nothing else is configured
pub const DEFAULT_BOOT_MODE: &str = "idle";

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `[wifi] ssid` is empty
    MissingSsid,
    /// An interval or timeout is zero
    ZeroInterval,
    /// `[http] port` is zero
    InvalidPort,
    /// `[modes] boot` is empty
    MissingBootMode,
    /// A fetch host or path is empty
    MissingEndpoint,
}

/// Wireless network settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WifiConfig {
    pub ssid: String<MAX_SSID_LEN>,
    pub password: String<MAX_PASSWORD_LEN>,
    /// Seconds between link checks
    pub reconnect_interval_s: u32,
    /// Seconds allowed for a single join attempt
    pub join_timeout_s: u32,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            reconnect_interval_s: 5,
            join_timeout_s: 30,
        }
    }
}

/// Mode-switch HTTP listener settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HttpConfig {
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { port: 80 }
    }
}

/// Serial listener settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Back-off while the USB host is not connected
    pub poll_interval_ms: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

/// Mode selection settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModesConfig {
    /// Mode switched to at boot
    pub boot: String<MAX_MODE_ID_LEN>,
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            boot: fixed(DEFAULT_BOOT_MODE),
        }
    }
}

/// Outbound data sources for the jokes and currency modes
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FetchConfig {
    /// Deadline for one request, connect to last byte
    pub timeout_s: u32,
    pub jokes_host: String<MAX_HOST_LEN>,
    pub jokes_path: String<MAX_PATH_LEN>,
    pub rates_host: String<MAX_HOST_LEN>,
    /// Prefix; the asset id is appended
    pub rates_path: String<MAX_PATH_LEN>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_s: 10,
            jokes_host: fixed("v2.jokeapi.dev"),
            jokes_path: fixed("/joke/Any?safe-mode"),
            rates_host: fixed("api.coincap.io"),
            rates_path: fixed("/v2/rates/"),
        }
    }
}

impl FetchConfig {
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_s.saturating_mul(1000)
    }
}

/// Complete device configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub wifi: WifiConfig,
    pub http: HttpConfig,
    pub serial: SerialConfig,
    pub modes: ModesConfig,
    pub fetch: FetchConfig,
}

impl DeviceConfig {
    /// Check values the firmware cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wifi.ssid.is_empty() {
            return Err(ConfigError::MissingSsid);
        }
        if self.wifi.reconnect_interval_s == 0
            || self.wifi.join_timeout_s == 0
            || self.serial.poll_interval_ms == 0
            || self.fetch.timeout_s == 0
        {
            return Err(ConfigError::ZeroInterval);
        }
        if self.http.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.modes.boot.is_empty() {
            return Err(ConfigError::MissingBootMode);
        }
        if self.fetch.jokes_host.is_empty()
            || self.fetch.jokes_path.is_empty()
            || self.fetch.rates_host.is_empty()
            || self.fetch.rates_path.is_empty()
        {
            return Err(ConfigError::MissingEndpoint);
        }
        Ok(())
    }
}

/// Copy a literal known to fit
fn fixed<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    let _ = out.push_str(s);
    out
}
