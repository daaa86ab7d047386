//! Wireless link trait

/// Association state of the wireless link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Not started yet
    Idle,
    /// Join in progress
    Connecting,
    /// Associated with an address
    Connected,
    /// Last join attempt failed; the keeper retries
    Failed,
}

/// Radio power management
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// Radio always on
    Performance,
    /// Radio sleeps between beacons
    PowerSave,
}

/// Errors from an outbound HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchError {
    /// Link is down
    NotConnected,
    /// Host name did not resolve
    Dns,
    /// TCP connection refused or reset
    Connect,
    /// Read or write failed mid-request
    Io,
    /// No complete response before the deadline
    Timeout,
    /// Response head could not be parsed
    BadResponse,
    /// Server answered with a non-2xx status
    Status(u16),
    /// Response did not fit in the buffer
    BufferTooSmall,
}

/// Shared handle to the wireless link
///
/// Held by the connectivity keeper and lent to `Connected` modes. All
/// methods take `&self`; the implementation forwards power changes to the
/// task that owns the radio and waits for it to apply them.
#[allow(async_fn_in_trait)]
pub trait Connectivity {
    /// Current association state
    fn state(&self) -> LinkState;

    /// Change radio power management
    ///
    /// Completes once the radio runs in `mode`.
    async fn set_power_mode(&self, mode: PowerMode);

    /// GET `path` from `host` over plain HTTP
    ///
    /// The full response is read into `buf`; returns the body slice of a
    /// 2xx response.
    async fn http_get<'b>(
        &self,
        host: &str,
        path: &str,
        buf: &'b mut [u8],
    ) -> Result<&'b [u8], FetchError>;

    /// True when associated
    fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }
}
