//! Board services used by modes

/// Timing, randomness and on-chip sensors
#[allow(async_fn_in_trait)]
pub trait Platform {
    /// Sleep for `ms` milliseconds
    async fn delay_ms(&mut self, ms: u32);

    /// Milliseconds since boot
    fn uptime_ms(&self) -> u64;

    /// Random 32-bit value
    fn random_u32(&mut self) -> u32;

    /// Die temperature with 0.1°C resolution, e.g. 271 = 27.1°C
    ///
    /// Returns `None` if the sensor could not be read.
    async fn temperature_c_x10(&mut self) -> Option<i16>;

    /// Short description of the board and firmware
    fn system_info(&self) -> &'static str;
}
