//! Board services for modes on the Pico W

use defmt::*;
use embassy_rp::adc::{self, Adc};
use embassy_rp::clocks::RoscRng;
use embassy_time::{Instant, Timer};

use lcdbox_core::traits::Platform;

/// ADC reference in microvolts
const VREF_UV: i64 = 3_300_000;
/// Sensor voltage at 27°C
const SENSOR_UV_AT_27C: i64 = 706_000;
/// Sensor slope in microvolts per °C
const SENSOR_UV_PER_C: i64 = 1_721;

/// Convert a raw 12-bit temperature sensor reading to 0.1°C
///
/// Uses the RP2040 datasheet formula `T = 27 - (V - 0.706) / 0.001721`.
pub fn raw_to_deci_celsius(raw: u16) -> i16 {
    let uv = i64::from(raw) * VREF_UV / 4096;
    let deci = 270 - (uv - SENSOR_UV_AT_27C) * 10 / SENSOR_UV_PER_C;
    deci.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

/// Timer, ring oscillator RNG and on-die temperature sensor
pub struct PicoPlatform {
    adc: Adc<'static, adc::Async>,
    sensor: adc::Channel<'static>,
    rng: RoscRng,
}

impl PicoPlatform {
    pub fn new(adc: Adc<'static, adc::Async>, sensor: adc::Channel<'static>) -> Self {
        Self {
            adc,
            sensor,
            rng: RoscRng,
        }
    }
}

impl Platform for PicoPlatform {
    async fn delay_ms(&mut self, ms: u32) {
        Timer::after_millis(u64::from(ms)).await;
    }

    fn uptime_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    fn random_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    async fn temperature_c_x10(&mut self) -> Option<i16> {
        match self.adc.read(&mut self.sensor).await {
            Ok(raw) => Some(raw_to_deci_celsius(raw)),
            Err(e) => {
                warn!("Temperature read failed: {:?}", e);
                None
            }
        }
    }

    fn system_info(&self) -> &'static str {
        concat!("Pico W v", env!("CARGO_PKG_VERSION"))
    }
}
