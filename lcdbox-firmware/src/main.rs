//! lcdbox - Networked LCD Display Firmware
//!
//! Runs on a Raspberry Pi Pico W driving a 320x240 ILI9341 TFT. Exactly one
//! display mode runs at a time; a host switches modes with a mode id sent
//! over USB serial or `GET /mode/<id>` over Wi-Fi.

#![no_std]
#![no_main]

use cyw43::{aligned_bytes, PowerManagementMode};
use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::*;
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, StackResources};
use embassy_rp::adc::{self, Adc, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::clocks::RoscRng;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{PIO0, SPI0, USB};
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_rp::spi::{self, Spi};
use embassy_rp::usb::{Driver, InterruptHandler as UsbInterruptHandler};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Delay, Instant, Timer};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State as CdcState};
use embassy_usb::{Builder, Config as UsbConfig};
use portable_atomic::Ordering;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use lcdbox_core::config::{parse_config, DeviceConfig, DEFAULT_BOOT_MODE};
use lcdbox_core::modes::{self, ModeKind};
use lcdbox_core::{Orchestrator, PersistentTask};
use lcdbox_display::{Ili9341, Orientation};

use crate::channels::{HTTP_REQUESTS, LINK_STATUS, SWITCHES};
use crate::link::WifiLink;
use crate::platform::PicoPlatform;

mod channels;
mod link;
mod platform;
mod tasks;

/// Embedded configuration (compiled into firmware)
/// Edit device.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../device.toml");

/// SPI clock for the panel
const DISPLAY_SPI_HZ: u32 = 40_000_000;

/// Sockets: DHCP, DNS, HTTP listener, one outbound fetch, plus headroom
const NET_SOCKETS: usize = 6;

pub type Orch = Orchestrator<CriticalSectionRawMutex, ModeKind>;

pub type Screen = Ili9341<
    Spi<'static, SPI0, spi::Blocking>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Delay,
>;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
    USBCTRL_IRQ => UsbInterruptHandler<USB>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

static ORCHESTRATOR: StaticCell<Orch> = StaticCell::new();
static LINK: StaticCell<WifiLink> = StaticCell::new();
static CYW43_STATE: StaticCell<cyw43::State> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<NET_SOCKETS>> = StaticCell::new();

// USB descriptor and control buffers (must live forever)
static USB_CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static CDC_STATE: StaticCell<CdcState> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("lcdbox firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Config: ssid='{}', http port {}, boot mode '{}'",
        config.wifi.ssid.as_str(),
        config.http.port,
        config.modes.boot.as_str()
    );

    // Display: SPI0, SCK=GP18 MOSI=GP19 CS=GP17 DC=GP20 RST=GP21 BL=GP22
    let mut spi_config = spi::Config::default();
    spi_config.frequency = DISPLAY_SPI_HZ;
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config);
    let mut display = Ili9341::new(
        spi,
        Output::new(p.PIN_20, Level::Low),
        Output::new(p.PIN_17, Level::High),
        Output::new(p.PIN_21, Level::High),
        Output::new(p.PIN_22, Level::Low),
        Delay,
        Orientation::Landscape,
    );
    match display.init() {
        Ok(()) => info!("Display initialized"),
        Err(e) => error!("Display init failed: {:?}", e),
    }

    // On-die temperature sensor for the status mode
    let adc = Adc::new(p.ADC, Irqs, adc::Config::default());
    let sensor = adc::Channel::new_temp_sensor(p.ADC_TEMP_SENSOR);
    let platform = PicoPlatform::new(adc, sensor);

    // Wi-Fi: CYW43439 over PIO SPI
    let fw = aligned_bytes!("../cyw43-firmware/43439A0.bin");
    let clm = include_bytes!("../cyw43-firmware/43439A0_clm.bin");
    let nvram = aligned_bytes!("../cyw43-firmware/nvram_rp2040.bin");

    let pwr = Output::new(p.PIN_23, Level::Low);
    let cs = Output::new(p.PIN_25, Level::High);
    let mut pio = Pio::new(p.PIO0, Irqs);
    let radio_spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        p.PIN_24,
        p.PIN_29,
        p.DMA_CH0,
    );

    let (net_device, mut control, runner) =
        cyw43::new(CYW43_STATE.init(cyw43::State::new()), pwr, radio_spi, fw, nvram).await;
    spawner.spawn(tasks::cyw43_task(runner)).unwrap();

    control.init(clm).await;
    control
        .set_power_management(PowerManagementMode::Performance)
        .await;
    info!("Radio initialized");

    let seed = RoscRng.next_u64();
    let (stack, net_runner) = embassy_net::new(
        net_device,
        NetConfig::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(tasks::net_task(net_runner)).unwrap();

    // USB CDC-ACM serial
    let driver = Driver::new(p.USB, Irqs);
    let mut usb_config = UsbConfig::new(0x2e8a, 0x000a);
    usb_config.manufacturer = Some("lcdbox");
    usb_config.product = Some("lcdbox display");
    usb_config.serial_number = Some("00000001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        driver,
        usb_config,
        USB_CONFIG_DESCRIPTOR.init([0; 256]),
        USB_BOS_DESCRIPTOR.init([0; 256]),
        &mut [],
        USB_CONTROL_BUF.init([0; 64]),
    );
    let serial = CdcAcmClass::new(&mut builder, CDC_STATE.init(CdcState::new()), 64);
    let usb = builder.build();
    spawner.spawn(tasks::usb_task(usb)).unwrap();

    // Orchestrator and mode slot
    let registry = unwrap!(modes::registry());
    info!("{} modes registered", registry.len());
    let orchestrator: &'static Orch = ORCHESTRATOR.init(Orchestrator::new(registry));
    let link: &'static WifiLink = LINK.init(WifiLink::new(stack, &LINK_STATUS));

    spawner
        .spawn(tasks::mode_slot_task(
            orchestrator,
            display,
            link,
            platform,
            config.fetch.clone(),
        ))
        .unwrap();

    // Persistent background tasks
    spawner
        .spawn(tasks::connectivity_task(control, stack, config.wifi.clone()))
        .unwrap();
    spawner
        .spawn(tasks::serial_input_task(
            orchestrator,
            serial,
            config.serial.poll_interval_ms,
        ))
        .unwrap();
    spawner
        .spawn(tasks::http_input_task(orchestrator, stack, config.http.port))
        .unwrap();

    for task in PersistentTask::ALL {
        if let Err(e) = orchestrator.register_persistent(task) {
            error!("Failed to register task {}: {:?}", task.name(), e);
        }
    }
    info!("All tasks spawned");

    let boot = config.modes.boot.as_str();
    if !orchestrator.switch_mode(boot).await {
        warn!("Boot mode '{}' unknown, using '{}'", boot, DEFAULT_BOOT_MODE);
        orchestrator.switch_mode(DEFAULT_BOOT_MODE).await;
    }

    // Heartbeat
    loop {
        Timer::after_secs(60).await;
        trace!(
            "Heartbeat: up {}s, mode {:?}, link {:?}, {} switches, {} HTTP requests",
            Instant::now().as_secs(),
            orchestrator.active_mode(),
            LINK_STATUS.state(),
            SWITCHES.load(Ordering::Relaxed),
            HTTP_REQUESTS.load(Ordering::Relaxed)
        );
    }
}

/// Parse the embedded device.toml, falling back to defaults
fn load_config() -> DeviceConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse device.toml: {:?}, using defaults", e);
            DeviceConfig::default()
        }
    };
    if let Err(e) = config.validate() {
        warn!("device.toml: {:?}", e);
    }
    config
}
