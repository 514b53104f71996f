#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use esp_backtrace as _;
use esp_hal::{
    clock::CpuClock,
    delay::Delay,
    gpio::{Level, Output, OutputConfig},
    i2c::master::{Config as I2cConfig, I2c},
    rng::Rng,
    timer::timg::TimerGroup,
};
use esp_println as _;

use gridface::ble::{self, Link, INBOX_QUEUE_SIZE, OUTBOX_QUEUE_SIZE};
use gridface::clock::{from_unix_seconds, UptimeClock};
use gridface::display::device::DisplayDevice;
use gridface::message::OutboundPayload;
use gridface::ticker::{self, TICK_QUEUE_SIZE};
use gridface::transport::{ChannelOutbox, InboundEvent};
use gridface::{App, Config};

type Outbox = ChannelOutbox<'static, CriticalSectionRawMutex, OUTBOX_QUEUE_SIZE>;

static TICKS: Channel<CriticalSectionRawMutex, chrono::NaiveDateTime, TICK_QUEUE_SIZE> =
    Channel::new();
static INBOX: Channel<CriticalSectionRawMutex, InboundEvent, INBOX_QUEUE_SIZE> = Channel::new();
static OUTBOX: Channel<CriticalSectionRawMutex, OutboundPayload, OUTBOX_QUEUE_SIZE> =
    Channel::new();

/// No RTC on board; the companion only needs relative freshness
const BOOT_EPOCH_SECONDS: i64 = 0;

#[embassy_executor::task]
async fn run_app(app: App<Outbox, DisplayDevice<'static>, UptimeClock>) {
    app.run(TICKS.receiver(), INBOX.receiver()).await
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    defmt::info!("Initialising app");

    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));

    esp_alloc::heap_allocator!(72 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let wifi_init = match esp_wifi::init(
        timg0.timer0,
        Rng::new(peripherals.RNG),
        peripherals.RADIO_CLK,
    ) {
        Ok(init) => init,
        Err(e) => {
            defmt::error!("Radio init failed: {:?}", defmt::Debug2Format(&e));
            return;
        }
    };

    let timg1 = TimerGroup::new(peripherals.TIMG1);
    esp_hal_embassy::init(timg1.timer0);

    let i2c = match I2c::new(peripherals.I2C0, I2cConfig::default()) {
        Ok(i2c) => i2c
            .with_sda(peripherals.GPIO17)
            .with_scl(peripherals.GPIO18)
            .into_async(),
        Err(e) => {
            defmt::error!("I2C init failed: {:?}", defmt::Debug2Format(&e));
            return;
        }
    };
    let oled_rst = Output::new(peripherals.GPIO21, Level::High, OutputConfig::default());

    let display = match DisplayDevice::new(i2c, oled_rst, &mut Delay::new()) {
        Ok(display) => display,
        Err(e) => {
            defmt::error!("Display init failed: {:?}", e);
            return;
        }
    };

    let config = Config::default();
    let clock = UptimeClock::new(from_unix_seconds(BOOT_EPOCH_SECONDS));
    let app = App::new(&config, ChannelOutbox::new(OUTBOX.sender()), display, clock);

    let link = Link {
        inbox: INBOX.sender(),
        outbox: OUTBOX.receiver(),
    };

    let tick_clock = UptimeClock::new(from_unix_seconds(BOOT_EPOCH_SECONDS));

    spawner.must_spawn(ble::start(peripherals.BT, wifi_init, ble::Config::from(&config), link));
    spawner.must_spawn(ticker::start(TICKS.sender(), tick_clock, config.tick_interval_ms));
    spawner.must_spawn(run_app(app));

    defmt::info!("Initialisation complete");
}
