use chrono::NaiveDateTime;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Ticker};

use crate::clock::{to_unix_seconds, Clock, UptimeClock};

pub const TICK_QUEUE_SIZE: usize = 2;

pub type TickSender = Sender<'static, CriticalSectionRawMutex, NaiveDateTime, TICK_QUEUE_SIZE>;

/// Feeds the application one wall-clock timestamp per interval
#[embassy_executor::task]
pub async fn start(sender: TickSender, clock: UptimeClock, interval_ms: u64) {
    info!("Starting tick task");

    let mut ticker = Ticker::every(Duration::from_millis(interval_ms));

    loop {
        ticker.next().await;

        let now = clock.now();
        if sender.try_send(now).is_err() {
            // A backed-up loop only needs the latest tick
            debug!("Tick at {} skipped, queue full", to_unix_seconds(now));
        }
    }
}
