//! Companion link over BLE.
//!
//! The companion writes tuple dictionaries into the `location` characteristic
//! and is notified through `request` when the face wants a fresh fix.

use bt_hci::controller::ExternalController;
use config::{Resources, COMPANION_SERVICE_UUID};
use embassy_futures::{join::join, select::select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_time::Timer;
use error::Error;
use esp_hal::peripherals::BT;
use esp_wifi::{ble::controller::BleConnector, EspWifiController};
use service::CompanionService;
use trouble_host::prelude::*;

use crate::message::OutboundPayload;
use crate::transport::{payload, InboundEvent, TransportError};

mod config;
mod error;
mod service;

pub use config::Config;

pub const INBOX_QUEUE_SIZE: usize = 4;
pub const OUTBOX_QUEUE_SIZE: usize = 1;

/// Largest outbound dictionary the `request` characteristic carries
pub const REQUEST_SIZE: usize = 16;

pub type InboxSender = Sender<'static, CriticalSectionRawMutex, InboundEvent, INBOX_QUEUE_SIZE>;
pub type OutboxReceiver =
    Receiver<'static, CriticalSectionRawMutex, OutboundPayload, OUTBOX_QUEUE_SIZE>;

/// Application side of the link
pub struct Link {
    pub inbox: InboxSender,
    pub outbox: OutboxReceiver,
}

/// BLE stack and its connection state
pub struct Ble<'a, C: Controller> {
    config: Config,
    peripheral: Peripheral<'a, C>,
    server: Server<'a>,
    link: Link,
}

#[gatt_server]
pub struct Server {
    companion_service: CompanionService,
}

impl<'a, C: Controller> Ble<'a, C> {
    /// Create a new BLE instance
    ///
    /// * `peripheral` - The BLE peripheral interface
    /// * `config` - BLE configuration parameters
    /// * `link` - Channels shared with the application
    fn new(peripheral: Peripheral<'a, C>, config: Config, link: Link) -> Result<Self, Error> {
        let server = Server::new_with_config(GapConfig::Peripheral(PeripheralConfig {
            name: config.name,
            appearance: &appearance::outdoor_sports_activity::LOCATION_AND_NAVIGATION_POD,
        }))
        .map_err(|_| Error::GattError)?;

        Ok(Self {
            peripheral,
            server,
            config,
            link,
        })
    }

    /// Start the BLE service and handle connections asynchronously
    async fn start(stack: &'a Stack<'a, C>, config: Config, link: Link) -> Result<(), Error> {
        let Host {
            peripheral, runner, ..
        } = stack.build();

        let mut ble = Self::new(peripheral, config, link)?;

        join(
            ble_task(runner),
            async move { ble.run_connection_loop().await },
        )
        .await;

        Ok(())
    }

    /// Run the main BLE connection loop, handling advertising and events
    async fn run_connection_loop(&mut self) {
        loop {
            embassy_futures::yield_now().await;

            match advertise(self.config.name, &mut self.peripheral).await {
                Ok(conn) => {
                    info!("BLE connected");

                    select(self.gatt_events_task(&conn), self.request_task(&conn)).await;

                    // Handle disconnection regardless of which task exited
                    info!("BLE disconnected");
                }
                Err(_) => {
                    error!("Error establishing a BLE connection");
                    Timer::after_secs(1).await;
                }
            }
        }
    }

    /// Forward dictionaries written by the companion to the application
    async fn gatt_events_task(&self, conn: &Connection<'_>) -> Result<(), Error> {
        let location = &self.server.companion_service.location;

        loop {
            embassy_futures::yield_now().await;

            match conn.next().await {
                ConnectionEvent::Disconnected { reason: _ } => break,
                ConnectionEvent::Gatt { data } => match data.process(&self.server).await {
                    Ok(Some(event)) => {
                        let is_location_write = matches!(
                            &event,
                            GattEvent::Write(event) if event.handle() == location.handle
                        );

                        if let Ok(reply) = event.accept() {
                            reply.send().await;
                        }

                        if is_location_write {
                            self.forward_location(location);
                        }
                    }
                    Ok(_) => {}
                    Err(_) => {
                        self.forward(InboundEvent::Failed(TransportError::Delivery(0)));
                        break;
                    }
                },
            }
        }
        Ok(())
    }

    fn forward_location(&self, location: &Characteristic<[u8; crate::config::INBOUND_CAPACITY]>) {
        let event = match self.server.get(location) {
            Ok(value) => match payload(&value) {
                Ok(payload) => InboundEvent::Received(payload),
                Err(e) => InboundEvent::Failed(e),
            },
            Err(_) => InboundEvent::Failed(TransportError::Delivery(1)),
        };

        self.forward(event);
    }

    fn forward(&self, event: InboundEvent) {
        if self.link.inbox.try_send(event).is_err() {
            warn!("Inbox full, dropping inbound message");
        }
    }

    /// Notify the companion of every queued request
    async fn request_task(&self, conn: &Connection<'_>) -> Result<(), Error> {
        let request = self.server.companion_service.request;

        loop {
            let message = self.link.outbox.receive().await;

            if message.len() > REQUEST_SIZE {
                warn!("Request of {} bytes does not fit, dropping", message.len());
                continue;
            }

            let mut value = [0u8; REQUEST_SIZE];
            value[..message.len()].copy_from_slice(&message);

            if request.notify(&self.server, conn, &value).await.is_err() {
                break;
            }

            debug!("Request notified");
        }
        Ok(())
    }
}

/// Run the BLE host stack task
async fn ble_task<C: Controller>(mut runner: Runner<'_, C>) {
    loop {
        if let Err(e) = runner.run().await {
            error!("[ble_task] error: {:?}", defmt::Debug2Format(&e));
        }

        embassy_futures::yield_now().await;
    }
}

/// Advertise the BLE device for incoming connections
async fn advertise<'a, C: Controller>(
    name: &'a str,
    peripheral: &mut Peripheral<'a, C>,
) -> Result<Connection<'a>, BleHostError<C::Error>> {
    let mut advertiser_data = [0; 31];

    let adv_len = AdStructure::encode_slice(
        &[
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::ServiceUuids128(&[COMPANION_SERVICE_UUID.into()]),
        ],
        &mut advertiser_data[..],
    )?;

    let mut scan_data = [0; 31];
    let scan_len = AdStructure::encode_slice(
        &[AdStructure::ShortenedLocalName(name.as_bytes())],
        &mut scan_data[..],
    )?;

    let advertiser = peripheral
        .advertise(
            &Default::default(),
            Advertisement::ConnectableScannableUndirected {
                adv_data: &advertiser_data[..adv_len],
                scan_data: &scan_data[..scan_len],
            },
        )
        .await?;

    embassy_futures::yield_now().await;

    advertiser.accept().await
}

/// Initialize and start the BLE module (entry point for the BLE module)
#[embassy_executor::task]
pub async fn start(bt: BT, init: EspWifiController<'static>, config: Config, link: Link) {
    info!("starting BLE");
    let connector = BleConnector::new(&init, bt);

    let controller: ExternalController<_, 20> = ExternalController::new(connector);

    let mut resources = Resources::new();

    let stack = trouble_host::new(controller, &mut resources).set_random_address(config.address);

    if let Err(e) = Ble::start(&stack, config, link).await {
        error!("BLE stopped: {:?}", e);
    }
}
