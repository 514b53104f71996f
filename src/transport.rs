use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Sender, TrySendError};
use heapless::Vec;

use crate::config::INBOUND_CAPACITY;
use crate::message::OutboundPayload;

/// Raw inbound dictionary as delivered by the link
pub type Payload = Vec<u8, INBOUND_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The link cannot take an outbound message right now
    OutboxUnavailable,
    /// Payload does not fit the bounded message buffer
    PayloadTooLarge,
    /// Inbound decode or delivery failure reported by the link
    Delivery(u16),
}

/// What the link hands to the application
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Received(Payload),
    Failed(TransportError),
}

/// Outbound half of the companion link. Sends never block.
pub trait Outbox {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}

impl<O: Outbox + ?Sized> Outbox for &mut O {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        (**self).send(payload)
    }
}

/// Copies received bytes into a bounded payload, refusing anything larger
pub fn payload(bytes: &[u8]) -> Result<Payload, TransportError> {
    Payload::from_slice(bytes).map_err(|_| TransportError::PayloadTooLarge)
}

/// Outbox feeding a channel drained by the link task
pub struct ChannelOutbox<'a, M: RawMutex, const N: usize> {
    sender: Sender<'a, M, OutboundPayload, N>,
}

impl<'a, M: RawMutex, const N: usize> ChannelOutbox<'a, M, N> {
    pub fn new(sender: Sender<'a, M, OutboundPayload, N>) -> Self {
        Self { sender }
    }
}

impl<M: RawMutex, const N: usize> Outbox for ChannelOutbox<'_, M, N> {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let message =
            OutboundPayload::from_slice(payload).map_err(|_| TransportError::PayloadTooLarge)?;

        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::OutboxUnavailable,
        })
    }
}
