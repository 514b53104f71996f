use chrono::NaiveDateTime;

use crate::clock::to_unix_seconds;
use crate::location::staleness::{StaleReason, StalenessPolicy};
use crate::location::LocationState;
use crate::message::request_location;
use crate::transport::{Outbox, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Location is fresh, nothing sent
    Fresh,
    Requested(StaleReason),
    /// A request was due but the link refused it; the next tick tries again
    Dropped(StaleReason, TransportError),
}

/// Decides once per tick whether to ask the companion for a location.
///
/// There is no in-flight tracking: while the state stays stale, every tick
/// sends another request.
#[derive(Debug)]
pub struct RequestTrigger {
    policy: StalenessPolicy,
    sent: u32,
    dropped: u32,
}

impl RequestTrigger {
    pub fn new(policy: StalenessPolicy) -> Self {
        Self {
            policy,
            sent: 0,
            dropped: 0,
        }
    }

    /// Requests sent so far
    pub fn sent(&self) -> u32 {
        self.sent
    }

    /// Requests abandoned because the outbox was unavailable
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Sends a request regardless of staleness. Fire-and-forget.
    pub fn request_now<O: Outbox>(&mut self, outbox: &mut O) -> Result<(), TransportError> {
        let message = request_location().map_err(|_| TransportError::PayloadTooLarge)?;

        match outbox.send(&message) {
            Ok(()) => {
                self.sent += 1;
                debug!("Sending ping to app");
                Ok(())
            }
            Err(e) => {
                self.dropped += 1;
                warn!("Location request not sent: {:?}", e);
                Err(e)
            }
        }
    }

    pub fn on_tick<O: Outbox>(
        &mut self,
        state: &LocationState,
        now: NaiveDateTime,
        outbox: &mut O,
    ) -> TickOutcome {
        let Some(reason) = self.policy.check(state, now) else {
            trace!("Location fresh at {}", to_unix_seconds(now));
            return TickOutcome::Fresh;
        };

        match self.request_now(outbox) {
            Ok(()) => TickOutcome::Requested(reason),
            Err(e) => TickOutcome::Dropped(reason, e),
        }
    }
}

impl Default for RequestTrigger {
    fn default() -> Self {
        Self::new(StalenessPolicy::default())
    }
}
