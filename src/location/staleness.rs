use chrono::{NaiveDateTime, TimeDelta};

use super::LocationState;
use crate::config::STALE_SECONDS;

/// Why a refresh is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StaleReason {
    /// Grid reference is empty or still the space-filled placeholder
    NoReference,
    /// Nothing has been received for longer than the threshold
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    stale_after: TimeDelta,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(STALE_SECONDS))
    }
}

impl StalenessPolicy {
    pub fn new(stale_after: TimeDelta) -> Self {
        Self { stale_after }
    }

    /// The grid reference is the last field of a batch, so it stands in for
    /// the whole tuple. A state never updated counts as updated at the epoch.
    pub fn check(&self, state: &LocationState, now: NaiveDateTime) -> Option<StaleReason> {
        if state.grid_reference.is_empty() || state.grid_reference.starts_with(' ') {
            return Some(StaleReason::NoReference);
        }

        let last_response = state.last_response.unwrap_or_default();

        match last_response.checked_add_signed(self.stale_after) {
            Some(deadline) if deadline < now => Some(StaleReason::Expired),
            _ => None,
        }
    }

    pub fn is_stale(&self, state: &LocationState, now: NaiveDateTime) -> bool {
        self.check(state, now).is_some()
    }
}

/// [`StalenessPolicy::is_stale`] with the default threshold
pub fn is_stale(state: &LocationState, now: NaiveDateTime) -> bool {
    StalenessPolicy::default().is_stale(state, now)
}
