//! Single-threaded event loop tying the pieces together.
//!
//! Ticks and inbound messages arrive on two channels and are handled one at a
//! time, so the store needs no locking.

use chrono::NaiveDateTime;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;

use crate::clock::{to_unix_seconds, Clock};
use crate::config::Config;
use crate::display::{PresentationAdapter, Screen};
use crate::location::merger::{MergeReport, UpdateMerger};
use crate::location::staleness::StalenessPolicy;
use crate::location::{LocationState, LocationStore};
use crate::transport::{InboundEvent, Outbox};
use crate::trigger::{RequestTrigger, TickOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Timer tick carrying the wall-clock time it fired at
    Tick(NaiveDateTime),
    Inbound(InboundEvent),
}

/// What handling one event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Tick(TickOutcome),
    Merged(MergeReport),
    /// Inbound batch or delivery failed; `applied` fields were kept
    InboundFailed { applied: u8 },
}

pub struct App<O: Outbox, S: Screen, C: Clock> {
    store: LocationStore<PresentationAdapter<S>>,
    merger: UpdateMerger,
    trigger: RequestTrigger,
    outbox: O,
    clock: C,
}

impl<O: Outbox, S: Screen, C: Clock> App<O, S, C> {
    pub fn new(config: &Config, outbox: O, screen: S, clock: C) -> Self {
        let adapter = PresentationAdapter::new(screen, config.initial_text);

        Self {
            store: LocationStore::new(adapter),
            merger: UpdateMerger::new(),
            trigger: RequestTrigger::new(StalenessPolicy::new(config.stale_after)),
            outbox,
            clock,
        }
    }

    /// Shows the placeholders and asks for a location straight away
    pub fn start(&mut self) {
        info!("Starting location sync");

        self.store.refresh();

        // Failure here is left to the first stale tick
        let _ = self.trigger.request_now(&mut self.outbox);
    }

    pub fn handle(&mut self, event: Event) -> Handled {
        match event {
            Event::Tick(now) => {
                let outcome = self.trigger.on_tick(self.store.state(), now, &mut self.outbox);
                Handled::Tick(outcome)
            }
            Event::Inbound(InboundEvent::Received(payload)) => {
                let now = self.clock.now();

                match self.merger.merge(&mut self.store, &payload, now) {
                    Ok(report) => {
                        debug!(
                            "Merged {} fields ({} ignored) at {}",
                            report.applied,
                            report.ignored,
                            to_unix_seconds(now)
                        );
                        Handled::Merged(report)
                    }
                    Err(failure) => {
                        error!(
                            "App Message Sync Error: {:?} after {} fields",
                            failure.error, failure.report.applied
                        );
                        Handled::InboundFailed {
                            applied: failure.report.applied,
                        }
                    }
                }
            }
            Event::Inbound(InboundEvent::Failed(e)) => {
                error!("App Message Sync Error: {:?}", e);
                Handled::InboundFailed { applied: 0 }
            }
        }
    }

    /// Waits for the next tick or inbound message and handles it
    pub async fn step<M: RawMutex, const T: usize, const I: usize>(
        &mut self,
        ticks: &Receiver<'_, M, NaiveDateTime, T>,
        inbox: &Receiver<'_, M, InboundEvent, I>,
    ) -> Handled {
        let event = match select(ticks.receive(), inbox.receive()).await {
            Either::First(now) => Event::Tick(now),
            Either::Second(inbound) => Event::Inbound(inbound),
        };

        self.handle(event)
    }

    pub async fn run<M: RawMutex, const T: usize, const I: usize>(
        mut self,
        ticks: Receiver<'_, M, NaiveDateTime, T>,
        inbox: Receiver<'_, M, InboundEvent, I>,
    ) -> ! {
        self.start();

        loop {
            self.step(&ticks, &inbox).await;
        }
    }

    pub fn state(&self) -> &LocationState {
        self.store.state()
    }

    pub fn screen(&self) -> &S {
        self.store.presenter().screen()
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn trigger(&self) -> &RequestTrigger {
        &self.trigger
    }
}
