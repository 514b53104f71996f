//! Location sync core for a single-screen watch face.
//!
//! A paired companion app resolves the location and sends it back field by
//! field. The face requests a refresh once a second whenever the grid
//! reference is missing or nothing has arrived for a while.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

// Must come first so the logging macros are visible in every module below
#[macro_use]
mod fmt;

pub mod app;
pub mod clock;
pub mod config;
pub mod display;
pub mod location;
pub mod message;
pub mod transport;
pub mod trigger;

#[cfg(feature = "esp32")]
pub mod ble;
#[cfg(feature = "esp32")]
pub mod ticker;

pub use app::{App, Event, Handled};
pub use config::Config;
pub use location::staleness::is_stale;
pub use location::{Field, LocationState, LocationStore};
