//! `airtrack` - Shipment and flight tracking with a persisted record store
//!
//! This library provides the core functionality for managing shipment records
//! with append-only status histories, flight schedules with bidirectional
//! shipment assignments, and a polling tracker that simulates status
//! progression.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod flights;
pub mod logging;
pub mod model;
pub mod seed;
pub mod shipments;
pub mod store;
pub mod tracker;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{Flight, HistoryEntry, Shipment, ShipmentStatus};
pub use store::{Collection, Store, StoreStats};
