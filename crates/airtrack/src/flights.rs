//! Flight and assignment management.
//!
//! The manager owns flight CRUD plus the bidirectional shipment↔flight link:
//! for every shipment with a flight link, that flight's assignment set
//! contains the shipment's id, and every operation here preserves that
//! invariant. Assignment changes also run the status policy below.
//!
//! Unknown ids are a silent no-op, never an error.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Flight, Shipment, ShipmentStatus};
use crate::store::Store;

/// Fields for creating a flight.
#[derive(Debug, Clone)]
pub struct NewFlight {
    /// Flight number, e.g. `HM412`.
    pub number: String,
    /// Origin location code.
    pub origin: String,
    /// Destination location code.
    pub destination: String,
    /// Estimated time of departure.
    pub etd: DateTime<Utc>,
    /// Estimated time of arrival.
    pub eta: DateTime<Utc>,
}

/// Replacement values for every mutable flight field.
///
/// The assignment set is not part of an update; it changes only through
/// [`FlightManager::assign`] and [`FlightManager::unassign`].
#[derive(Debug, Clone)]
pub struct FlightUpdate {
    /// Flight number.
    pub number: String,
    /// Origin location code.
    pub origin: String,
    /// Destination location code.
    pub destination: String,
    /// Estimated time of departure.
    pub etd: DateTime<Utc>,
    /// Estimated time of arrival.
    pub eta: DateTime<Utc>,
}

/// Direction of an assignment change, for the status policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentChange {
    /// The shipment was put on a flight.
    Assigned,
    /// The shipment was taken off a flight.
    Unassigned,
}

/// Status coupling applied on interactive assignment changes.
///
/// Assigning promotes a Pending shipment to In Transit; unassigning demotes
/// any non-Delivered shipment back to Pending. Other statuses are left
/// alone. History entries follow the usual append-iff-changed rule.
pub fn apply_assignment_policy(shipment: &mut Shipment, change: AssignmentChange) {
    match change {
        AssignmentChange::Assigned if shipment.status == ShipmentStatus::Pending => {
            shipment.set_status(ShipmentStatus::InTransit);
        }
        AssignmentChange::Unassigned if shipment.status != ShipmentStatus::Delivered => {
            shipment.set_status(ShipmentStatus::Pending);
        }
        _ => {}
    }
}

/// Manager for flight records and shipment assignments.
#[derive(Debug, Clone)]
pub struct FlightManager {
    store: Arc<Mutex<Store>>,
}

impl FlightManager {
    /// Create a manager over the shared store.
    #[must_use]
    pub fn new(store: Arc<Mutex<Store>>) -> Self {
        Self { store }
    }

    fn store(&self) -> Result<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| Error::internal("store lock poisoned"))
    }

    /// Create a new flight with an empty assignment set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchedule`] if the departure is not strictly
    /// before the arrival, or an error if a store operation fails.
    pub fn create(&self, new: NewFlight) -> Result<Flight> {
        validate_schedule(&new.number, new.etd, new.eta)?;

        let store = self.store()?;
        let mut flights = store.load_flights()?;
        let flight = Flight::new(new.number, new.origin, new.destination, new.etd, new.eta);
        flights.push(flight.clone());
        store.save_flights(&flights)?;

        info!("Created flight {} ({})", flight.number, flight.id);
        Ok(flight)
    }

    /// Replace all mutable fields of a flight.
    ///
    /// Returns `None` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchedule`] if the departure is not strictly
    /// before the arrival, or an error if a store operation fails.
    pub fn update(&self, id: &str, fields: FlightUpdate) -> Result<Option<Flight>> {
        validate_schedule(&fields.number, fields.etd, fields.eta)?;

        let store = self.store()?;
        let mut flights = store.load_flights()?;
        let Some(flight) = flights.iter_mut().find(|f| f.id == id) else {
            debug!("Update for unknown flight {id}, ignoring");
            return Ok(None);
        };

        flight.number = fields.number;
        flight.origin = fields.origin;
        flight.destination = fields.destination;
        flight.etd = fields.etd;
        flight.eta = fields.eta;
        let updated = flight.clone();

        store.save_flights(&flights)?;
        Ok(Some(updated))
    }

    /// Delete a flight.
    ///
    /// Cascades: every shipment that referenced the flight has its link
    /// cleared to none. Returns `false` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let store = self.store()?;
        let mut flights = store.load_flights()?;
        let before = flights.len();
        flights.retain(|f| f.id != id);
        if flights.len() == before {
            return Ok(false);
        }

        let mut shipments = store.load_shipments()?;
        for shipment in &mut shipments {
            if shipment.flight_id.as_deref() == Some(id) {
                shipment.flight_id = None;
            }
        }

        store.save_flights(&flights)?;
        store.save_shipments(&shipments)?;

        info!("Deleted flight {id}");
        Ok(true)
    }

    /// Put a shipment on a flight.
    ///
    /// Sets the shipment's flight link, adds its id to the flight's
    /// assignment set (idempotent), and applies the status policy. A no-op
    /// returning `false` if either id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn assign(&self, shipment_id: &str, flight_id: &str) -> Result<bool> {
        let store = self.store()?;
        let mut shipments = store.load_shipments()?;
        let mut flights = store.load_flights()?;

        let Some(si) = shipments.iter().position(|s| s.id == shipment_id) else {
            debug!("Assign with unknown shipment {shipment_id}, ignoring");
            return Ok(false);
        };
        let Some(fi) = flights.iter().position(|f| f.id == flight_id) else {
            debug!("Assign with unknown flight {flight_id}, ignoring");
            return Ok(false);
        };

        shipments[si].flight_id = Some(flight_id.to_string());
        flights[fi].assign(shipment_id);
        apply_assignment_policy(&mut shipments[si], AssignmentChange::Assigned);

        store.save_shipments(&shipments)?;
        store.save_flights(&flights)?;

        info!(
            "Assigned shipment {} to flight {}",
            shipments[si].code, flights[fi].number
        );
        Ok(true)
    }

    /// Take a shipment off a flight.
    ///
    /// Clears the shipment's link only if it currently equals `flight_id`;
    /// removes the id from the flight's assignment set unconditionally; then
    /// applies the status policy. A no-op returning `false` if either id is
    /// unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn unassign(&self, shipment_id: &str, flight_id: &str) -> Result<bool> {
        let store = self.store()?;
        let mut shipments = store.load_shipments()?;
        let mut flights = store.load_flights()?;

        let Some(si) = shipments.iter().position(|s| s.id == shipment_id) else {
            debug!("Unassign with unknown shipment {shipment_id}, ignoring");
            return Ok(false);
        };
        let Some(fi) = flights.iter().position(|f| f.id == flight_id) else {
            debug!("Unassign with unknown flight {flight_id}, ignoring");
            return Ok(false);
        };

        if shipments[si].flight_id.as_deref() == Some(flight_id) {
            shipments[si].flight_id = None;
        }
        flights[fi].unassign(shipment_id);
        apply_assignment_policy(&mut shipments[si], AssignmentChange::Unassigned);

        store.save_shipments(&shipments)?;
        store.save_flights(&flights)?;

        info!(
            "Unassigned shipment {} from flight {}",
            shipments[si].code, flights[fi].number
        );
        Ok(true)
    }

    /// List all flights.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn list(&self) -> Result<Vec<Flight>> {
        self.store()?.load_flights()
    }

    /// Find a flight by id.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn find_by_id(&self, id: &str) -> Result<Option<Flight>> {
        self.store()?.find_flight_by_id(id)
    }

    /// List flights in the air at the given instant.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn active(&self, now: DateTime<Utc>) -> Result<Vec<Flight>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|f| f.is_active(now))
            .collect())
    }
}

fn validate_schedule(number: &str, etd: DateTime<Utc>, eta: DateTime<Utc>) -> Result<()> {
    if etd >= eta {
        return Err(Error::invalid_schedule(format!(
            "flight {number}: departure {etd} must be before arrival {eta}"
        )));
    }
    Ok(())
}
