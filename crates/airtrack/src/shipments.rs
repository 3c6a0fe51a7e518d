//! Shipment lifecycle management.
//!
//! The manager owns every shipment mutation: creation, replace-all-fields
//! updates, status transitions with their history entries, deletion with
//! cascade-unassignment, and tracking-code allocation. Operations that touch
//! both collections run under one lock guard so the two saves appear atomic
//! to other code in this process.
//!
//! History policy: every status write appends exactly one entry iff the
//! status actually changed. Unknown ids are a silent no-op (`Ok(None)` /
//! `Ok(false)`), never an error.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{self, Shipment, ShipmentStatus};
use crate::store::Store;

/// Fields for creating a shipment.
#[derive(Debug, Clone)]
pub struct NewShipment {
    /// Who sends the package.
    pub sender: String,
    /// Who receives the package.
    pub recipient: String,
    /// Origin location label.
    pub origin: String,
    /// Destination location label.
    pub destination: String,
    /// Weight in kilograms.
    pub weight: f64,
    /// Tracking code; allocated when `None`.
    pub code: Option<String>,
    /// Initial status; `Pending` when `None`.
    pub status: Option<ShipmentStatus>,
    /// Flight to link at creation. Unknown ids are cleared to none.
    pub flight_id: Option<String>,
}

/// Replacement values for every mutable shipment field.
#[derive(Debug, Clone)]
pub struct ShipmentUpdate {
    /// Who sends the package.
    pub sender: String,
    /// Who receives the package.
    pub recipient: String,
    /// Origin location label.
    pub origin: String,
    /// Destination location label.
    pub destination: String,
    /// Weight in kilograms.
    pub weight: f64,
    /// Tracking code. Uniqueness is not enforced on manual edits.
    pub code: String,
    /// New status; a change appends one history entry.
    pub status: ShipmentStatus,
    /// New flight link. Unknown ids are cleared to none.
    pub flight_id: Option<String>,
}

/// Manager for shipment records.
#[derive(Debug, Clone)]
pub struct ShipmentManager {
    store: Arc<Mutex<Store>>,
}

impl ShipmentManager {
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

    /// Create a new shipment.
    ///
    /// Allocates a fresh id, sets the creation timestamp to now, and opens
    /// the history with a single entry for the initial status. A missing
    /// code is allocated from the store (unique at generation time). When a
    /// known flight id is supplied the flight's assignment set is updated in
    /// the same guard.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn create(&self, new: NewShipment) -> Result<Shipment> {
        let store = self.store()?;
        let mut shipments = store.load_shipments()?;

        let code = match new.code {
            Some(code) => code,
            None => unused_code(&shipments),
        };
        let status = new.status.unwrap_or(ShipmentStatus::Pending);
        let mut shipment = Shipment::new(
            new.sender,
            new.recipient,
            new.origin,
            new.destination,
            new.weight,
            code,
            status,
        );

        if let Some(flight_id) = new.flight_id {
            let mut flights = store.load_flights()?;
            if let Some(flight) = flights.iter_mut().find(|f| f.id == flight_id) {
                flight.assign(&shipment.id);
                shipment.flight_id = Some(flight_id);
                store.save_flights(&flights)?;
            }
        }

        shipments.push(shipment.clone());
        store.save_shipments(&shipments)?;

        info!("Created shipment {} ({})", shipment.code, shipment.id);
        Ok(shipment)
    }

    /// Replace all mutable fields of a shipment.
    ///
    /// A status change appends one history entry; an unchanged status leaves
    /// the history untouched. Flight-link changes re-sync the assignment
    /// sets on both sides: the shipment is added to the linked flight's set
    /// and removed from every other. Returns `None` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn update(&self, id: &str, fields: ShipmentUpdate) -> Result<Option<Shipment>> {
        let store = self.store()?;
        let mut shipments = store.load_shipments()?;
        let Some(idx) = shipments.iter().position(|s| s.id == id) else {
            debug!("Update for unknown shipment {id}, ignoring");
            return Ok(None);
        };

        let mut flights = store.load_flights()?;
        let requested = fields
            .flight_id
            .filter(|fid| flights.iter().any(|f| &f.id == fid));

        {
            let shipment = &mut shipments[idx];
            shipment.sender = fields.sender;
            shipment.recipient = fields.recipient;
            shipment.origin = fields.origin;
            shipment.destination = fields.destination;
            shipment.weight = fields.weight;
            shipment.code = fields.code;
            shipment.set_status(fields.status);
            shipment.flight_id = requested.clone();

            for flight in &mut flights {
                if requested.as_deref() == Some(flight.id.as_str()) {
                    flight.assign(&shipment.id);
                } else {
                    flight.unassign(&shipment.id);
                }
            }
        }

        store.save_shipments(&shipments)?;
        store.save_flights(&flights)?;

        Ok(Some(shipments[idx].clone()))
    }

    /// Move a shipment to a new status.
    ///
    /// Appends one history entry iff the status actually changed. Returns
    /// `None` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn update_status(&self, id: &str, status: ShipmentStatus) -> Result<Option<Shipment>> {
        let store = self.store()?;
        let mut shipments = store.load_shipments()?;
        let Some(idx) = shipments.iter().position(|s| s.id == id) else {
            return Ok(None);
        };

        if shipments[idx].set_status(status) {
            debug!("Shipment {} -> {}", shipments[idx].code, status);
        }
        store.save_shipments(&shipments)?;

        Ok(Some(shipments[idx].clone()))
    }

    /// Delete a shipment.
    ///
    /// Cascades: the id is removed from every flight's assignment set.
    /// Returns `false` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let store = self.store()?;
        let mut shipments = store.load_shipments()?;
        let before = shipments.len();
        shipments.retain(|s| s.id != id);
        if shipments.len() == before {
            return Ok(false);
        }

        let mut flights = store.load_flights()?;
        for flight in &mut flights {
            flight.unassign(id);
        }

        store.save_shipments(&shipments)?;
        store.save_flights(&flights)?;

        info!("Deleted shipment {id}");
        Ok(true)
    }

    /// Allocate a tracking code unused by any stored shipment.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn allocate_code(&self) -> Result<String> {
        let store = self.store()?;
        Ok(unused_code(&store.load_shipments()?))
    }

    /// List all shipments.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn list(&self) -> Result<Vec<Shipment>> {
        self.store()?.load_shipments()
    }

    /// Find a shipment by id.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn find_by_id(&self, id: &str) -> Result<Option<Shipment>> {
        self.store()?.find_shipment_by_id(id)
    }

    /// Find a shipment by tracking code (case-insensitive exact match).
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn find_by_code(&self, code: &str) -> Result<Option<Shipment>> {
        self.store()?.find_shipment_by_code(code)
    }

    /// List shipments matching a search term and optional status filter.
    ///
    /// The term matches case-insensitively against sender, recipient, and
    /// code; an empty term matches everything.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn search(
        &self,
        term: &str,
        status: Option<ShipmentStatus>,
    ) -> Result<Vec<Shipment>> {
        let term = term.to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|s| {
                let matches_term = term.is_empty()
                    || [&s.sender, &s.recipient, &s.code]
                        .iter()
                        .any(|v| v.to_lowercase().contains(&term));
                let matches_status = status.map_or(true, |wanted| s.status == wanted);
                matches_term && matches_status
            })
            .collect())
    }
}

/// Draw tracking codes until one is unused among the given shipments.
fn unused_code(shipments: &[Shipment]) -> String {
    loop {
        let code = model::generate_code();
        if !shipments.iter().any(|s| s.code_matches(&code)) {
            return code;
        }
    }
}
