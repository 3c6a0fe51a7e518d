//! Domain records for airtrack.
//!
//! This module defines the shipment and flight records, the shipment status
//! lifecycle, and the tracking-code format. Field names on the wire keep the
//! camelCase layout of the persisted JSON collections, so an existing
//! database remains readable across versions of the tool.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alphabet for generated tracking codes.
///
/// 32 symbols; visually ambiguous characters (0/O, 1/I/L) are excluded.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Prefix carried by every tracking code.
pub const CODE_PREFIX: &str = "HM-";

/// Number of random characters after the prefix.
pub const CODE_LEN: usize = 6;

/// Lifecycle status of a shipment.
///
/// Serialized as the human-readable strings `"Pending"`, `"In Transit"` and
/// `"Delivered"` used by the persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentStatus {
    /// Created but not yet on a flight.
    Pending,
    /// On its way.
    #[serde(rename = "In Transit")]
    InTransit,
    /// Arrived at the recipient.
    Delivered,
}

impl ShipmentStatus {
    /// The next status one step along Pending → In Transit → Delivered.
    ///
    /// Returns `None` for `Delivered`, which is terminal.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::InTransit),
            Self::InTransit => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::InTransit => write!(f, "In Transit"),
            Self::Delivered => write!(f, "Delivered"),
        }
    }
}

/// A single entry in a shipment's status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The status the shipment entered.
    pub status: ShipmentStatus,
    /// When the transition happened.
    pub at: DateTime<Utc>,
}

/// A trackable package record.
///
/// The history is append-only and never empty: the first entry is written at
/// creation and every later status change adds exactly one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    /// Opaque unique identifier.
    pub id: String,
    /// Who sent the package.
    pub sender: String,
    /// Who receives the package.
    pub recipient: String,
    /// Free-text origin location label.
    pub origin: String,
    /// Free-text destination location label.
    pub destination: String,
    /// Weight in kilograms.
    pub weight: f64,
    /// Human-enterable tracking code (`HM-XXXXXX`).
    pub code: String,
    /// Current lifecycle status.
    pub status: ShipmentStatus,
    /// Identifier of the flight carrying this shipment, if assigned.
    pub flight_id: Option<String>,
    /// When the shipment record was created.
    pub created_at: DateTime<Utc>,
    /// Ordered, append-only status history.
    pub history: Vec<HistoryEntry>,
}

impl Shipment {
    /// Create a new shipment with a fresh id, a creation timestamp of now,
    /// and a single opening history entry for the given status.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        weight: f64,
        code: impl Into<String>,
        status: ShipmentStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            sender: sender.into(),
            recipient: recipient.into(),
            origin: origin.into(),
            destination: destination.into(),
            weight,
            code: code.into(),
            status,
            flight_id: None,
            created_at: now,
            history: vec![HistoryEntry { status, at: now }],
        }
    }

    /// Move the shipment to a new status, appending one history entry.
    ///
    /// Does nothing and returns `false` when the status is unchanged, so the
    /// history never records a transition that didn't happen.
    pub fn set_status(&mut self, status: ShipmentStatus) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.history.push(HistoryEntry {
            status,
            at: Utc::now(),
        });
        true
    }

    /// Check whether this shipment's code matches, ignoring ASCII case.
    #[must_use]
    pub fn code_matches(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code)
    }
}

/// A scheduled transport leg that can carry zero or more shipments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    /// Opaque unique identifier.
    pub id: String,
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
    /// Identifiers of assigned shipments. No duplicates; order irrelevant.
    pub assigned_shipment_ids: Vec<String>,
}

impl Flight {
    /// Create a new flight with a fresh id and no assigned shipments.
    #[must_use]
    pub fn new(
        number: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        etd: DateTime<Utc>,
        eta: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_record_id(),
            number: number.into(),
            origin: origin.into(),
            destination: destination.into(),
            etd,
            eta,
            assigned_shipment_ids: Vec::new(),
        }
    }

    /// Add a shipment id to the assignment set.
    ///
    /// Idempotent; returns `false` if the id was already present.
    pub fn assign(&mut self, shipment_id: &str) -> bool {
        if self.is_assigned(shipment_id) {
            return false;
        }
        self.assigned_shipment_ids.push(shipment_id.to_string());
        true
    }

    /// Remove a shipment id from the assignment set.
    ///
    /// Returns `false` if the id was not present.
    pub fn unassign(&mut self, shipment_id: &str) -> bool {
        let before = self.assigned_shipment_ids.len();
        self.assigned_shipment_ids.retain(|id| id != shipment_id);
        self.assigned_shipment_ids.len() != before
    }

    /// Check whether a shipment id is in the assignment set.
    #[must_use]
    pub fn is_assigned(&self, shipment_id: &str) -> bool {
        self.assigned_shipment_ids.iter().any(|id| id == shipment_id)
    }

    /// Whether the flight is in the air at the given instant.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.etd <= now && now <= self.eta
    }
}

/// Allocate a fresh opaque record identifier.
#[must_use]
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a random tracking code in the `HM-XXXXXX` format.
///
/// Characters are drawn uniformly with replacement from [`CODE_ALPHABET`].
/// The result is *not* checked for collisions against existing shipments;
/// callers that need generation-time uniqueness retry against the store.
#[must_use]
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{CODE_PREFIX}{suffix}")
}

/// Check whether a string has the generated-code shape: `HM-` followed by
/// six characters from the restricted alphabet.
///
/// Manually entered codes are allowed to fall outside this shape.
#[must_use]
pub fn is_generated_code(code: &str) -> bool {
    code.strip_prefix(CODE_PREFIX).is_some_and(|suffix| {
        suffix.len() == CODE_LEN && suffix.bytes().all(|b| CODE_ALPHABET.contains(&b))
    })
}
