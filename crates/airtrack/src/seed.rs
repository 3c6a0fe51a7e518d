//! First-run sample data.
//!
//! When a collection slot has never been written, the store can populate it
//! with this fixed set of three shipments and two flights so a fresh install
//! has something to list and track. This is a configuration default
//! (`seed.enabled`), not required behavior.

use chrono::{DateTime, Duration, Utc};

use crate::model::{Flight, HistoryEntry, Shipment, ShipmentStatus};

/// The three sample shipments.
#[must_use]
pub fn default_shipments() -> Vec<Shipment> {
    let mut in_transit = Shipment::new(
        "H&M London Warehouse",
        "H&M NYC Flagship",
        "LHR",
        "JFK",
        120.5,
        "HM-1A2B3C",
        ShipmentStatus::Pending,
    );
    in_transit.created_at = days_ago(5);
    in_transit.history = vec![HistoryEntry {
        status: ShipmentStatus::Pending,
        at: days_ago(5),
    }];
    in_transit.set_status(ShipmentStatus::InTransit);
    backdate_last(&mut in_transit, days_ago(4));

    let mut pending = Shipment::new(
        "H&M Stockholm DC",
        "H&M Milan Store",
        "ARN",
        "MXP",
        64.2,
        "HM-4D5E6F",
        ShipmentStatus::Pending,
    );
    pending.created_at = days_ago(2);
    pending.history = vec![HistoryEntry {
        status: ShipmentStatus::Pending,
        at: days_ago(2),
    }];

    let mut delivered = Shipment::new(
        "H&M Berlin Depot",
        "H&M Paris Champs-Élysées",
        "TXL",
        "CDG",
        78.3,
        "HM-7G8H9I",
        ShipmentStatus::Pending,
    );
    delivered.created_at = days_ago(7);
    delivered.history = vec![HistoryEntry {
        status: ShipmentStatus::Pending,
        at: days_ago(7),
    }];
    delivered.set_status(ShipmentStatus::InTransit);
    backdate_last(&mut delivered, days_ago(6));
    delivered.set_status(ShipmentStatus::Delivered);
    backdate_last(&mut delivered, days_ago(5));

    vec![in_transit, pending, delivered]
}

/// The two sample flights.
#[must_use]
pub fn default_flights() -> Vec<Flight> {
    vec![
        Flight::new("HM412", "LHR", "JFK", hours_from_now(-2), hours_from_now(4)),
        Flight::new("HM205", "ARN", "MXP", hours_from_now(6), hours_from_now(9)),
    ]
}

fn days_ago(d: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(d)
}

fn hours_from_now(h: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(h)
}

fn backdate_last(shipment: &mut Shipment, at: DateTime<Utc>) {
    if let Some(entry) = shipment.history.last_mut() {
        entry.at = at;
    }
}
