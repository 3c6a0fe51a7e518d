//! Record store for airtrack.
//!
//! This module provides `SQLite`-backed persistence for the two logical
//! collections (shipments and flights). Each collection lives in a single
//! key/value slot holding the whole serialized JSON array; every save is a
//! whole-collection replace and there is no transactional guarantee across
//! the two slots. Callers that mutate both collections serialize their
//! read-modify-write sequences behind one in-process lock (see the
//! manager types).

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Flight, Shipment};
use crate::seed;

/// A logical collection slot in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// The shipments collection.
    Shipments,
    /// The flights collection.
    Flights,
}

impl Collection {
    /// The fixed slot key this collection is stored under.
    ///
    /// The key names are carried over from the original persisted layout so
    /// existing data remains readable.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Shipments => "hm_shipments",
            Self::Flights => "hm_flights",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shipments => write!(f, "shipments"),
            Self::Flights => write!(f, "flights"),
        }
    }
}

/// Persistent store for shipment and flight collections.
#[derive(Debug)]
pub struct Store {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Store {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL keeps concurrent readers from blocking on writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records from a collection slot.
    ///
    /// A slot that has never been written reads back as an empty vec.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the slot does not
    /// contain valid JSON.
    pub fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        match self.read_slot(collection)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace a collection slot with the given records.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.conn.execute(
            r"
            INSERT INTO collections (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
            params![collection.key(), json],
        )?;
        debug!("Saved {} records to {}", records.len(), collection);
        Ok(())
    }

    /// Check whether a collection slot has ever been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn has(&self, collection: Collection) -> Result<bool> {
        Ok(self.read_slot(collection)?.is_some())
    }

    /// Populate absent collection slots with the fixed sample set.
    ///
    /// Only slots that have never been written are seeded; an existing slot,
    /// even one holding an empty array, is left alone. Returns `true` if any
    /// slot was seeded.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub fn seed_if_empty(&self) -> Result<bool> {
        let mut seeded = false;
        if !self.has(Collection::Shipments)? {
            self.save(Collection::Shipments, &seed::default_shipments())?;
            seeded = true;
        }
        if !self.has(Collection::Flights)? {
            self.save(Collection::Flights, &seed::default_flights())?;
            seeded = true;
        }
        if seeded {
            info!("Seeded sample shipments and flights");
        }
        Ok(seeded)
    }

    fn read_slot(&self, collection: Collection) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM collections WHERE key = ?1",
                [collection.key()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    // === Typed helpers ===

    /// Load all shipments.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_shipments(&self) -> Result<Vec<Shipment>> {
        self.load(Collection::Shipments)
    }

    /// Replace the shipments collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_shipments(&self, shipments: &[Shipment]) -> Result<()> {
        self.save(Collection::Shipments, shipments)
    }

    /// Load all flights.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_flights(&self) -> Result<Vec<Flight>> {
        self.load(Collection::Flights)
    }

    /// Replace the flights collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_flights(&self, flights: &[Flight]) -> Result<()> {
        self.save(Collection::Flights, flights)
    }

    /// Find a shipment by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_shipment_by_id(&self, id: &str) -> Result<Option<Shipment>> {
        Ok(self.load_shipments()?.into_iter().find(|s| s.id == id))
    }

    /// Find a shipment by tracking code (case-insensitive exact match).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_shipment_by_code(&self, code: &str) -> Result<Option<Shipment>> {
        Ok(self
            .load_shipments()?
            .into_iter()
            .find(|s| s.code_matches(code)))
    }

    /// Find a flight by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_flight_by_id(&self, id: &str) -> Result<Option<Flight>> {
        Ok(self.load_flights()?.into_iter().find(|f| f.id == id))
    }

    /// Insert or replace a shipment by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert_shipment(&self, shipment: &Shipment) -> Result<()> {
        let mut shipments = self.load_shipments()?;
        match shipments.iter_mut().find(|s| s.id == shipment.id) {
            Some(existing) => *existing = shipment.clone(),
            None => shipments.push(shipment.clone()),
        }
        self.save_shipments(&shipments)
    }

    /// Insert or replace a flight by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert_flight(&self, flight: &Flight) -> Result<()> {
        let mut flights = self.load_flights()?;
        match flights.iter_mut().find(|f| f.id == flight.id) {
            Some(existing) => *existing = flight.clone(),
            None => flights.push(flight.clone()),
        }
        self.save_flights(&flights)
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let shipments = self.load_shipments()?.len();
        let flights = self.load_flights()?.len();

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            shipments,
            flights,
            db_size_bytes,
        })
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of shipments stored.
    pub shipments: usize,
    /// Number of flights stored.
    pub flights: usize,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShipmentStatus;

    fn create_test_store() -> Store {
        Store::open_in_memory().expect("failed to create test store")
    }

    fn sample_shipment(code: &str) -> Shipment {
        Shipment::new(
            "Sender",
            "Recipient",
            "LHR",
            "JFK",
            10.0,
            code,
            ShipmentStatus::Pending,
        )
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Store::open_in_memory().is_ok());
    }

    #[test]
    fn test_load_absent_slot_is_empty() {
        let store = create_test_store();
        let shipments = store.load_shipments().unwrap();
        assert!(shipments.is_empty());
        assert!(!store.has(Collection::Shipments).unwrap());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = create_test_store();
        let shipment = sample_shipment("HM-AAAAAA");

        store.save_shipments(std::slice::from_ref(&shipment)).unwrap();
        let loaded = store.load_shipments().unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], shipment);
    }

    #[test]
    fn test_save_is_whole_collection_replace() {
        let store = create_test_store();
        store
            .save_shipments(&[sample_shipment("HM-AAAAAA"), sample_shipment("HM-BBBBBB")])
            .unwrap();
        store.save_shipments(&[sample_shipment("HM-CCCCCC")]).unwrap();

        let loaded = store.load_shipments().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].code, "HM-CCCCCC");
    }

    #[test]
    fn test_saved_empty_slot_counts_as_written() {
        let store = create_test_store();
        store.save_shipments(&[]).unwrap();
        assert!(store.has(Collection::Shipments).unwrap());
    }

    #[test]
    fn test_seed_if_empty_populates_both_slots() {
        let store = create_test_store();
        assert!(store.seed_if_empty().unwrap());

        assert_eq!(store.load_shipments().unwrap().len(), 3);
        assert_eq!(store.load_flights().unwrap().len(), 2);
    }

    #[test]
    fn test_seed_if_empty_does_not_overwrite() {
        let store = create_test_store();
        store.save_shipments(&[sample_shipment("HM-AAAAAA")]).unwrap();

        // Only the flights slot is absent
        assert!(store.seed_if_empty().unwrap());
        assert_eq!(store.load_shipments().unwrap().len(), 1);
        assert_eq!(store.load_flights().unwrap().len(), 2);

        // Second call seeds nothing
        assert!(!store.seed_if_empty().unwrap());
    }

    #[test]
    fn test_find_shipment_by_id() {
        let store = create_test_store();
        let shipment = sample_shipment("HM-AAAAAA");
        store.save_shipments(std::slice::from_ref(&shipment)).unwrap();

        assert!(store.find_shipment_by_id(&shipment.id).unwrap().is_some());
        assert!(store.find_shipment_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_find_shipment_by_code_case_insensitive() {
        let store = create_test_store();
        store.save_shipments(&[sample_shipment("HM-AAAAAA")]).unwrap();

        assert!(store.find_shipment_by_code("hm-aaaaaa").unwrap().is_some());
        assert!(store.find_shipment_by_code("HM-AAAAAA").unwrap().is_some());
        assert!(store.find_shipment_by_code("HM-ZZZZZZ").unwrap().is_none());
    }

    #[test]
    fn test_upsert_shipment_inserts_then_replaces() {
        let store = create_test_store();
        let mut shipment = sample_shipment("HM-AAAAAA");

        store.upsert_shipment(&shipment).unwrap();
        assert_eq!(store.load_shipments().unwrap().len(), 1);

        shipment.sender = "Changed".to_string();
        store.upsert_shipment(&shipment).unwrap();

        let loaded = store.load_shipments().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].sender, "Changed");
    }

    #[test]
    fn test_upsert_flight() {
        let store = create_test_store();
        let mut flight = Flight::new(
            "HM412",
            "LHR",
            "JFK",
            chrono::Utc::now(),
            chrono::Utc::now() + chrono::Duration::hours(4),
        );

        store.upsert_flight(&flight).unwrap();
        flight.number = "HM413".to_string();
        store.upsert_flight(&flight).unwrap();

        let loaded = store.load_flights().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].number, "HM413");
    }

    #[test]
    fn test_find_flight_by_id() {
        let store = create_test_store();
        store.seed_if_empty().unwrap();
        let flights = store.load_flights().unwrap();

        assert!(store.find_flight_by_id(&flights[0].id).unwrap().is_some());
        assert!(store.find_flight_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_stats() {
        let store = create_test_store();
        store.seed_if_empty().unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.shipments, 3);
        assert_eq!(stats.flights, 2);
        assert_eq!(stats.db_size_bytes, 0); // in-memory
    }

    #[test]
    fn test_collection_keys() {
        assert_eq!(Collection::Shipments.key(), "hm_shipments");
        assert_eq!(Collection::Flights.key(), "hm_flights");
        assert_eq!(Collection::Shipments.to_string(), "shipments");
    }

    #[test]
    fn test_open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("records.db");

        let store = Store::open(&db_path).unwrap();
        store.save_shipments(&[sample_shipment("HM-AAAAAA")]).unwrap();
        assert_eq!(store.path(), db_path);

        drop(store);

        // Reopen and read back
        let store = Store::open(&db_path).unwrap();
        assert_eq!(store.load_shipments().unwrap().len(), 1);
        assert!(store.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/deeper/records.db");

        let _store = Store::open(&nested).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_persisted_wire_format() {
        // The slot must hold the JSON array shape of the original layout.
        let store = create_test_store();
        store.save_shipments(&[sample_shipment("HM-AAAAAA")]).unwrap();

        let raw = store.read_slot(Collection::Shipments).unwrap().unwrap();
        assert!(raw.starts_with('['));
        assert!(raw.contains("\"flightId\""));
        assert!(raw.contains("\"createdAt\""));
    }
}
