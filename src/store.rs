//! The record store: the authoritative employee collection.
//!
//! Every mutation rewrites the whole collection to the backing storage. Storage
//! failures are logged and otherwise ignored; the in-memory records stay the
//! source of truth for the session.

use crate::record::{Employee, EmployeeFields, RecordId};
use crate::storage::Storage;
use tracing::{debug, error, info, warn};

/// Storage key used when none is configured
pub const DEFAULT_KEY: &str = "employeeData";

pub struct RecordStore {
    storage: Box<dyn Storage>,
    key: String,
    records: Vec<Employee>,
    next_id: RecordId,
}

impl RecordStore {
    /// Create a store over `storage` and load whatever is persisted under `key`
    pub fn open(storage: Box<dyn Storage>, key: &str) -> Self {
        let mut store = Self {
            storage,
            key: key.to_string(),
            records: Vec::new(),
            next_id: 1,
        };
        store.records = store.load();
        store.next_id = next_id_after(&store.records).unwrap_or(RecordId::MAX);
        info!(key = %store.key, records = store.records.len(), "opened record store");
        store
    }

    /// Read the persisted collection. Missing or unreadable data yields an empty list.
    pub fn load(&self) -> Vec<Employee> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read employee data");
                return Vec::new();
            }
        };

        let records = match serde_json::from_str::<Vec<Employee>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(key = %self.key, error = %e, "discarding unreadable employee data");
                return Vec::new();
            }
        };

        // No id could follow RecordId::MAX
        if next_id_after(&records).is_none() {
            warn!(key = %self.key, "discarding employee data: id out of range");
            return Vec::new();
        }
        records
    }

    /// Overwrite the persisted collection with `records`
    pub fn save(&mut self, records: &[Employee]) {
        let json = match serde_json::to_string(records) {
            Ok(json) => json,
            Err(e) => {
                error!(key = %self.key, error = %e, "failed to serialize employee data");
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, &json) {
            error!(key = %self.key, error = %e, "failed to save employee data");
        }
    }

    fn persist(&mut self) {
        let records = std::mem::take(&mut self.records);
        self.save(&records);
        self.records = records;
    }

    /// Add a new record with the next id; `None` once ids are exhausted
    pub fn append(&mut self, fields: EmployeeFields) -> Option<Employee> {
        // RecordId::MAX is never handed out, so a saved collection always reloads
        let Some(after) = self.next_id.checked_add(1) else {
            error!(key = %self.key, "no record ids left");
            return None;
        };
        let record = Employee::new(self.next_id, fields);
        self.next_id = after;
        self.records.push(record.clone());
        debug!(id = record.id, "appended record");
        self.persist();
        Some(record)
    }

    /// Replace every field except the id; `false` if no record has `id`
    pub fn replace_by_id(&mut self, id: RecordId, fields: EmployeeFields) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            debug!(id, "replace skipped: no such record");
            return false;
        };
        record.fields = fields;
        debug!(id, "replaced record");
        self.persist();
        true
    }

    /// Remove the record with `id`; `false` if there was none
    pub fn delete_by_id(&mut self, id: RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        if self.records.len() == before {
            debug!(id, "delete skipped: no such record");
            return false;
        }
        debug!(id, "deleted record");
        self.persist();
        true
    }

    pub fn find_by_id(&self, id: RecordId) -> Option<Employee> {
        self.records.iter().find(|r| r.id == id).cloned()
    }

    pub fn records(&self) -> &[Employee] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn next_id_after(records: &[Employee]) -> Option<RecordId> {
    match records.iter().map(|r| r.id).max() {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}
