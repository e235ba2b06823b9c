use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use super::domain::{DocumentFields, RecordField, RecordId, StoredDocument};

/// Storage abstraction over the managed document collection holding alumni.
pub trait DocumentStore: Send + Sync {
    /// Every document, ordered by `Name` ascending.
    fn list(&self) -> Result<Vec<StoredDocument>, StoreError>;
    /// Inserts a new document and returns the generated id.
    fn insert(&self, fields: DocumentFields) -> Result<RecordId, StoreError>;
    /// Merges `partial` into an existing document; keys not supplied are left untouched.
    fn update(&self, id: &RecordId, partial: DocumentFields) -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed seed data: {0}")]
    Seed(String),
}

/// Process-local store used by the service binary and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<HashMap<RecordId, DocumentFields>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a JSON array of objects. An `id` key is honoured when present,
    /// otherwise one is generated.
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| StoreError::Seed(err.to_string()))?;
        let Value::Array(items) = value else {
            return Err(StoreError::Seed("expected a JSON array of records".to_string()));
        };

        let mut documents = HashMap::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let Value::Object(mut fields) = item else {
                return Err(StoreError::Seed(format!("entry {index} is not an object")));
            };
            let id = match fields.remove("id") {
                Some(Value::String(id)) if !id.trim().is_empty() => RecordId(id),
                Some(Value::Number(id)) => RecordId(id.to_string()),
                _ => generate_id(),
            };
            if documents.insert(id.clone(), fields).is_some() {
                return Err(StoreError::Seed(format!("duplicate id '{id}'")));
            }
        }

        debug!(count = documents.len(), "seeded in-memory alumni store");
        Ok(Self {
            documents: Arc::new(Mutex::new(documents)),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| StoreError::Seed(format!("{}: {err}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<RecordId, DocumentFields>>, StoreError> {
        self.documents
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn list(&self) -> Result<Vec<StoredDocument>, StoreError> {
        let guard = self.lock()?;
        let mut documents: Vec<StoredDocument> = guard
            .iter()
            .map(|(id, fields)| StoredDocument {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();
        documents.sort_by(compare_by_name);
        Ok(documents)
    }

    fn insert(&self, fields: DocumentFields) -> Result<RecordId, StoreError> {
        let mut guard = self.lock()?;
        let id = generate_id();
        guard.insert(id.clone(), fields);
        Ok(id)
    }

    fn update(&self, id: &RecordId, partial: DocumentFields) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let existing = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        existing.extend(partial);
        Ok(())
    }
}

fn generate_id() -> RecordId {
    RecordId(uuid::Uuid::new_v4().simple().to_string())
}

/// Name order. This store keeps documents without a string `Name` and lists them first;
/// ids keep the order total.
fn compare_by_name(a: &StoredDocument, b: &StoredDocument) -> Ordering {
    let name = |doc: &StoredDocument| {
        doc.fields
            .get(RecordField::Name.key())
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    name(a).cmp(&name(b)).then_with(|| a.id.cmp(&b.id))
}
