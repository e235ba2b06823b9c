use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::config::UserCredential;
use crate::directory::auth::{AuthProvider, Session, StaticCredentials};
use crate::directory::domain::{DocumentFields, RecordId, StoredDocument};
use crate::directory::service::DirectoryService;
use crate::directory::store::{DocumentStore, InMemoryDocumentStore, StoreError};

pub(super) const EMAIL: &str = "coordinator@example.org";
pub(super) const PASSWORD: &str = "vaccines-work";

pub(super) const SEED: &str = r#"[
    {"id": "a", "Name": "A", "Year": 2020, "Program": "AAVC", "Country": "Kenya"},
    {"id": "b", "Name": "B", "Year": 2020, "Program": "AVCN", "Country": "Kenya"},
    {"id": "c", "Name": "C", "Year": "2020", "Program": "AAVC", "Country": "Fiji"}
]"#;

pub(super) fn credentials() -> StaticCredentials {
    StaticCredentials::new([UserCredential {
        email: EMAIL.to_string(),
        password_digest: StaticCredentials::digest(PASSWORD),
    }])
}

pub(super) fn seeded_store() -> InMemoryDocumentStore {
    InMemoryDocumentStore::from_json(SEED).expect("seed parses")
}

pub(super) type MemoryService = DirectoryService<InMemoryDocumentStore, StaticCredentials>;

pub(super) fn build_service() -> (Arc<MemoryService>, InMemoryDocumentStore, Session) {
    let store = seeded_store();
    let service = Arc::new(DirectoryService::new(
        Arc::new(store.clone()),
        Arc::new(credentials()),
    ));
    let session = service.login(EMAIL, PASSWORD).expect("login succeeds");
    (service, store, session)
}

/// Delegates to an in-memory store but can be switched into a failing state.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryDocumentStore,
    pub(super) fail_reads: AtomicBool,
    pub(super) fail_writes: AtomicBool,
}

impl FlakyStore {
    pub(super) fn seeded() -> Self {
        Self {
            inner: seeded_store(),
            ..Self::default()
        }
    }

    pub(super) fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(super) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl DocumentStore for FlakyStore {
    fn list(&self) -> Result<Vec<StoredDocument>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.list()
    }

    fn insert(&self, fields: DocumentFields) -> Result<RecordId, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("permission denied".to_string()));
        }
        self.inner.insert(fields)
    }

    fn update(&self, id: &RecordId, partial: DocumentFields) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("permission denied".to_string()));
        }
        self.inner.update(id, partial)
    }
}

pub(super) fn flaky_service() -> (
    Arc<DirectoryService<FlakyStore, StaticCredentials>>,
    Arc<FlakyStore>,
    Session,
) {
    let store = Arc::new(FlakyStore::seeded());
    let service = Arc::new(DirectoryService::new(store.clone(), Arc::new(credentials())));
    let session = service.login(EMAIL, PASSWORD).expect("login succeeds");
    (service, store, session)
}

pub(super) fn bearer(session: &Session) -> String {
    format!("Bearer {}", session.token)
}

pub(super) fn stranger() -> Session {
    let auth = credentials();
    let session = auth.login(EMAIL, PASSWORD).expect("login succeeds");
    auth.logout(&session);
    session
}

pub(super) async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}
