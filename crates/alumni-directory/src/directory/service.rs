use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::auth::{AuthError, AuthProvider, Session};
use super::domain::{AlumniRecord, RecordDraft, RecordId};
use super::export::{ExportError, ExportFile, ExportFormat, ExportSheet};
use super::filter::RecordFilter;
use super::report::DirectoryReport;
use super::store::{DocumentStore, StoreError};

/// Everything derived from one full load of the collection.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    pub records: Vec<AlumniRecord>,
    pub report: DirectoryReport,
    pub loaded_at: DateTime<Utc>,
}

impl DirectorySnapshot {
    pub fn build(records: Vec<AlumniRecord>) -> Self {
        let report = DirectoryReport::build(&records);
        Self {
            records,
            report,
            loaded_at: Utc::now(),
        }
    }
}

/// Service composing the document store, the identity provider and the derived views.
pub struct DirectoryService<S, A> {
    store: Arc<S>,
    auth: Arc<A>,
    snapshot: RwLock<Option<Arc<DirectorySnapshot>>>,
}

impl<S, A> DirectoryService<S, A>
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    pub fn new(store: Arc<S>, auth: Arc<A>) -> Self {
        Self {
            store,
            auth,
            snapshot: RwLock::new(None),
        }
    }

    /// Signs in and loads the directory for the new session. A failed load is logged and
    /// retried lazily by the next read.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let session = self.auth.login(email, password).map_err(|err| {
            warn!(error = %err, "login rejected");
            ServiceError::Auth(err)
        })?;
        info!(email = %session.email, "session started");

        if self.refresh(&session).is_err() {
            warn!(email = %session.email, "initial alumni load failed after login");
        }
        Ok(session)
    }

    /// Ends the session; in-memory data is dropped once nobody is signed in.
    pub fn logout(&self, session: &Session) {
        self.auth.logout(session);
        info!(email = %session.email, "session ended");
        if self.auth.active_sessions() == 0 {
            self.replace_snapshot(None);
        }
    }

    pub fn authorize(&self, token: &str) -> Result<Session, ServiceError> {
        self.auth
            .resolve(token)
            .ok_or(ServiceError::Auth(AuthError::Unauthenticated))
    }

    fn ensure_active(&self, session: &Session) -> Result<(), ServiceError> {
        match self.auth.resolve(&session.token) {
            Some(_) => Ok(()),
            None => Err(ServiceError::Auth(AuthError::Unauthenticated)),
        }
    }

    /// Full reload. On failure no stale data is kept.
    pub fn refresh(&self, session: &Session) -> Result<Arc<DirectorySnapshot>, ServiceError> {
        self.ensure_active(session)?;

        let documents = match self.store.list() {
            Ok(documents) => documents,
            Err(err) => {
                error!(error = %err, "error fetching alumni");
                self.replace_snapshot(None);
                return Err(ServiceError::Fetch(err));
            }
        };

        let records = documents.iter().map(AlumniRecord::from_document).collect();
        let snapshot = Arc::new(DirectorySnapshot::build(records));
        info!(
            records = snapshot.records.len(),
            years = snapshot.report.facets.years.len(),
            countries = snapshot.report.facets.countries.len(),
            "alumni directory loaded"
        );
        self.replace_snapshot(Some(snapshot.clone()));
        Ok(snapshot)
    }

    /// Current snapshot, loading it first if nothing is cached.
    pub fn snapshot(&self, session: &Session) -> Result<Arc<DirectorySnapshot>, ServiceError> {
        self.ensure_active(session)?;
        let cached = self
            .snapshot
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().cloned());
        match cached {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh(session),
        }
    }

    pub fn search(
        &self,
        session: &Session,
        filter: &RecordFilter,
    ) -> Result<Vec<AlumniRecord>, ServiceError> {
        let snapshot = self.snapshot(session)?;
        Ok(filter.apply(&snapshot.records))
    }

    pub fn report(&self, session: &Session) -> Result<DirectoryReport, ServiceError> {
        Ok(self.snapshot(session)?.report.clone())
    }

    /// Creates a record when `id` is `None`, otherwise merges the supplied fields into the
    /// existing one. The directory is reloaded afterwards; only the write decides the result.
    pub fn save(
        &self,
        session: &Session,
        id: Option<&RecordId>,
        draft: RecordDraft,
    ) -> Result<RecordId, ServiceError> {
        self.ensure_active(session)?;

        let fields = draft.to_document();
        let saved = match id {
            None => {
                if draft.name.is_none() {
                    return Err(ServiceError::Validation("Name is required".to_string()));
                }
                if draft.program.is_none() {
                    return Err(ServiceError::Validation("Program is required".to_string()));
                }
                self.store.insert(fields)
            }
            Some(id) => self.store.update(id, fields).map(|()| id.clone()),
        };

        let saved = saved.map_err(|err| {
            error!(error = %err, record = ?id, "error saving alumnus");
            ServiceError::Save(err)
        })?;
        info!(record = %saved, created = id.is_none(), by = %session.email, "alumnus saved");

        // The write landed; a failed reload is left to the next read.
        if self.refresh(session).is_err() {
            warn!(record = %saved, "alumni reload failed after save");
        }
        Ok(saved)
    }

    pub fn export(
        &self,
        session: &Session,
        filter: &RecordFilter,
        format: ExportFormat,
    ) -> Result<ExportFile, ServiceError> {
        let records = self.search(session, filter)?;
        let file = ExportSheet::from_records(&records).encode(format)?;
        info!(rows = records.len(), file = %file.file_name, "alumni export generated");
        Ok(file)
    }

    fn replace_snapshot(&self, snapshot: Option<Arc<DirectorySnapshot>>) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

/// Error raised by the directory service. Store failures collapse into one
/// user-facing message per operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Failed to load alumni data.")]
    Fetch(#[source] StoreError),
    #[error("Failed to save alumnus. Please try again.")]
    Save(#[source] StoreError),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ServiceError {
    pub fn is_empty_export(&self) -> bool {
        matches!(self, Self::Export(ExportError::Empty))
    }
}
