//! Alumni directory: record normalization, search, reporting, export and the session gate.

pub mod auth;
pub mod domain;
pub mod export;
pub mod facets;
pub mod filter;
pub mod report;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use auth::{AuthError, AuthProvider, Session, StaticCredentials};
pub use domain::{AlumniRecord, RecordDraft, RecordField, RecordFields, RecordId, StoredDocument};
pub use export::{ExportError, ExportFile, ExportFormat, ExportSheet};
pub use facets::{FacetSet, KNOWN_PROGRAMS};
pub use filter::RecordFilter;
pub use report::{CountryChartRow, DirectoryReport, YearChartRow, TOP_COUNTRY_LIMIT};
pub use router::directory_router;
pub use service::{DirectoryService, DirectorySnapshot, ServiceError};
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError};
