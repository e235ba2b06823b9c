use alumni_directory::config::DirectoryConfig;
use alumni_directory::directory::{InMemoryDocumentStore, StoreError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Builds the store the server runs against. `override_path` wins over `APP_DATA_FILE`;
/// without either the directory starts empty.
pub(crate) fn load_store(
    config: &DirectoryConfig,
    override_path: Option<&Path>,
) -> Result<InMemoryDocumentStore, StoreError> {
    match override_path.or(config.data_file.as_deref()) {
        Some(path) => {
            let store = InMemoryDocumentStore::from_path(path)?;
            info!(path = %path.display(), records = store.len(), "alumni store seeded");
            Ok(store)
        }
        None => {
            warn!("no alumni data file configured; starting with an empty directory");
            Ok(InMemoryDocumentStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(data_file: Option<PathBuf>) -> DirectoryConfig {
        DirectoryConfig {
            data_file,
            users: Vec::new(),
            export_dir: PathBuf::from("."),
            session_ttl_minutes: 60,
        }
    }

    #[test]
    fn missing_data_file_starts_empty() {
        let store = load_store(&config(None), None).expect("empty store");
        assert!(store.is_empty());
    }

    #[test]
    fn unreadable_data_file_is_reported() {
        let result = load_store(
            &config(Some(PathBuf::from("/nonexistent/alumni.json"))),
            None,
        );
        assert!(matches!(result, Err(StoreError::Seed(_))));
    }
}
