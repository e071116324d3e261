//! Session storage backends for helpdesk.

pub mod file_backend;
pub mod in_memory;

pub use file_backend::FileSessions;
pub use in_memory::InMemorySessions;

use std::sync::Arc;

use helpdesk_config::SessionsConfig;
use helpdesk_core::SessionStore;
use tracing::warn;

/// Build the configured session store backend.
///
/// Unknown backend names fall back to the in-memory store.
pub fn build_from_config(config: &SessionsConfig) -> Arc<dyn SessionStore> {
    match config.backend.as_str() {
        "file" => Arc::new(FileSessions::new(config.dir.clone(), config.ttl_secs)),
        "memory" => Arc::new(InMemorySessions::new(config.ttl_secs)),
        other => {
            warn!(backend = %other, "Unknown session backend, using in-memory store");
            Arc::new(InMemorySessions::new(config.ttl_secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_selected_by_default() {
        let store = build_from_config(&SessionsConfig::default());
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn file_backend_selected_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionsConfig {
            backend: "file".into(),
            dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let store = build_from_config(&config);
        assert_eq!(store.name(), "file");
    }

    #[test]
    fn unknown_backend_falls_back_to_memory() {
        let config = SessionsConfig {
            backend: "redis".into(),
            ..Default::default()
        };
        assert_eq!(build_from_config(&config).name(), "memory");
    }
}
