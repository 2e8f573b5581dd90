//! Resource stores for local runs and tests.
//!
//! - **LocalResourceStore**: reads `<root>/<resource>` from disk, ignoring
//!   project/stage/service (the "use local filesystem" mode)
//! - **InMemoryResourceStore**: exact `ResourceScope` lookup

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::ports::{ResourceError, ResourceScope, ResourceStore};

pub struct LocalResourceStore {
    root: PathBuf,
}

impl LocalResourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ResourceStore for LocalResourceStore {
    async fn get_resource(&self, scope: &ResourceScope) -> Result<Vec<u8>, ResourceError> {
        let path = self.root.join(&scope.resource);
        debug!(path = %path.display(), "reading local resource");
        tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(path.display().to_string())
            } else {
                ResourceError::Io {
                    uri: path.display().to_string(),
                    source,
                }
            }
        })
    }
}

#[derive(Default)]
pub struct InMemoryResourceStore {
    resources: HashMap<ResourceScope, Vec<u8>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, scope: ResourceScope, content: impl Into<Vec<u8>>) -> Self {
        self.resources.insert(scope, content.into());
        self
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn get_resource(&self, scope: &ResourceScope) -> Result<Vec<u8>, ResourceError> {
        self.resources
            .get(scope)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(scope.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_store_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("relay-service")).unwrap();
        std::fs::write(dir.path().join("relay-service/sli.yaml"), b"indicators: {}").unwrap();

        let store = LocalResourceStore::new(dir.path());
        let bytes = store
            .get_resource(&ResourceScope::new("p", "s", "svc", "relay-service/sli.yaml"))
            .await
            .unwrap();
        assert_eq!(bytes, b"indicators: {}");
    }

    #[tokio::test]
    async fn local_store_maps_missing_file_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalResourceStore::new(dir.path());
        let err = store
            .get_resource(&ResourceScope::new("p", "s", "svc", "missing.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn in_memory_store_is_scope_exact() {
        let scope = ResourceScope::new("p", "s", "svc", "sli.yaml");
        let store = InMemoryResourceStore::new().with_resource(scope.clone(), "x");

        assert_eq!(store.get_resource(&scope).await.unwrap(), b"x");
        let other = ResourceScope::new("p", "prod", "svc", "sli.yaml");
        assert!(store.get_resource(&other).await.is_err());
    }
}
