//! ResourceStore port - configuration artifacts from the resource repository.
//!
//! Handlers use it to fetch task-specific files (e.g. `sli.yaml`) scoped to
//! a project/stage/service before executing.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Scope;

/// Address of one resource in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceScope {
    pub project: String,
    pub stage: String,
    pub service: String,
    pub resource: String,
}

impl ResourceScope {
    pub fn new(
        project: impl Into<String>,
        stage: impl Into<String>,
        service: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            stage: stage.into(),
            service: service.into(),
            resource: resource.into(),
        }
    }

    pub fn for_scope(scope: &Scope, resource: impl Into<String>) -> Self {
        Self::new(
            scope.project.clone(),
            scope.stage.clone(),
            scope.service.clone(),
            resource,
        )
    }
}

impl std::fmt::Display for ResourceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.project, self.stage, self.service, self.resource
        )
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource {0} not found")]
    NotFound(String),

    #[error("failed to read resource {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get_resource(&self, scope: &ResourceScope) -> Result<Vec<u8>, ResourceError>;
}
