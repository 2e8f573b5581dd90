//! Task trait - payload 型と task 名の対応付け
//!
//! # 学習ポイント
//! - Associated Constants (`const TASK`)
//! - Trait bounds の組み合わせ (Serialize + DeserializeOwned + Send + Sync + 'static)

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::Scope;

/// Payload of a triggered event for one task.
///
/// # Example
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct DeploymentTriggered {
///     #[serde(flatten)]
///     scope: Scope,
///     deployment: DeploymentSpec,
/// }
///
/// impl Task for DeploymentTriggered {
///     const TASK: &'static str = "deployment";
///
///     fn scope(&self) -> &Scope {
///         &self.scope
///     }
/// }
/// ```
///
/// # Trait Bounds
/// - `DeserializeOwned`: decoded from the envelope payload
/// - `Send + Sync + 'static`: moved into handler futures that run on any
///   worker thread
pub trait Task: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The `<task>` segment of `<namespace>.<task>.triggered`.
    const TASK: &'static str;

    /// Scoping fields copied into the started/finished payloads.
    fn scope(&self) -> &Scope;

    /// Provider tag for payloads that several services compete for.
    ///
    /// `None` means the payload is not provider-scoped.
    fn provider(&self) -> Option<&str> {
        None
    }
}
