//! Navigation Fallback Surface
//!
//! The host routes between pages natively; when it cannot, the core falls
//! back to a local router (hash-based routes on the web).

use async_trait::async_trait;

use crate::error::Result;

/// Local routing fallback.
///
/// Implementations track the route stack themselves; the core only tells
/// them where to go.
#[async_trait]
pub trait LocalRouter: Send + Sync {
    /// Navigate to a page, optionally carrying an entity id.
    async fn navigate(&self, page: &str, param: Option<&str>) -> Result<()>;

    /// Navigate back one entry, or to the home page when the stack is empty.
    async fn back(&self) -> Result<()>;

    /// Current route, mainly for diagnostics and tests.
    async fn current(&self) -> Option<String>;
}
