//! Hash-Style Route Stack

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::navigation::LocalRouter;
use tokio::sync::Mutex;
use tracing::debug;

const HOME_ROUTE: &str = "#/home";

/// Local router modelled on hash-based web routing.
///
/// Maintains a route stack of `#/page` entries; `back` pops one entry and
/// lands on home when the stack runs out. This is the navigation fallback
/// the core switches to when the host navigation module is unreachable.
#[derive(Debug, Default)]
pub struct HashRouter {
    stack: Mutex<Vec<String>>,
}

impl HashRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn route_for(page: &str, param: Option<&str>) -> String {
        match param {
            Some(id) => format!("#/{}?id={}", page, id),
            None => format!("#/{}", page),
        }
    }
}

#[async_trait]
impl LocalRouter for HashRouter {
    async fn navigate(&self, page: &str, param: Option<&str>) -> Result<()> {
        let route = Self::route_for(page, param);
        debug!(route = %route, "Local navigation");
        self.stack.lock().await.push(route);
        Ok(())
    }

    async fn back(&self) -> Result<()> {
        let mut stack = self.stack.lock().await;
        stack.pop();
        if stack.is_empty() {
            stack.push(HOME_ROUTE.to_string());
        }
        Ok(())
    }

    async fn current(&self) -> Option<String> {
        self.stack.lock().await.last().cloned()
    }
}
