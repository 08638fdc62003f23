//! # Navigation Facade
//!
//! Thin adapter over the host navigation module with a local-router
//! fallback. Every navigation publishes a `NAVIGATION` event so screens can
//! react without polling the route.

use crate::error::Result;
use crate::invoker::NativeInvoker;
use bridge_traits::LocalRouter;
use core_runtime::events::EventBus;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Host module providing page routing.
pub const NAVIGATION_MODULE: &str = "Navigation";

/// Application event published on every navigation.
pub const NAVIGATION_EVENT: &str = "NAVIGATION";

/// Page names understood by the host router.
pub mod pages {
    pub const HOME: &str = "home";
    pub const TASK_LIST: &str = "tasklist";
    pub const TASK_CREATE: &str = "taskcreate";
    pub const TASK_DETAIL: &str = "taskdetail";
    pub const PROFILE: &str = "profile";
}

pub struct NavigationFacade {
    invoker: Arc<NativeInvoker>,
    router: Arc<dyn LocalRouter>,
    bus: EventBus,
}

impl NavigationFacade {
    pub fn new(invoker: Arc<NativeInvoker>, router: Arc<dyn LocalRouter>, bus: EventBus) -> Self {
        Self {
            invoker,
            router,
            bus,
        }
    }

    pub async fn to_page(&self, page: &str) -> Result<()> {
        self.bus.emit(NAVIGATION_EVENT, json!({ "to": page }));

        if self.invoker.is_available() {
            match self
                .invoker
                .invoke(NAVIGATION_MODULE, "openPage", json!({ "page": page }))
                .await
            {
                Ok(_) => return Ok(()),
                Err(error) => {
                    warn!(page = %page, error = %error, "Host navigation failed, using local router");
                }
            }
        }

        self.router.navigate(page, None).await?;
        Ok(())
    }

    pub async fn to_page_with_id(&self, page: &str, id: &str) -> Result<()> {
        self.bus
            .emit(NAVIGATION_EVENT, json!({ "to": page, "id": id }));

        if self.invoker.is_available() {
            match self
                .invoker
                .invoke(
                    NAVIGATION_MODULE,
                    "openPageId",
                    json!({ "page": page, "id": id }),
                )
                .await
            {
                Ok(_) => return Ok(()),
                Err(error) => {
                    warn!(page = %page, id = %id, error = %error, "Host navigation failed, using local router");
                }
            }
        }

        self.router.navigate(page, Some(id)).await?;
        Ok(())
    }

    /// Return to the home page, resetting the host's page stack.
    pub async fn to_home(&self) -> Result<()> {
        self.bus.emit(NAVIGATION_EVENT, json!({ "to": pages::HOME }));

        if self.invoker.is_available() {
            match self
                .invoker
                .invoke(NAVIGATION_MODULE, "toHome", json!({}))
                .await
            {
                Ok(_) => return Ok(()),
                Err(error) => {
                    warn!(error = %error, "Host toHome failed, using local router");
                }
            }
        }

        self.router.navigate(pages::HOME, None).await?;
        Ok(())
    }

    pub async fn back(&self) -> Result<()> {
        self.bus.emit(NAVIGATION_EVENT, json!({ "action": "back" }));

        if self.invoker.is_available() {
            match self
                .invoker
                .invoke(NAVIGATION_MODULE, "back", json!({}))
                .await
            {
                Ok(_) => return Ok(()),
                Err(error) => {
                    warn!(error = %error, "Host back failed, using local router");
                }
            }
        }

        debug!("Navigating back via local router");
        self.router.back().await?;
        Ok(())
    }
}
