//! Fixed-Value Connectivity Probe

use async_trait::async_trait;
use bridge_traits::network::ConnectivityProbe;

/// Connectivity probe that always reports a fixed value.
///
/// Used in tests and in web contexts where only the initial
/// `navigator.onLine` snapshot is known at startup.
#[derive(Debug, Clone, Copy)]
pub struct StaticConnectivityProbe {
    online: bool,
}

impl StaticConnectivityProbe {
    pub fn online() -> Self {
        Self { online: true }
    }

    pub fn offline() -> Self {
        Self { online: false }
    }
}

#[async_trait]
impl ConnectivityProbe for StaticConnectivityProbe {
    async fn is_online(&self) -> bool {
        self.online
    }
}
