//! Per-platform provider routing.

use std::collections::HashMap;

use push_core::{DeliveryTask, Platform, ProviderError, ProviderErrorKind};

use crate::Provider;

/// Routes each task to the provider registered for its platform.
pub struct PlatformRouter<P> {
    routes: HashMap<Platform, P>,
}

impl<P> PlatformRouter<P> {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register the provider for a platform, replacing any previous one.
    pub fn with_route(mut self, platform: Platform, provider: P) -> Self {
        self.routes.insert(platform, provider);
        self
    }

    pub fn insert(&mut self, platform: Platform, provider: P) {
        self.routes.insert(platform, provider);
    }

    pub fn get(&self, platform: Platform) -> Option<&P> {
        self.routes.get(&platform)
    }

    /// Platforms with a registered provider, sorted.
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<_> = self.routes.keys().copied().collect();
        platforms.sort();
        platforms
    }
}

impl<P> Default for PlatformRouter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> Provider for PlatformRouter<P> {
    async fn send(&self, task: &DeliveryTask) -> Result<(), ProviderError> {
        match self.routes.get(&task.platform()) {
            Some(provider) => provider.send(task).await,
            None => Err(ProviderError::new(
                ProviderErrorKind::Unroutable,
                format!("no provider configured for {}", task.platform()),
            )),
        }
    }

    /// Classified by the platform's provider; unrouted tasks never retry.
    fn is_transient(&self, task: &DeliveryTask, error: &ProviderError) -> bool {
        self.routes
            .get(&task.platform())
            .is_some_and(|provider| provider.is_transient(task, error))
    }
}
