//! Shared application state for the message server.

use std::sync::Arc;

use reactor::io::render::TemplateRenderer;
use reactor::message::Engine;

use crate::cache::InstanceCache;
use crate::components::Registry;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub registry: Arc<Registry>,
    pub cache: Arc<InstanceCache>,
    pub renderer: Arc<TemplateRenderer>,
}

impl AppState {
    pub fn new(engine: Engine, registry: Registry, renderer: TemplateRenderer) -> Self {
        Self {
            engine: Arc::new(engine),
            registry: Arc::new(registry),
            cache: Arc::new(InstanceCache::default()),
            renderer: Arc::new(renderer),
        }
    }

    /// Replace the default instance cache.
    pub fn with_cache(mut self, cache: InstanceCache) -> Self {
        self.cache = Arc::new(cache);
        self
    }
}
