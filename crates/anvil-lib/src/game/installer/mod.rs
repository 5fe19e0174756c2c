pub mod config;
pub mod core;
pub mod modloaders;
pub mod types;
pub mod vanilla;

use crate::error::{Error, Result};
use crate::game::installer::core::traits::LoaderProvider;
use crate::game::installer::modloaders::{
    ForgeProvider, MetaLoaderProvider, NeoForgeProvider, PaperFamilyProvider, PurpurProvider,
};
use crate::game::installer::vanilla::VanillaProvider;
use crate::game::metadata::types::LoaderId;
use std::collections::HashMap;

/// Loader id -> provider lookup used by the install orchestrator.
pub struct ProviderRegistry {
    providers: HashMap<LoaderId, Box<dyn LoaderProvider>>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry with every built-in loader.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(VanillaProvider));
        registry.register(Box::new(PaperFamilyProvider::paper()));
        registry.register(Box::new(PaperFamilyProvider::folia()));
        registry.register(Box::new(PurpurProvider));
        registry.register(Box::new(MetaLoaderProvider::fabric()));
        registry.register(Box::new(MetaLoaderProvider::quilt()));
        registry.register(Box::new(ForgeProvider));
        registry.register(Box::new(NeoForgeProvider));
        registry
    }

    /// Add or replace the provider for its loader.
    pub fn register(&mut self, provider: Box<dyn LoaderProvider>) {
        self.providers.insert(provider.loader(), provider);
    }

    pub fn get(&self, loader: LoaderId) -> Result<&dyn LoaderProvider> {
        self.providers
            .get(&loader)
            .map(|p| p.as_ref())
            .ok_or_else(|| Error::UnsupportedLoader(loader.to_string()))
    }

    /// Registered loaders sorted by id.
    pub fn loaders(&self) -> Vec<LoaderId> {
        let mut ids: Vec<LoaderId> = self.providers.keys().copied().collect();
        ids.sort_by_key(|id| id.as_str());
        ids
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
