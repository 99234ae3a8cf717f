use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GrainerError, Result};
use crate::grain::{AddGrain, F3kdbGrain, Grainer, GrainerConfig, PlaceboGrain};

type GrainerFactory = Box<dyn Fn(&GrainerConfig) -> Result<Arc<dyn Grainer>> + Send + Sync>;

/// Registry for building grain algorithms by name
///
/// Each entry is a factory that turns a [`GrainerConfig`] into a ready grainer,
/// so configuration files can refer to algorithms by name.
pub struct GrainerRegistry {
    grainers: HashMap<String, GrainerFactory>,
}

impl GrainerRegistry {
    /// Create a new registry with all built-in grainers
    pub fn new() -> Self {
        let mut registry = Self {
            grainers: HashMap::new(),
        };
        registry.register_builtin_grainers();
        registry
    }

    fn register_builtin_grainers(&mut self) {
        self.register("add", |config| Ok(Arc::new(AddGrain::from_config(config)?)));
        self.register("placebo", |config| Ok(Arc::new(PlaceboGrain::from_config(config)?)));
        self.register("f3kdb", |config| Ok(Arc::new(F3kdbGrain::from_config(config)?)));
    }

    /// Register a custom grainer
    ///
    /// # Arguments
    ///
    /// * `name` - Unique name for the grainer
    /// * `factory` - Function that builds an instance from its config
    pub fn register<S, F>(&mut self, name: S, factory: F)
    where
        S: Into<String>,
        F: Fn(&GrainerConfig) -> Result<Arc<dyn Grainer>> + Send + Sync + 'static,
    {
        self.grainers.insert(name.into(), Box::new(factory));
    }

    /// Build the grainer named in `config`
    pub fn create(&self, config: &GrainerConfig) -> Result<Arc<dyn Grainer>> {
        let factory = self
            .grainers
            .get(&config.name)
            .ok_or_else(|| GrainerError::NotFound { name: config.name.clone() })?;
        factory(config)
    }

    /// Get all available grainer names, sorted
    pub fn available_grainers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.grainers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_grainer(&self, name: &str) -> bool {
        self.grainers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.grainers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grainers.is_empty()
    }
}

impl Default for GrainerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_grainers_available() {
        let registry = GrainerRegistry::new();

        assert!(registry.has_grainer("add"));
        assert!(registry.has_grainer("placebo"));
        assert!(registry.has_grainer("f3kdb"));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.available_grainers(), vec!["add", "f3kdb", "placebo"]);
    }

    #[test]
    fn test_create_grainer() {
        let registry = GrainerRegistry::new();

        let add = registry.create(&GrainerConfig::named("add").set("seed", 3)).unwrap();
        assert_eq!(add.name(), "add");

        let unknown = registry.create(&GrainerConfig::named("unknown"));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_builtin_metadata_lists_parameters() {
        let registry = GrainerRegistry::new();
        for name in registry.available_grainers() {
            let grainer = registry.create(&GrainerConfig::named(name.as_str())).unwrap();
            let metadata = grainer.metadata();
            assert!(!grainer.description().is_empty());
            assert!(metadata.performance_impact > 0.0 && metadata.performance_impact <= 1.0);
            assert!(metadata.optional_parameters.iter().any(|(key, _)| key == "seed"), "{}", name);
        }
    }

    #[test]
    fn test_custom_grainer_registration() {
        let mut registry = GrainerRegistry::new();
        registry.register("static_add", |_| Ok(Arc::new(AddGrain::new(1, true))));

        assert!(registry.has_grainer("static_add"));
        assert_eq!(registry.len(), 4);
        let grainer = registry.create(&GrainerConfig::named("static_add")).unwrap();
        assert!(grainer.metadata().deterministic);
    }
}
