//! Named extension registry.

use std::collections::HashMap;

use super::legacy::LegacyExtension;
use super::{Extension, ExtensionSource, std_ext_name, validate};
use crate::error::{ConfigurationError, ValidationError};

/// Extensions registered by name, resolved when a converter is built.
///
/// The registry is a plain value owned by whoever configures converters;
/// there is no process-wide table.
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    extensions: HashMap<String, Vec<Extension>>,
    legacy: HashMap<String, LegacyExtension>,
}

impl ExtensionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store extensions under `name`.
    ///
    /// Registering the same name again replaces the previous extensions.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure; nothing is stored then.
    pub fn register(
        &mut self,
        name: &str,
        source: impl Into<ExtensionSource>,
    ) -> Result<(), ValidationError> {
        let extensions = validate(source, Some(name))?;
        let key = std_ext_name(name);
        self.legacy.remove(&key);
        self.extensions.insert(key, extensions);
        Ok(())
    }

    /// Store a legacy extension, expanded each time it is resolved.
    pub fn register_legacy(&mut self, name: &str, extension: LegacyExtension) {
        let key = std_ext_name(name);
        self.extensions.remove(&key);
        self.legacy.insert(key, extension);
    }

    /// Extensions stored under `name`.
    pub fn get(&self, name: &str) -> Option<&[Extension]> {
        self.extensions.get(&std_ext_name(name)).map(Vec::as_slice)
    }

    /// Remove `name`; returns whether it was registered.
    pub fn remove(&mut self, name: &str) -> bool {
        let key = std_ext_name(name);
        let removed = self.extensions.remove(&key).is_some();
        self.legacy.remove(&key).is_some() || removed
    }

    /// Drop every registration.
    pub fn reset(&mut self) {
        self.extensions.clear();
        self.legacy.clear();
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .extensions
            .keys()
            .chain(self.legacy.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    /// Extensions to load for `name`.
    ///
    /// # Errors
    ///
    /// Fails when nothing is registered under `name`, or when a legacy
    /// extension produces an invalid spec.
    pub fn resolve(&self, name: &str) -> Result<Vec<Extension>, ConfigurationError> {
        let key = std_ext_name(name);
        if let Some(extensions) = self.extensions.get(&key) {
            return Ok(extensions.clone());
        }
        match self.legacy.get(&key) {
            Some(legacy) => Ok(legacy.load(name)?),
            None => Err(ConfigurationError::UnknownExtension(name.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{ExtensionKind, ExtensionSpec};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_then_get() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register("Twitter-Handle", ExtensionSpec::new().kind("language").regex("a").replace("b"))
            .unwrap();
        let exts = registry.get("twitterhandle").unwrap();
        assert_eq!(exts.len(), 1);
        assert_eq!(exts[0].kind(), ExtensionKind::Lang);
        assert_eq!(registry.names(), vec!["twitterhandle"]);
    }

    #[test]
    fn test_invalid_registration_stores_nothing() {
        let mut registry = ExtensionRegistry::new();
        let err = registry.register("broken", ExtensionSpec::lang()).unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(registry.get("broken").is_none());
    }

    #[test]
    fn test_remove_and_reset() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register("one", ExtensionSpec::output().regex("x").replace("y"))
            .unwrap();
        registry
            .register("two", ExtensionSpec::output().regex("x").replace("y"))
            .unwrap();
        assert!(registry.remove("one"));
        assert!(!registry.remove("one"));
        registry.reset();
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = ExtensionRegistry::new();
        assert!(matches!(
            registry.resolve("missing"),
            Err(ConfigurationError::UnknownExtension(name)) if name == "missing"
        ));
    }
}
