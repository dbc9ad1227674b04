//! Compatibility adapter for function-shaped extensions.
//!
//! Older extensions were a single function that, given a converter, returned
//! the real extension list. They are still accepted through
//! [`ExtensionRegistry::register_legacy`](super::ExtensionRegistry::register_legacy)
//! and expanded against a scratch converter when resolved. New code should
//! register [`ExtensionSpec`] values directly.

use std::fmt;
use std::sync::Arc;

use super::{Extension, ExtensionSpec, validate};
use crate::converter::Converter;
use crate::error::ValidationError;

type LegacyFn = dyn Fn(&Converter) -> Vec<ExtensionSpec> + Send + Sync;

/// A function-shaped extension.
#[derive(Clone)]
pub struct LegacyExtension(Arc<LegacyFn>);

impl LegacyExtension {
    /// Wrap a legacy extension function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Converter) -> Vec<ExtensionSpec> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Expand and validate.
    pub(crate) fn load(&self, name: &str) -> Result<Vec<Extension>, ValidationError> {
        tracing::warn!(
            extension = name,
            "Loading extension through the legacy adapter, register specs directly instead"
        );
        let scratch = Converter::default();
        validate((self.0)(&scratch), Some(name))
    }
}

impl fmt::Debug for LegacyExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LegacyExtension")
    }
}
