//! Core trait definitions for tree nodes and resource loading.
//!
//! `Node` is the read-only capability every element of a decoded assessment
//! tree exposes to the presentation layer. `ResourceLoader` is the opaque
//! capability the resolution pass consumes; concrete implementations live in
//! the `cogtask-loaders` crate.

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Node capability
// ---------------------------------------------------------------------------

/// Read-only view of a node in the assessment tree.
///
/// Implemented by the assessment root, every step variant, and input fields.
/// The presentation layer works against this trait and the public fields of
/// the concrete types; it never sees resolution internals.
pub trait Node {
    /// Identifier of this node, unique within its parent's child list.
    fn identifier(&self) -> &str;

    /// Short display title, if the document provided one.
    fn title(&self) -> Option<&str> {
        None
    }

    /// Longer display text, if the document provided one.
    fn detail(&self) -> Option<&str> {
        None
    }

    /// The resource context attached by the resolution pass.
    ///
    /// `None` until the tree has been resolved.
    fn resolved_context(&self) -> Option<&ResourceContext>;
}

// ---------------------------------------------------------------------------
// Resource loading
// ---------------------------------------------------------------------------

/// Capability for retrieving external resource bytes by reference.
///
/// The contract is deliberately small: given a reference string, return the
/// bytes or a not-found signal. Caching and retry policy, if any, belong to
/// the implementation, not to this trait.
pub trait ResourceLoader: Send + Sync {
    /// Human-readable loader name (e.g. "memory", "fileSystem").
    fn name(&self) -> &str;

    /// Load the resource stored under `reference`.
    fn load(&self, reference: &str) -> Result<Vec<u8>, LoadError>;
}

/// Bundle and locale scope used to interpret relative resource references.
///
/// A context is passed into the resolution pass, narrowed by per-node bundle
/// overrides on the way down, and attached to every resolved node so a later
/// presentation layer can re-resolve relative paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContext {
    /// Identifier of the bundle resources are looked up in.
    pub bundle_identifier: String,
    /// Locale tag for localized content (e.g. "en", "es-MX").
    pub locale: String,
}

impl ResourceContext {
    pub fn new(bundle_identifier: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            bundle_identifier: bundle_identifier.into(),
            locale: locale.into(),
        }
    }

    /// Derive a context scoped to a different bundle, keeping the locale.
    pub fn with_bundle(&self, bundle_identifier: &str) -> Self {
        Self {
            bundle_identifier: bundle_identifier.to_string(),
            locale: self.locale.clone(),
        }
    }

    /// The loader-facing reference string for a resource name relative to
    /// this context.
    pub fn reference_for(&self, name: &str) -> String {
        format!("{}/{}", self.bundle_identifier, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_bundle_relative() {
        let ctx = ResourceContext::new("mtb_flanker", "en");
        assert_eq!(ctx.reference_for("arrow_left.png"), "mtb_flanker/arrow_left.png");
    }

    #[test]
    fn with_bundle_keeps_locale() {
        let ctx = ResourceContext::new("app", "es-MX");
        let narrowed = ctx.with_bundle("shared_instructions");
        assert_eq!(narrowed.bundle_identifier, "shared_instructions");
        assert_eq!(narrowed.locale, "es-MX");
        // the original context is untouched
        assert_eq!(ctx.bundle_identifier, "app");
    }

    #[test]
    fn context_serde_roundtrip() {
        let ctx = ResourceContext::new("bundle_a", "en");
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("bundleIdentifier"));
        let back: ResourceContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }
}
