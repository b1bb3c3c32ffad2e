//! Document and resolution error types.
//!
//! These error types represent failures when decoding a serialized assessment
//! or resolving its resource references. `LoadError` is defined in
//! `cogtask-core` so the resolution pass can classify loader failures
//! (not-found vs. read failure) without string matching; concrete loaders
//! live in the `cogtask-loaders` crate.

use thiserror::Error;

/// Errors that can occur while decoding a serialized assessment document.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A required field is missing or has an unusable value.
    #[error("malformed document: field `{field}` on node `{node_id}`: {message}")]
    MalformedDocument {
        field: String,
        node_id: String,
        message: String,
    },

    /// A step carried a type tag with no registered constructor.
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    /// The input was not valid JSON at all.
    #[error("document is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl DecodeError {
    /// Returns the identifier of the node the error points at, if known.
    pub fn node_identifier(&self) -> Option<&str> {
        match self {
            DecodeError::MalformedDocument { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    /// Returns the offending type tag for unknown-type failures.
    pub fn unknown_tag(&self) -> Option<&str> {
        match self {
            DecodeError::UnknownNodeType(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Errors returned by a [`ResourceLoader`](crate::traits::ResourceLoader).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The loader has no resource under the given reference.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The resource exists but could not be read.
    #[error("failed to read resource `{reference}`: {message}")]
    Read { reference: String, message: String },
}

impl LoadError {
    /// Returns `true` if this is a plain not-found signal rather than a
    /// read failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

/// Errors that can occur during the resource-resolution pass.
///
/// Resolution fails only when the loader fails for a resource marked
/// required; optional resources degrade to "unbound".
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to resolve required resource `{reference}`: {source}")]
    Resource {
        reference: String,
        #[source]
        source: LoadError,
    },
}

impl ResolveError {
    /// Returns the loader-facing reference string of the failed resource.
    pub fn reference(&self) -> &str {
        match self {
            ResolveError::Resource { reference, .. } => reference,
        }
    }
}
