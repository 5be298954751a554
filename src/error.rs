//! Error taxonomy for the bridge.
//!
//! Every failure is recoverable and surfaced to the caller. Disposal never
//! fails, so it has no variant here.

use crate::registry::{ResourceId, ResourceKind};
use thiserror::Error;

/// Convenience type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Wrong shape of input at a boundary call. Raised before any native call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Token or handle refers to a disposed, foreign or mistyped resource.
    #[error("invalid handle {id}: {reason}")]
    InvalidHandle { id: ResourceId, reason: &'static str },

    /// libclang returned no translation unit.
    #[error("failed to parse '{filename}' (libclang error code {code})")]
    ParseFailed { filename: String, code: i32 },

    /// libclang could not allocate the requested resource.
    #[error("native allocation failed while creating {0}")]
    ResourceExhausted(ResourceKind),

    /// No libclang shared library could be loaded on this thread.
    #[error("libclang is unavailable: {0}")]
    LibraryUnavailable(String),
}

impl BridgeError {
    pub(crate) fn invalid_handle(id: ResourceId, reason: &'static str) -> Self {
        Self::InvalidHandle { id, reason }
    }

    /// True for errors caused by a stale or foreign token.
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self, Self::InvalidHandle { .. })
    }
}
