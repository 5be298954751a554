//! Boundary-safe tokens for cursors and types.
//!
//! A token is a copy of libclang's small value struct plus the id of the
//! translation unit it came from. The id is only used to check liveness; the
//! token never owns anything. `HandleCodec::unwrap_*` is the one place that
//! turns a token back into a native value, and it refuses tokens whose unit
//! is gone.

use crate::error::{BridgeError, Result};
use crate::registry::{ResourceId, ResourceKind, ResourceRegistry};
use clang_sys::{CXCursor, CXType};
use std::fmt;

/// A node of a parsed translation unit.
#[derive(Clone, Copy)]
pub struct CursorToken {
    raw: CXCursor,
    owner: ResourceId,
}

impl CursorToken {
    /// Translation unit this cursor belongs to
    pub fn owner(&self) -> ResourceId {
        self.owner
    }

    /// libclang cursor kind, readable without touching native code.
    pub fn raw_kind(&self) -> i32 {
        self.raw.kind as i32
    }
}

impl PartialEq for CursorToken {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
            && self.raw.kind == other.raw.kind
            && self.raw.xdata == other.raw.xdata
            && self.raw.data == other.raw.data
    }
}

impl Eq for CursorToken {}

impl fmt::Debug for CursorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorToken")
            .field("kind", &self.raw.kind)
            .field("owner", &self.owner)
            .finish()
    }
}

/// A type entity of a parsed translation unit.
#[derive(Clone, Copy)]
pub struct TypeToken {
    raw: CXType,
    owner: ResourceId,
}

impl TypeToken {
    pub fn owner(&self) -> ResourceId {
        self.owner
    }

    pub fn raw_kind(&self) -> i32 {
        self.raw.kind as i32
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.raw.kind == other.raw.kind && self.raw.data == other.raw.data
    }
}

impl Eq for TypeToken {}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeToken")
            .field("kind", &self.raw.kind)
            .field("owner", &self.owner)
            .finish()
    }
}

/// Wraps native values into tokens and validates tokens on the way back.
#[derive(Clone, Copy)]
pub struct HandleCodec<'r> {
    registry: &'r ResourceRegistry,
}

impl<'r> HandleCodec<'r> {
    pub fn new(registry: &'r ResourceRegistry) -> Self {
        HandleCodec { registry }
    }

    pub fn wrap_cursor(&self, raw: CXCursor, owner: ResourceId) -> CursorToken {
        debug_assert_eq!(owner.kind(), ResourceKind::TranslationUnit);
        CursorToken { raw, owner }
    }

    pub fn wrap_type(&self, raw: CXType, owner: ResourceId) -> TypeToken {
        debug_assert_eq!(owner.kind(), ResourceKind::TranslationUnit);
        TypeToken { raw, owner }
    }

    pub fn unwrap_cursor(&self, token: &CursorToken) -> Result<CXCursor> {
        self.check_owner(token.owner)?;
        Ok(token.raw)
    }

    pub fn unwrap_type(&self, token: &TypeToken) -> Result<CXType> {
        self.check_owner(token.owner)?;
        Ok(token.raw)
    }

    fn check_owner(&self, owner: ResourceId) -> Result<()> {
        if owner.kind() != ResourceKind::TranslationUnit {
            return Err(BridgeError::invalid_handle(owner, "token is not owned by a translation unit"));
        }
        if !self.registry.is_alive(owner) {
            return Err(BridgeError::invalid_handle(
                owner,
                "translation unit is disposed or belongs to another session",
            ));
        }
        Ok(())
    }
}
