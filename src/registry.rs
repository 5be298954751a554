//! Ownership tracker for native resources.
//!
//! The registry is the only owner of indices and translation units. Callers
//! hold `ResourceId`s, which are plain data and never keep anything alive.
//! Releasing a resource means dropping the owner stored here, so the native
//! dispose call lives in each owner's `Drop` impl and runs exactly once.

use crate::error::{BridgeError, Result};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(1);

/// Category of a tracked native resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Index,
    TranslationUnit,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Index => "index",
            ResourceKind::TranslationUnit => "translation-unit",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a resource inside one registry.
///
/// Serials are never reused, so an id stays dead once disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    registry: u32,
    serial: u32,
    kind: ResourceKind,
}

impl ResourceId {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.kind, self.serial, self.registry)
    }
}

struct Entry {
    kind: ResourceKind,
    resource: Box<dyn Any>,
}

/// Tracks live native resources for one session.
///
/// All operations take `&self` so a host callback running inside a traversal
/// may still query or dispose. No borrow is held while an owner is dropped.
pub struct ResourceRegistry {
    id: u32,
    next_serial: Cell<u32>,
    live: RefCell<BTreeMap<u32, Entry>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        ResourceRegistry {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            next_serial: Cell::new(1),
            live: RefCell::new(BTreeMap::new()),
        }
    }

    /// Run `constructor` and track its result under a fresh id.
    ///
    /// A failing constructor registers nothing; whatever it built has already
    /// been released by its own `Drop` on the way out.
    pub fn acquire<R, F>(&self, kind: ResourceKind, constructor: F) -> Result<ResourceId>
    where
        R: 'static,
        F: FnOnce() -> Result<R>,
    {
        let resource = constructor()?;
        let serial = self.next_serial.get();
        self.next_serial.set(serial + 1);

        let id = ResourceId {
            registry: self.id,
            serial,
            kind,
        };
        self.live.borrow_mut().insert(
            serial,
            Entry {
                kind,
                resource: Box::new(resource),
            },
        );
        debug!("Acquired {}", id);
        Ok(id)
    }

    /// Release the resource behind `id`.
    ///
    /// Returns true if this call released it. Disposing a dead, foreign or
    /// never-created id is a no-op.
    pub fn dispose(&self, id: ResourceId) -> bool {
        if !self.is_alive(id) {
            debug!("Dispose of {} ignored (not alive)", id);
            return false;
        }
        let released = self.live.borrow_mut().remove(&id.serial);
        // Dropping here, after the borrow ends, runs the native dispose.
        drop(released);
        debug!("Disposed {}", id);
        true
    }

    pub fn is_alive(&self, id: ResourceId) -> bool {
        id.registry == self.id
            && self
                .live
                .borrow()
                .get(&id.serial)
                .is_some_and(|entry| entry.kind == id.kind)
    }

    /// Borrow the owner behind `id` for the duration of `f`.
    ///
    /// `f` must not dispose resources of this registry.
    pub fn with<R, T, F>(&self, id: ResourceId, f: F) -> Result<T>
    where
        R: 'static,
        F: FnOnce(&R) -> T,
    {
        if id.registry != self.id {
            return Err(BridgeError::invalid_handle(id, "belongs to another session"));
        }
        let live = self.live.borrow();
        let entry = live
            .get(&id.serial)
            .ok_or_else(|| BridgeError::invalid_handle(id, "resource has been disposed"))?;
        if entry.kind != id.kind {
            return Err(BridgeError::invalid_handle(id, "resource kind mismatch"));
        }
        let resource = entry
            .resource
            .downcast_ref::<R>()
            .ok_or_else(|| BridgeError::invalid_handle(id, "resource type mismatch"))?;
        Ok(f(resource))
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    /// Release everything, newest first.
    pub fn dispose_all(&self) {
        loop {
            let newest = self.live.borrow_mut().pop_last();
            match newest {
                Some((serial, entry)) => {
                    debug!("Disposing {}#{}@{} at session end", entry.kind, serial, self.id);
                    drop(entry);
                }
                None => break,
            }
        }
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ResourceRegistry {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
