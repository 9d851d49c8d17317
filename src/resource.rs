//! Resource Store - temporary, revocable handles to in-memory blobs
//!
//! Handles render as `blob:<uuid>`. A revoked handle never resolves again.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

pub const MIME_SVG: &str = "image/svg+xml;charset=utf-8";
pub const MIME_PNG: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(Uuid);

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { mime: mime.into(), bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Shared blob table. Cloning yields another view of the same table.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    blobs: Arc<Mutex<HashMap<ResourceHandle, Arc<Blob>>>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<ResourceHandle, Arc<Blob>>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create(&self, blob: Blob) -> ResourceHandle {
        let handle = ResourceHandle(Uuid::new_v4());
        log::debug!("created {} ({}, {} bytes)", handle, blob.mime, blob.len());
        self.table().insert(handle, Arc::new(blob));
        handle
    }

    /// Register a blob whose handle is revoked when the guard drops
    pub fn create_scoped(&self, blob: Blob) -> ScopedResource {
        let handle = self.create(blob);
        ScopedResource {
            store: self.clone(),
            handle,
            persisted: false,
        }
    }

    pub fn resolve(&self, handle: &ResourceHandle) -> Option<Arc<Blob>> {
        self.table().get(handle).cloned()
    }

    /// Returns `true` if the handle was live
    pub fn revoke(&self, handle: &ResourceHandle) -> bool {
        let removed = self.table().remove(handle).is_some();
        if removed {
            log::debug!("revoked {}", handle);
        }
        removed
    }

    pub fn live_count(&self) -> usize {
        self.table().len()
    }
}

/// RAII guard for a handle that must not outlive the current operation
#[derive(Debug)]
pub struct ScopedResource {
    store: ResourceStore,
    handle: ResourceHandle,
    persisted: bool,
}

impl ScopedResource {
    pub fn handle(&self) -> ResourceHandle {
        self.handle
    }

    /// Keep the resource alive past the guard
    pub fn persist(mut self) -> ResourceHandle {
        self.persisted = true;
        self.handle
    }
}

impl Drop for ScopedResource {
    fn drop(&mut self) {
        if !self.persisted {
            self.store.revoke(&self.handle);
        }
    }
}
