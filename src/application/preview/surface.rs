//! Isolation boundary between composed documents and the host page.
//!
//! The core never isolates anything itself. It asks an [`IsolationHost`] to
//! create a fresh surface per version and to destroy the previous one, so no
//! script state survives a reload.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::controller::RenderVersion;

/// Identity of one live surface: a document version within a session scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle {
    pub scope: Uuid,
    pub version: u64,
}

pub trait IsolationHost: Send + Sync {
    /// Create a new isolated surface loaded with `version`'s document.
    fn create(&self, scope: Uuid, version: &RenderVersion) -> SurfaceHandle;

    /// Destroy a surface, discarding its script state. Unknown handles are ignored.
    fn destroy(&self, handle: SurfaceHandle);
}

/// Server-side host: each mounted document is addressable under its own URL and
/// served with a sandboxing content security policy. Destroyed documents are gone.
#[derive(Debug, Default)]
pub struct DocumentSurfaces {
    documents: DashMap<SurfaceHandle, Arc<str>>,
}

impl DocumentSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, scope: Uuid, version: u64) -> Option<Arc<str>> {
        self.documents
            .get(&SurfaceHandle { scope, version })
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl IsolationHost for DocumentSurfaces {
    fn create(&self, scope: Uuid, version: &RenderVersion) -> SurfaceHandle {
        let handle = SurfaceHandle {
            scope,
            version: version.id,
        };
        self.documents.insert(handle, Arc::clone(&version.document));
        handle
    }

    fn destroy(&self, handle: SurfaceHandle) {
        self.documents.remove(&handle);
    }
}

/// Keeps exactly one surface mounted for a scope.
#[derive(Debug)]
pub struct SurfaceMount<H: IsolationHost> {
    host: Arc<H>,
    scope: Uuid,
    mounted: Option<SurfaceHandle>,
}

impl<H: IsolationHost> SurfaceMount<H> {
    pub fn new(host: Arc<H>, scope: Uuid) -> Self {
        Self {
            host,
            scope,
            mounted: None,
        }
    }

    /// Replace the mounted surface with a fresh one for `version`.
    pub fn mount(&mut self, version: &RenderVersion) -> SurfaceHandle {
        let handle = self.host.create(self.scope, version);
        if let Some(previous) = self.mounted.replace(handle) {
            if previous != handle {
                self.host.destroy(previous);
            }
        }
        handle
    }

    pub fn unmount(&mut self) {
        if let Some(handle) = self.mounted.take() {
            self.host.destroy(handle);
        }
    }

    pub fn mounted(&self) -> Option<SurfaceHandle> {
        self.mounted
    }
}

impl<H: IsolationHost> Drop for SurfaceMount<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}
