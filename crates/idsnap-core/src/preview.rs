//! Revocable preview handles for selected media.
//!
//! A [`PreviewResource`] is the only owner of its URL and revokes it on drop,
//! so replacing, clearing, or tearing down an intake always releases the
//! handle exactly once.

use crate::types::MediaAsset;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Host facility that mints and revokes object URLs for in-memory bytes.
///
/// In a browser this is `URL.createObjectURL` / `URL.revokeObjectURL`.
pub trait PreviewHost: Send + Sync {
    fn create(&self, asset: &MediaAsset) -> String;
    fn revoke(&self, url: &str);
}

/// A live preview URL. Dropping it revokes the URL with its host.
pub struct PreviewResource {
    url: String,
    host: Arc<dyn PreviewHost>,
}

impl PreviewResource {
    pub fn acquire(host: Arc<dyn PreviewHost>, asset: &MediaAsset) -> Self {
        let url = host.create(asset);
        tracing::debug!(url = %url, file = %asset.name, "preview created");
        Self { url, host }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewResource {
    fn drop(&mut self) {
        tracing::debug!(url = %self.url, "preview revoked");
        self.host.revoke(&self.url);
    }
}

impl std::fmt::Debug for PreviewResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewResource").field("url", &self.url).finish()
    }
}

/// Bytes registered behind a preview URL.
#[derive(Debug, Clone)]
pub struct Blob {
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

/// In-process object URL registry for hosts without a browser.
///
/// URLs take the form `blob:idsnap/<uuid>` and resolve until revoked.
#[derive(Debug, Default)]
pub struct BlobRegistry {
    blobs: Mutex<HashMap<String, Blob>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes behind a live URL, if it has not been revoked.
    pub fn resolve(&self, url: &str) -> Option<Blob> {
        self.lock().get(url).cloned()
    }

    /// Number of URLs currently live.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Blob>> {
        // The map stays consistent even if a holder panicked mid-insert.
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PreviewHost for BlobRegistry {
    fn create(&self, asset: &MediaAsset) -> String {
        let url = format!("blob:idsnap/{}", uuid::Uuid::new_v4());
        let blob = Blob {
            mime: asset.mime.clone(),
            bytes: Arc::from(asset.bytes.as_slice()),
        };
        self.lock().insert(url.clone(), blob);
        url
    }

    fn revoke(&self, url: &str) {
        if self.lock().remove(url).is_none() {
            tracing::debug!(url, "revoke of unknown preview URL ignored");
        }
    }
}
