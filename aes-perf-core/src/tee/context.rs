// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::AesPerfResult;
use crate::secure::{SecureCipherProcessor, DEFAULT_KEY_MATERIAL};
use crate::shm::{SharedMemoryRegistry, DEFAULT_SHM_QUOTA};
use crate::tee::TeeSession;

/// Connection to the secure domain. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TeeContext {
    registry: Arc<SharedMemoryRegistry>,
    next_session: Arc<AtomicU32>,
}

impl TeeContext {
    /// Create a context whose shared memory registrations may not exceed
    /// `shm_quota` bytes in total.
    pub fn new(shm_quota: usize) -> Self {
        Self {
            registry: SharedMemoryRegistry::new_shared(shm_quota),
            next_session: Arc::new(AtomicU32::new(1)),
        }
    }

    /// Registry shared by the client and every session of this context.
    pub fn registry(&self) -> &Arc<SharedMemoryRegistry> {
        &self.registry
    }

    /// Open a session backed by the default key material.
    pub fn open_session(&self) -> AesPerfResult<TeeSession> {
        self.open_session_with_key(DEFAULT_KEY_MATERIAL.to_vec())
    }

    /// Open a session whose secure side holds `key_material`.
    pub fn open_session_with_key(&self, key_material: Vec<u8>) -> AesPerfResult<TeeSession> {
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let processor =
            SecureCipherProcessor::with_key_material(Arc::clone(&self.registry), id, key_material);
        TeeSession::spawn(self.clone(), id, processor)
    }
}

impl Default for TeeContext {
    fn default() -> Self {
        Self::new(DEFAULT_SHM_QUOTA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_get_distinct_ids() {
        let context = TeeContext::default();
        let first = context.open_session().unwrap();
        let second = context.open_session().unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(context.registry().quota_bytes(), DEFAULT_SHM_QUOTA);
    }

    #[test]
    fn test_clones_share_registry() {
        let context = TeeContext::new(4096);
        let clone = context.clone();
        let (_id, _region) = context.registry().register(1024).unwrap();
        assert_eq!(clone.registry().used_bytes(), 1024);
    }
}
