//! Registry of shared memory regions visible to the secure domain.
//!
//! Regions are registered by the client and looked up by id on the secure
//! side while an invocation is in flight. Registration is bounded by a byte
//! quota, standing in for the limited shared memory pool of a real TEE.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::AllocationError;
use crate::protocol::ShmId;
use crate::shm::SharedMemoryRegion;

/// Default registration quota: 256 MB.
pub const DEFAULT_SHM_QUOTA: usize = 256 * 1024 * 1024;

/// Thread-safe registry of shared memory regions.
/// Uses DashMap so the client and the secure worker never contend on a lock.
#[derive(Debug)]
pub struct SharedMemoryRegistry {
    regions: DashMap<ShmId, Arc<SharedMemoryRegion>>,
    next_id: AtomicU64,
    used_bytes: AtomicUsize,
    quota_bytes: usize,
}

impl SharedMemoryRegistry {
    /// Create an empty registry with the given byte quota.
    pub fn new(quota_bytes: usize) -> Self {
        Self {
            regions: DashMap::new(),
            next_id: AtomicU64::new(1),
            used_bytes: AtomicUsize::new(0),
            quota_bytes,
        }
    }

    /// Create a registry wrapped in an Arc for sharing across domains.
    pub fn new_shared(quota_bytes: usize) -> Arc<Self> {
        Arc::new(Self::new(quota_bytes))
    }

    /// Create, map and register a region of `capacity` bytes.
    pub fn register(
        &self,
        capacity: usize,
    ) -> Result<(ShmId, Arc<SharedMemoryRegion>), AllocationError> {
        if capacity == 0 {
            return Err(AllocationError::InvalidSize { size: capacity });
        }

        // Reserve quota before touching the OS.
        self.used_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(capacity)
                    .filter(|&total| total <= self.quota_bytes)
            })
            .map_err(|used| AllocationError::QuotaExceeded {
                requested: capacity,
                available: self.quota_bytes.saturating_sub(used),
                quota: self.quota_bytes,
            })?;

        let id = ShmId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let name = format!("aes-perf-{}-{}", std::process::id(), id.value());

        let region = match SharedMemoryRegion::create(&name, capacity) {
            Ok(region) => Arc::new(region),
            Err(e) => {
                self.used_bytes.fetch_sub(capacity, Ordering::AcqRel);
                return Err(e);
            }
        };

        self.regions.insert(id, Arc::clone(&region));
        tracing::debug!(shm = %id, capacity = capacity, "Registered shared memory");

        Ok((id, region))
    }

    /// Unregister a region. Returns false if it was not registered.
    pub fn release(&self, id: ShmId) -> bool {
        match self.regions.remove(&id) {
            Some((_, region)) => {
                self.used_bytes
                    .fetch_sub(region.capacity(), Ordering::AcqRel);
                tracing::debug!(shm = %id, "Released shared memory");
                true
            }
            None => false,
        }
    }

    /// Look up a registered region.
    pub fn lookup(&self, id: ShmId) -> Option<Arc<SharedMemoryRegion>> {
        self.regions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Bytes currently registered.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(Ordering::Acquire)
    }

    pub fn quota_bytes(&self) -> usize {
        self.quota_bytes
    }
}

impl Default for SharedMemoryRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SHM_QUOTA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_lookup_release() {
        let registry = SharedMemoryRegistry::new(4096);
        let (id, region) = registry.register(1024).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.used_bytes(), 1024);
        assert_eq!(registry.lookup(id).unwrap().capacity(), region.capacity());

        assert!(registry.release(id));
        assert!(!registry.release(id));
        assert!(registry.lookup(id).is_none());
        assert_eq!(registry.used_bytes(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_quota_exhaustion() {
        let registry = SharedMemoryRegistry::new(1000);
        let (_id, _region) = registry.register(600).unwrap();

        match registry.register(600) {
            Err(AllocationError::QuotaExceeded {
                requested,
                available,
                quota,
            }) => {
                assert_eq!(requested, 600);
                assert_eq!(available, 400);
                assert_eq!(quota, 1000);
            }
            other => panic!("expected quota error, got {:?}", other),
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.used_bytes(), 600);
    }

    #[test]
    fn test_zero_size_rejected() {
        let registry = SharedMemoryRegistry::default();
        assert!(matches!(
            registry.register(0),
            Err(AllocationError::InvalidSize { size: 0 })
        ));
    }
}
