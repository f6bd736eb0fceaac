// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Client-owned shared buffers used as `Process` input and output.
//!
//! `SharedBuffers` registers one region (in place) or two regions (separate
//! input and output) and releases them exactly once, either explicitly or
//! on drop, so every exit path of a run returns the memory.

use std::sync::Arc;

use crate::error::AllocationError;
use crate::protocol::{MemRef, ShmId};
use crate::shm::{SharedMemoryRegion, SharedMemoryRegistry};

/// Direction of transfer across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Read by the secure domain.
    Input,
    /// Written by the secure domain.
    Output,
    /// Read and then overwritten in a single pass.
    InOut,
}

/// One registered region as seen by the client.
#[derive(Debug)]
pub struct SharedBuffer {
    id: ShmId,
    region: Arc<SharedMemoryRegion>,
    current_size: usize,
    direction: TransferDirection,
}

impl SharedBuffer {
    pub fn id(&self) -> ShmId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.region.capacity()
    }

    /// Bytes of meaningful content. For output regions this is the size the
    /// secure domain reported after the last `Process` through a bound
    /// client.
    pub fn current_size(&self) -> usize {
        self.current_size
    }

    /// Set the meaningful size. Clamped to capacity.
    pub fn set_current_size(&mut self, size: usize) {
        self.current_size = size.min(self.capacity());
    }

    pub fn direction(&self) -> TransferDirection {
        self.direction
    }

    /// Window covering the whole capacity, as passed to `Process`.
    pub fn memref(&self) -> MemRef {
        MemRef {
            shm: self.id,
            offset: 0,
            size: self.capacity(),
        }
    }

    /// The full region contents.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the secure domain only touches the region during `Process`.
        // `CommandProtocolClient::bind` holds `&mut SharedBuffers` for the
        // client's lifetime, and `process` takes the client mutably, so no
        // view obtained here can be alive across a call.
        unsafe { self.region.slice(0, self.capacity()) }.unwrap_or(&[])
    }

    /// The full region contents, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let capacity = self.capacity();
        // SAFETY: as for `as_slice`; `&mut self` excludes other client views.
        unsafe { self.region.slice_mut(0, capacity) }.unwrap_or(&mut [])
    }
}

/// The input/output buffer pair for a run.
#[derive(Debug)]
pub struct SharedBuffers {
    registry: Arc<SharedMemoryRegistry>,
    /// One entry when in place, otherwise `[input, output]`.
    regions: Vec<SharedBuffer>,
    in_place: bool,
}

impl SharedBuffers {
    /// Register the regions for a run of `size`-byte buffers.
    ///
    /// On failure nothing stays registered.
    pub fn allocate(
        registry: &Arc<SharedMemoryRegistry>,
        size: usize,
        in_place: bool,
    ) -> Result<Self, AllocationError> {
        let mut buffers = Self {
            registry: Arc::clone(registry),
            regions: Vec::with_capacity(2),
            in_place,
        };

        let directions: &[TransferDirection] = if in_place {
            &[TransferDirection::InOut]
        } else {
            &[TransferDirection::Input, TransferDirection::Output]
        };

        for &direction in directions {
            // An early return drops `buffers`, releasing what was registered.
            let (id, region) = registry.register(size)?;
            buffers.regions.push(SharedBuffer {
                id,
                region,
                current_size: size,
                direction,
            });
        }

        tracing::debug!(size = size, in_place = in_place, regions = buffers.regions.len(), "Allocated shared buffers");
        Ok(buffers)
    }

    pub fn in_place(&self) -> bool {
        self.in_place
    }

    /// Number of distinct registered regions (1 in place, otherwise 2).
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Region passed as the `Process` input.
    pub fn input(&self) -> &SharedBuffer {
        &self.regions[0]
    }

    pub fn input_mut(&mut self) -> &mut SharedBuffer {
        &mut self.regions[0]
    }

    /// Region passed as the `Process` output; the input region when in place.
    pub fn output(&self) -> &SharedBuffer {
        &self.regions[self.regions.len() - 1]
    }

    pub fn output_mut(&mut self) -> &mut SharedBuffer {
        let last = self.regions.len() - 1;
        &mut self.regions[last]
    }

    /// Unregister all regions now instead of at drop.
    pub fn release(mut self) {
        self.release_regions();
    }

    /// Idempotent: a second call finds nothing left to release.
    fn release_regions(&mut self) {
        for buffer in self.regions.drain(..) {
            self.registry.release(buffer.id);
        }
    }
}

impl Drop for SharedBuffers {
    fn drop(&mut self) {
        self.release_regions();
    }
}
