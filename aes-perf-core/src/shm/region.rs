//! SharedMemoryRegion - POSIX shared memory wrapper.
//!
//! Provides a safe owner for an `shm_open` + `mmap` mapping. The mapping is
//! visible to both the client and the secure domain; all unsafe operations
//! are encapsulated with bounds checking.

use std::ffi::CString;
use std::ptr::NonNull;

use crate::error::AllocationError;

/// Represents a mapped shared memory region.
///
/// This struct owns the mapped memory and will unmap and unlink it on drop.
pub struct SharedMemoryRegion {
    /// Name of the shared memory object.
    name: String,
    /// Pointer to the mapped memory.
    ptr: NonNull<u8>,
    /// Usable size requested by the caller.
    capacity: usize,
    /// Size of the mapping (capacity rounded up to a page).
    mapped_len: usize,
    /// File descriptor for the shared memory object.
    fd: i32,
}

// SAFETY: SharedMemoryRegion owns its mapping and can be sent between threads.
unsafe impl Send for SharedMemoryRegion {}

// SAFETY: Access to the mapped bytes goes through the unsafe slice accessors,
// whose callers guarantee exclusive access for the duration of the borrow.
unsafe impl Sync for SharedMemoryRegion {}

impl SharedMemoryRegion {
    /// Maximum size for a shared memory region (1 GB).
    pub const MAX_SIZE: usize = 1024 * 1024 * 1024;

    /// Create and map a new, zero-filled shared memory region.
    ///
    /// # Arguments
    /// * `name` - Name of the shared memory object (will be prefixed with /)
    /// * `capacity` - Usable size in bytes (1..=MAX_SIZE)
    ///
    /// # Errors
    /// Returns AllocationError if creation or mapping fails.
    pub fn create(name: &str, capacity: usize) -> Result<Self, AllocationError> {
        if capacity == 0 || capacity > Self::MAX_SIZE {
            return Err(AllocationError::CreateFailed {
                name: name.to_string(),
                reason: format!("Size {} outside 1..={}", capacity, Self::MAX_SIZE),
            });
        }

        if name.is_empty() {
            return Err(AllocationError::CreateFailed {
                name: name.to_string(),
                reason: "Name cannot be empty".to_string(),
            });
        }

        let mapped_len = round_to_page(capacity);

        let shm_name = format!("/{}", name);
        let c_name =
            CString::new(shm_name.as_str()).map_err(|e| AllocationError::CreateFailed {
                name: name.to_string(),
                reason: format!("Invalid name: {}", e),
            })?;

        // Create shared memory object
        // SAFETY: c_name is a valid CString, flags are valid POSIX flags
        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_RDWR | libc::O_EXCL,
                0o600,
            )
        };

        if fd < 0 {
            return Err(AllocationError::CreateFailed {
                name: name.to_string(),
                reason: format!("shm_open failed: {}", std::io::Error::last_os_error()),
            });
        }

        // SAFETY: fd is a valid file descriptor
        let result = unsafe { libc::ftruncate(fd, mapped_len as libc::off_t) };
        if result < 0 {
            let errno = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
            return Err(AllocationError::CreateFailed {
                name: name.to_string(),
                reason: format!("ftruncate failed: {}", errno),
            });
        }

        // SAFETY: fd is valid, mapped_len is validated, offset 0 is valid
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                mapped_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            let errno = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
            return Err(AllocationError::MapFailed {
                reason: format!("mmap failed: {}", errno),
            });
        }

        let Some(ptr) = NonNull::new(ptr as *mut u8) else {
            unsafe { libc::close(fd) };
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
            return Err(AllocationError::MapFailed {
                reason: "mmap returned null".to_string(),
            });
        };

        // SAFETY: ptr is valid for mapped_len bytes
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0, mapped_len);
        }

        tracing::debug!(name = %name, capacity = capacity, mapped_len = mapped_len, "Created shared memory region");

        Ok(Self {
            name: name.to_string(),
            ptr,
            capacity,
            mapped_len,
            fd,
        })
    }

    /// Get the name of this shared memory region.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Usable size in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get a slice view of `len` bytes starting at `offset`.
    ///
    /// Returns `None` if the window is out of bounds.
    ///
    /// # Safety
    /// Caller must ensure no concurrent writes to the accessed window.
    pub unsafe fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        if end > self.capacity {
            return None;
        }
        Some(std::slice::from_raw_parts(self.ptr.as_ptr().add(offset), len))
    }

    /// Get a mutable slice view of `len` bytes starting at `offset`.
    ///
    /// Returns `None` if the window is out of bounds.
    ///
    /// # Safety
    /// Caller must ensure exclusive access to the accessed window for the
    /// lifetime of the returned slice. The client holds its buffers
    /// exclusively except while blocked in an invocation, during which only
    /// the secure domain touches them.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn slice_mut(&self, offset: usize, len: usize) -> Option<&mut [u8]> {
        let end = offset.checked_add(len)?;
        if end > self.capacity {
            return None;
        }
        Some(std::slice::from_raw_parts_mut(
            self.ptr.as_ptr().add(offset),
            len,
        ))
    }
}

impl Drop for SharedMemoryRegion {
    fn drop(&mut self) {
        // SAFETY: ptr and mapped_len were set during creation
        let result =
            unsafe { libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.mapped_len) };
        if result < 0 {
            tracing::error!(
                name = %self.name,
                error = %std::io::Error::last_os_error(),
                "Failed to unmap shared memory"
            );
        }

        // SAFETY: fd was opened during creation
        unsafe { libc::close(self.fd) };

        let shm_name = format!("/{}", self.name);
        if let Ok(c_name) = CString::new(shm_name.as_str()) {
            // SAFETY: c_name is a valid CString
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
            tracing::debug!(name = %self.name, "Unlinked shared memory region");
        }
    }
}

impl std::fmt::Debug for SharedMemoryRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMemoryRegion")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("mapped_len", &self.mapped_len)
            .finish()
    }
}

fn round_to_page(len: usize) -> usize {
    // SAFETY: sysconf has no memory-safety preconditions
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    let page = if page > 0 { page as usize } else { 4096 };
    len.div_ceil(page) * page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique(tag: &str) -> String {
        format!("aes-perf-test-{}-{}", tag, std::process::id())
    }

    #[test]
    fn test_shm_size_validation() {
        assert!(SharedMemoryRegion::create(&unique("zero"), 0).is_err());
        assert!(
            SharedMemoryRegion::create(&unique("large"), SharedMemoryRegion::MAX_SIZE + 1)
                .is_err()
        );
    }

    #[test]
    fn test_shm_empty_name() {
        assert!(SharedMemoryRegion::create("", 4096).is_err());
    }

    #[test]
    fn test_small_region_is_zeroed_and_bounded() {
        let region = SharedMemoryRegion::create(&unique("small"), 16).unwrap();
        assert_eq!(region.capacity(), 16);

        // SAFETY: region is not shared with anyone in this test
        unsafe {
            assert_eq!(region.slice(0, 16).unwrap(), &[0u8; 16]);
            assert!(region.slice(8, 9).is_none());
            assert!(region.slice_mut(usize::MAX, 2).is_none());

            region.slice_mut(4, 4).unwrap().copy_from_slice(&[1, 2, 3, 4]);
            assert_eq!(region.slice(0, 8).unwrap(), &[0, 0, 0, 0, 1, 2, 3, 4]);
        }
    }
}
