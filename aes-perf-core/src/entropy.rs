// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Random input generation from the system entropy device.
//!
//! The device is opened on first use and the handle is reused for the
//! lifetime of the source.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::EntropyError;

/// Default system entropy device.
pub const DEFAULT_ENTROPY_PATH: &str = "/dev/urandom";

/// Lazily opened stream of random bytes.
#[derive(Debug)]
pub struct EntropySource {
    path: PathBuf,
    file: Option<File>,
}

impl EntropySource {
    /// Source backed by `/dev/urandom`.
    pub fn new() -> Self {
        Self::with_path(DEFAULT_ENTROPY_PATH)
    }

    /// Source backed by an arbitrary readable file.
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Fill `buf` with a single read.
    ///
    /// A short read leaves the tail of `buf` untouched and is reported as
    /// `ShortRead`; callers may carry on with the partially refreshed buffer.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<(), EntropyError> {
        let file = match self.file {
            Some(ref mut file) => file,
            None => {
                let file = File::open(&self.path).map_err(|source| EntropyError::Open {
                    path: self.path.clone(),
                    source,
                })?;
                tracing::debug!(path = %self.path.display(), "Opened entropy source");
                self.file.insert(file)
            }
        };

        let got = file.read(buf).map_err(EntropyError::Read)?;
        if got != buf.len() {
            return Err(EntropyError::ShortRead {
                requested: buf.len(),
                got,
            });
        }
        Ok(())
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}
