// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated benchmark parameters.
//!
//! All types validate their invariants at creation time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Minimum buffer size: 1 byte
const MIN_BUFFER_SIZE: usize = 1;
/// Maximum buffer size: 64 MB
const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

/// Block cipher mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CipherMode {
    Ecb,
    Cbc,
    Ctr,
    Xts,
}

impl CipherMode {
    /// Identifier used on the wire.
    pub const fn id(&self) -> u32 {
        match self {
            Self::Ecb => 0,
            Self::Cbc => 1,
            Self::Ctr => 2,
            Self::Xts => 3,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ecb => "ECB",
            Self::Cbc => "CBC",
            Self::Ctr => "CTR",
            Self::Xts => "XTS",
        }
    }

    /// Number of independent AES keys the mode consumes.
    pub const fn key_count(&self) -> usize {
        match self {
            Self::Xts => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CipherMode {
    type Err = HardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ECB" => Ok(Self::Ecb),
            "CBC" => Ok(Self::Cbc),
            "CTR" => Ok(Self::Ctr),
            "XTS" => Ok(Self::Xts),
            _ => Err(HardValidationError::UnsupportedMode {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for CipherMode {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CipherMode> for String {
    fn from(mode: CipherMode) -> Self {
        mode.name().to_string()
    }
}

impl TryFrom<u32> for CipherMode {
    type Error = HardValidationError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Self::Ecb),
            1 => Ok(Self::Cbc),
            2 => Ok(Self::Ctr),
            3 => Ok(Self::Xts),
            _ => Err(HardValidationError::UnsupportedMode {
                value: id.to_string(),
            }),
        }
    }
}

/// Nominal AES key size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    pub const fn bits(&self) -> u32 {
        match self {
            Self::Aes128 => 128,
            Self::Aes192 => 192,
            Self::Aes256 => 256,
        }
    }

    pub const fn bytes(&self) -> usize {
        self.bits() as usize / 8
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl TryFrom<u32> for KeySize {
    type Error = HardValidationError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            128 => Ok(Self::Aes128),
            192 => Ok(Self::Aes192),
            256 => Ok(Self::Aes256),
            _ => Err(HardValidationError::UnsupportedKeySize { bits }),
        }
    }
}

impl From<KeySize> for u32 {
    fn from(size: KeySize) -> Self {
        size.bits()
    }
}

/// Cipher direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Encrypt,
    Decrypt,
}

impl Direction {
    /// Wire flag: non-zero means decrypt.
    pub const fn flag(&self) -> u32 {
        match self {
            Self::Encrypt => 0,
            Self::Decrypt => 1,
        }
    }

    pub const fn from_flag(flag: u32) -> Self {
        if flag != 0 {
            Self::Decrypt
        } else {
            Self::Encrypt
        }
    }

    /// Prefix used in the start banner ("encrypt" / "decrypt").
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Encrypt => "en",
            Self::Decrypt => "de",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}crypt", self.prefix())
    }
}

/// Validated buffer size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct BufferSize(usize);

impl BufferSize {
    /// Create a new BufferSize with bounds validation.
    pub fn new(bytes: usize) -> Result<Self, HardValidationError> {
        if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&bytes) {
            return Err(HardValidationError::BufferSizeOutOfBounds {
                size: bytes,
                min: MIN_BUFFER_SIZE,
                max: MAX_BUFFER_SIZE,
            });
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BufferSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for BufferSize {
    type Error = HardValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BufferSize> for usize {
    fn from(size: BufferSize) -> Self {
        size.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_case_insensitive() {
        assert_eq!("ecb".parse::<CipherMode>().unwrap(), CipherMode::Ecb);
        assert_eq!("Xts".parse::<CipherMode>().unwrap(), CipherMode::Xts);
        assert!("GCM".parse::<CipherMode>().is_err());
    }

    #[test]
    fn test_mode_wire_ids() {
        assert_eq!(CipherMode::try_from(2u32).unwrap(), CipherMode::Ctr);
        assert!(CipherMode::try_from(4u32).is_err());
    }

    #[test]
    fn test_key_size_valid() {
        assert_eq!(KeySize::try_from(192).unwrap().bytes(), 24);
        assert!(KeySize::try_from(512).is_err());
        assert!(KeySize::try_from(0).is_err());
    }

    #[test]
    fn test_direction_flag() {
        assert_eq!(Direction::from_flag(0), Direction::Encrypt);
        assert_eq!(Direction::from_flag(7), Direction::Decrypt);
        assert_eq!(Direction::Decrypt.to_string(), "decrypt");
    }

    #[test]
    fn test_buffer_size_bounds() {
        assert!(BufferSize::new(0).is_err());
        assert!(BufferSize::new(16).is_ok());
        assert!(BufferSize::new(MAX_BUFFER_SIZE).is_ok());
        assert!(BufferSize::new(MAX_BUFFER_SIZE + 1).is_err());
    }
}
