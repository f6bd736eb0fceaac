// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Status codes returned across the secure-domain boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of a secure-domain invocation, using GlobalPlatform-style codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeeStatus {
    Success,
    Generic,
    BadParameters,
    BadState,
    NotSupported,
    OutOfMemory,
    Communication,
    ShortBuffer,
}

impl TeeStatus {
    /// The 32-bit status code.
    pub const fn code(&self) -> u32 {
        match self {
            Self::Success => 0x0000_0000,
            Self::Generic => 0xFFFF_0000,
            Self::BadParameters => 0xFFFF_0006,
            Self::BadState => 0xFFFF_0007,
            Self::NotSupported => 0xFFFF_000A,
            Self::OutOfMemory => 0xFFFF_000C,
            Self::Communication => 0xFFFF_000E,
            Self::ShortBuffer => 0xFFFF_0010,
        }
    }

    /// Decode a status code. Unknown codes map to `Generic`.
    pub const fn from_code(code: u32) -> Self {
        match code {
            0x0000_0000 => Self::Success,
            0xFFFF_0006 => Self::BadParameters,
            0xFFFF_0007 => Self::BadState,
            0xFFFF_000A => Self::NotSupported,
            0xFFFF_000C => Self::OutOfMemory,
            0xFFFF_000E => Self::Communication,
            0xFFFF_0010 => Self::ShortBuffer,
            _ => Self::Generic,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Generic => "Generic",
            Self::BadParameters => "BadParameters",
            Self::BadState => "BadState",
            Self::NotSupported => "NotSupported",
            Self::OutOfMemory => "OutOfMemory",
            Self::Communication => "Communication",
            Self::ShortBuffer => "ShortBuffer",
        }
    }
}

impl fmt::Display for TeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which layer produced a non-success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnOrigin {
    /// The client-side API, before anything crossed the boundary.
    Api,
    /// The transport between the domains.
    Communication,
    /// The secure-domain application itself.
    TrustedApp,
}

impl fmt::Display for ReturnOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Api => "api",
            Self::Communication => "communication",
            Self::TrustedApp => "trusted-app",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_decode() {
        for status in [
            TeeStatus::Success,
            TeeStatus::BadParameters,
            TeeStatus::BadState,
            TeeStatus::NotSupported,
            TeeStatus::OutOfMemory,
            TeeStatus::Communication,
            TeeStatus::ShortBuffer,
        ] {
            assert_eq!(TeeStatus::from_code(status.code()), status);
        }
    }

    #[test]
    fn test_unknown_code_is_generic() {
        assert_eq!(TeeStatus::from_code(0xDEAD_BEEF), TeeStatus::Generic);
        assert!(!TeeStatus::Generic.is_success());
    }
}
