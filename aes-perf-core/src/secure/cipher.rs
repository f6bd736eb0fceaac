// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Cipher sessions bound at `PrepareKey` time.
//!
//! A session keeps the expanded key schedule and re-derives per-call state
//! (IV, counter, tweak) on every transform, so each `Process` is a
//! self-contained cipher operation.

use aes::{Aes128, Aes192, Aes256};
use cipher::consts::U16;
use cipher::generic_array::GenericArray;
use cipher::{
    BlockCipher, BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, BlockSizeUser,
    InnerIvInit, KeyInit, StreamCipher,
};
use xts_mode::{get_tweak_default, Xts128};

use crate::protocol::TeeStatus;
use crate::types::{CipherMode, Direction, KeySize, AES_BLOCK_SIZE};

/// Block ciphers usable behind every supported mode.
trait AesCipher:
    BlockCipher
    + BlockEncrypt
    + BlockDecrypt
    + BlockSizeUser<BlockSize = U16>
    + KeyInit
    + Clone
    + Send
    + 'static
{
}

impl<T> AesCipher for T where
    T: BlockCipher
        + BlockEncrypt
        + BlockDecrypt
        + BlockSizeUser<BlockSize = U16>
        + KeyInit
        + Clone
        + Send
        + 'static
{
}

/// One finalized transform over a whole buffer, in place.
trait CipherTransform: Send {
    fn apply(&self, data: &mut [u8]);
}

struct Ecb<C> {
    cipher: C,
    direction: Direction,
}

impl<C: AesCipher> CipherTransform for Ecb<C> {
    fn apply(&self, data: &mut [u8]) {
        for chunk in data.chunks_exact_mut(AES_BLOCK_SIZE) {
            let block = GenericArray::<u8, U16>::from_mut_slice(chunk);
            match self.direction {
                Direction::Encrypt => self.cipher.encrypt_block(block),
                Direction::Decrypt => self.cipher.decrypt_block(block),
            }
        }
    }
}

struct Cbc<C> {
    cipher: C,
    direction: Direction,
}

impl<C: AesCipher> CipherTransform for Cbc<C> {
    fn apply(&self, data: &mut [u8]) {
        let iv = GenericArray::<u8, U16>::default();
        match self.direction {
            Direction::Encrypt => {
                let mut mode = cbc::Encryptor::<C>::inner_iv_init(self.cipher.clone(), &iv);
                for chunk in data.chunks_exact_mut(AES_BLOCK_SIZE) {
                    mode.encrypt_block_mut(GenericArray::from_mut_slice(chunk));
                }
            }
            Direction::Decrypt => {
                let mut mode = cbc::Decryptor::<C>::inner_iv_init(self.cipher.clone(), &iv);
                for chunk in data.chunks_exact_mut(AES_BLOCK_SIZE) {
                    mode.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
                }
            }
        }
    }
}

/// Counter mode is its own inverse, so direction is irrelevant.
struct Ctr<C> {
    cipher: C,
}

impl<C: AesCipher> CipherTransform for Ctr<C> {
    fn apply(&self, data: &mut [u8]) {
        let iv = GenericArray::<u8, U16>::default();
        let core =
            ctr::CtrCore::<C, ctr::flavors::Ctr128BE>::inner_iv_init(self.cipher.clone(), &iv);
        let mut mode = ctr::Ctr128BE::<C>::from_core(core);
        mode.apply_keystream(data);
    }
}

struct Xts<C: AesCipher> {
    xts: Xts128<C>,
    direction: Direction,
}

impl<C: AesCipher> CipherTransform for Xts<C> {
    fn apply(&self, data: &mut [u8]) {
        let tweak = get_tweak_default(0);
        match self.direction {
            Direction::Encrypt => self.xts.encrypt_sector(data, tweak),
            Direction::Decrypt => self.xts.decrypt_sector(data, tweak),
        }
    }
}

/// Bytes of key material a `(mode, key size)` pair consumes.
pub fn required_key_bytes(mode: CipherMode, key_size: KeySize) -> usize {
    key_size.bytes() * mode.key_count()
}

/// Key object plus a cipher operation fixed to one mode, size and direction.
pub struct CipherSession {
    mode: CipherMode,
    key_size: KeySize,
    direction: Direction,
    transform: Box<dyn CipherTransform>,
}

impl CipherSession {
    /// Check that `key_material` can back the requested operation, without
    /// building anything.
    pub fn validate(
        mode: CipherMode,
        key_size: KeySize,
        key_material: &[u8],
    ) -> Result<(), TeeStatus> {
        if key_material.len() < required_key_bytes(mode, key_size) {
            return Err(TeeStatus::BadParameters);
        }
        Ok(())
    }

    /// Expand the key schedule and bind the operation.
    ///
    /// Uses the first `key_size` bytes of `key_material` as the key; XTS
    /// takes the following `key_size` bytes as its tweak key. Material that
    /// is too short is rejected, never padded.
    pub fn new(
        mode: CipherMode,
        key_size: KeySize,
        direction: Direction,
        key_material: &[u8],
    ) -> Result<Self, TeeStatus> {
        Self::validate(mode, key_size, key_material)?;

        let n = key_size.bytes();
        let key1 = &key_material[..n];
        let key2 = &key_material[n..(n * mode.key_count())];

        let transform = match key_size {
            KeySize::Aes128 => build::<Aes128>(mode, direction, key1, key2)?,
            KeySize::Aes192 => build::<Aes192>(mode, direction, key1, key2)?,
            KeySize::Aes256 => build::<Aes256>(mode, direction, key1, key2)?,
        };

        Ok(Self {
            mode,
            key_size,
            direction,
            transform,
        })
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn key_size(&self) -> KeySize {
        self.key_size
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Check that `len` input bytes can be processed in one finalized call.
    pub fn check_input_len(&self, len: usize) -> Result<(), TeeStatus> {
        let ok = match self.mode {
            CipherMode::Ecb | CipherMode::Cbc => len % AES_BLOCK_SIZE == 0,
            CipherMode::Ctr => true,
            // Ciphertext stealing needs at least one full block.
            CipherMode::Xts => len >= AES_BLOCK_SIZE,
        };
        if ok {
            Ok(())
        } else {
            Err(TeeStatus::BadParameters)
        }
    }

    /// Run one self-contained transform over `data` in place.
    ///
    /// Callers must have checked the length with `check_input_len`.
    pub fn apply(&self, data: &mut [u8]) {
        self.transform.apply(data);
    }
}

impl std::fmt::Debug for CipherSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherSession")
            .field("mode", &self.mode)
            .field("key_size", &self.key_size)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

fn build<C: AesCipher>(
    mode: CipherMode,
    direction: Direction,
    key1: &[u8],
    key2: &[u8],
) -> Result<Box<dyn CipherTransform>, TeeStatus> {
    let cipher = C::new_from_slice(key1).map_err(|_| TeeStatus::BadParameters)?;

    let transform: Box<dyn CipherTransform> = match mode {
        CipherMode::Ecb => Box::new(Ecb { cipher, direction }),
        CipherMode::Cbc => Box::new(Cbc { cipher, direction }),
        CipherMode::Ctr => Box::new(Ctr { cipher }),
        CipherMode::Xts => {
            let tweak_cipher = C::new_from_slice(key2).map_err(|_| TeeStatus::BadParameters)?;
            Box::new(Xts {
                xts: Xts128::new(cipher, tweak_cipher),
                direction,
            })
        }
    };
    Ok(transform)
}
