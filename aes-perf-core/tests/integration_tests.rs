// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end integration tests for aes-perf-core.
//!
//! These tests drive the secure domain only through the public client API:
//! context, session, shared buffers and the protocol client.

use std::io::Write;
use std::sync::Arc;
use std::thread;

use aes::{Aes128, Aes256};
use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

use aes_perf_core::protocol::TeeStatus;
use aes_perf_core::secure::DEFAULT_KEY_MATERIAL;
use aes_perf_core::{
    AesPerfError, AllocationError, CipherMode, CommandProtocolClient, ConfigLoader, Direction,
    KeySize, SharedBuffers, TeeContext,
};

fn ecb_blocks<F: Fn(&mut GenericArray<u8, cipher::consts::U16>)>(data: &mut [u8], f: F) {
    for chunk in data.chunks_exact_mut(16) {
        f(GenericArray::from_mut_slice(chunk));
    }
}

/// Test ECB encryption output against the block cipher
#[test]
fn test_ecb_encrypt_matches_reference() {
    let context = TeeContext::default();
    let mut buffers = SharedBuffers::allocate(context.registry(), 64, false).unwrap();
    for (i, byte) in buffers.input_mut().as_mut_slice().iter_mut().enumerate() {
        *byte = i as u8;
    }

    let mut session = context.open_session().unwrap();
    let mut client = CommandProtocolClient::new(&mut session);
    client
        .prepare_key(Direction::Encrypt, KeySize::Aes128, CipherMode::Ecb)
        .unwrap();
    client.bind(&mut buffers);
    assert_eq!(client.process().unwrap(), 64);
    drop(client);

    let mut expected: Vec<u8> = (0..64u8).collect();
    let reference = Aes128::new_from_slice(&DEFAULT_KEY_MATERIAL[..16]).unwrap();
    ecb_blocks(&mut expected, |block| reference.encrypt_block(block));

    assert_eq!(buffers.output().as_slice(), expected.as_slice());
    // Input is left untouched when regions are separate.
    assert_eq!(buffers.input().as_slice()[..4], [0, 1, 2, 3]);
}

/// Test in-place decryption with a 256-bit key
#[test]
fn test_in_place_decrypt() {
    let context = TeeContext::default();
    let mut buffers = SharedBuffers::allocate(context.registry(), 1024, true).unwrap();
    assert_eq!(context.registry().len(), 1);

    let mut session = context.open_session().unwrap();
    let mut client = CommandProtocolClient::new(&mut session);
    client
        .prepare_key(Direction::Decrypt, KeySize::Aes256, CipherMode::Ecb)
        .unwrap();
    client.bind(&mut buffers);
    client.process().unwrap();
    drop(client);

    let mut expected = vec![0u8; 1024];
    let reference = Aes256::new_from_slice(&DEFAULT_KEY_MATERIAL).unwrap();
    ecb_blocks(&mut expected, |block| reference.decrypt_block(block));
    assert_eq!(buffers.output().as_slice(), expected.as_slice());

    buffers.input_mut().as_mut_slice().fill(0);
    assert_eq!(buffers.output().as_slice(), &[0u8; 1024][..]);
}

/// Test that every Process call is an independent cipher operation
#[test]
fn test_chained_modes_reset_per_call() {
    let context = TeeContext::default();
    let mut buffers = SharedBuffers::allocate(context.registry(), 48, false).unwrap();
    let mut session = context.open_session().unwrap();
    let mut client = CommandProtocolClient::new(&mut session);
    client.bind(&mut buffers);

    for mode in [CipherMode::Cbc, CipherMode::Ctr, CipherMode::Xts] {
        client
            .prepare_key(Direction::Encrypt, KeySize::Aes128, mode)
            .unwrap();

        client.process().unwrap();
        let first = client.buffers().unwrap().output().as_slice().to_vec();
        client.process().unwrap();
        let second = client.buffers().unwrap().output().as_slice();
        assert_eq!(second, first.as_slice(), "{}", mode);
    }
    assert_eq!(client.process_calls(), 6);
}

/// Test that the secure status code reaches the caller
#[test]
fn test_unsupported_xts_key_surfaces_bad_parameters() {
    let context = TeeContext::default();
    let mut session = context.open_session().unwrap();
    let mut client = CommandProtocolClient::new(&mut session);

    let err = client
        .prepare_key(Direction::Encrypt, KeySize::Aes256, CipherMode::Xts)
        .unwrap_err();
    assert_eq!(err.status(), Some(TeeStatus::BadParameters));

    let err: AesPerfError = err.into();
    assert_eq!(err.status_code(), Some(0xFFFF_0006));
}

/// Test that caller-loaded key material unlocks XTS-256
#[test]
fn test_longer_key_material_allows_xts_256() {
    let context = TeeContext::default();
    let mut buffers = SharedBuffers::allocate(context.registry(), 32, false).unwrap();
    let mut session = context.open_session_with_key(vec![0xA5; 64]).unwrap();
    let mut client = CommandProtocolClient::new(&mut session);

    client
        .prepare_key(Direction::Encrypt, KeySize::Aes256, CipherMode::Xts)
        .unwrap();
    client.bind(&mut buffers);
    assert_eq!(client.process().unwrap(), 32);
}

/// Test shared memory quota exhaustion is an allocation error
#[test]
fn test_quota_exhaustion() {
    let context = TeeContext::new(1500);
    let result = SharedBuffers::allocate(context.registry(), 1024, false);

    assert!(matches!(result, Err(AllocationError::QuotaExceeded { .. })));
    assert!(context.registry().is_empty());

    // A single in-place region still fits.
    let buffers = SharedBuffers::allocate(context.registry(), 1024, true).unwrap();
    assert_eq!(context.registry().used_bytes(), 1024);
    buffers.release();
    assert_eq!(context.registry().used_bytes(), 0);
}

/// Test independent sessions on separate threads
#[test]
fn test_concurrent_sessions() {
    let context = TeeContext::default();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let context = context.clone();
            thread::spawn(move || {
                let mut buffers =
                    SharedBuffers::allocate(context.registry(), 256, false).unwrap();
                let mut session = context.open_session().unwrap();
                let mut client = CommandProtocolClient::new(&mut session);
                client
                    .prepare_key(Direction::Encrypt, KeySize::Aes192, CipherMode::Cbc)
                    .unwrap();
                client.bind(&mut buffers);
                client.process_batch(10).unwrap();
                client.process_calls()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 10);
    }
    assert!(context.registry().is_empty());
}

/// Test regions unregistered while a session stays open are unknown to it
#[test]
fn test_released_buffers_are_rejected() {
    let context = TeeContext::default();
    let registry = Arc::clone(context.registry());
    let mut buffers = SharedBuffers::allocate(&registry, 16, false).unwrap();
    let input_id = buffers.input().id();

    let mut session = context.open_session().unwrap();
    let mut client = CommandProtocolClient::new(&mut session);
    client
        .prepare_key(Direction::Encrypt, KeySize::Aes128, CipherMode::Ecb)
        .unwrap();
    client.bind(&mut buffers);
    assert!(registry.release(input_id));

    let err = client.process().unwrap_err();
    assert_eq!(err.status(), Some(TeeStatus::BadParameters));
    drop(client);

    // Dropping the buffers releases only what is still registered.
    drop(buffers);
    assert!(registry.is_empty());
}

/// Test configuration loading from a YAML profile
#[test]
fn test_config_profile_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "buffer_size: 4096\nouter_loops: 50\ninner_loops: 4\nmode: ctr\nkey_size: 192\ndirection: decrypt\nin_place: true"
    )
    .unwrap();

    let config = ConfigLoader::load_file(file.path()).unwrap();
    assert_eq!(config.buffer_size(), 4096);
    assert_eq!(config.outer_loops(), 50);
    assert_eq!(config.inner_loops(), 4);
    assert_eq!(config.mode(), CipherMode::Ctr);
    assert_eq!(config.key_size(), KeySize::Aes192);
    assert_eq!(config.direction(), Direction::Decrypt);
    assert!(config.in_place());
    assert!(!config.random_input());
}
