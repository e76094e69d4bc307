// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! HMAC-SHA256.
//!
//! Built directly on the SHA-256 primitive: the inner hash runs over
//! `(key ^ ipad) | message`, the outer over `(key ^ opad) | inner digest`.

use sha2::{Digest, Sha256};

use crate::DIGEST_LEN;

/// Value to XOR the key with on the inner hash.
const INNER_PAD_BYTE: u8 = 0x36;
/// Value to XOR the key with on the outer hash.
const OUTER_PAD_BYTE: u8 = 0x5c;

/// SHA-256 processes input in 64-byte blocks; keys are normalized to this.
const SHA_BLOCK_LEN_BYTES: usize = 64;

/// Streaming HMAC-SHA256 calculator.
pub struct HmacSha256 {
    inner: Sha256,
    padded_key: [u8; SHA_BLOCK_LEN_BYTES],
}

impl HmacSha256 {
    /// Start an HMAC computation with `key`.
    ///
    /// Keys longer than the 64-byte SHA-256 block are replaced by their
    /// digest; shorter keys are zero-padded (RFC 2104).
    pub fn new(key: &[u8]) -> Self {
        let mut padded_key = [0u8; SHA_BLOCK_LEN_BYTES];
        if key.len() > SHA_BLOCK_LEN_BYTES {
            let digest = Sha256::digest(key);
            padded_key[..DIGEST_LEN].copy_from_slice(&digest);
        } else {
            padded_key[..key.len()].copy_from_slice(key);
        }

        let mut inner = Sha256::new();
        let mut ipad = [0u8; SHA_BLOCK_LEN_BYTES];
        for i in 0..SHA_BLOCK_LEN_BYTES {
            ipad[i] = padded_key[i] ^ INNER_PAD_BYTE;
        }
        inner.update(ipad);

        Self { inner, padded_key }
    }

    /// Feed message bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finish the computation and return the authentication tag.
    pub fn finalise(self) -> [u8; DIGEST_LEN] {
        let inner_digest = self.inner.finalize();

        let mut opad = [0u8; SHA_BLOCK_LEN_BYTES];
        for i in 0..SHA_BLOCK_LEN_BYTES {
            opad[i] = self.padded_key[i] ^ OUTER_PAD_BYTE;
        }

        let mut outer = Sha256::new();
        outer.update(opad);
        outer.update(inner_digest);
        outer.finalize().into()
    }
}

/// One-shot HMAC-SHA256 of `data` under `key`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; DIGEST_LEN] {
    let mut mac = HmacSha256::new(key);
    mac.update(data);
    mac.finalise()
}
