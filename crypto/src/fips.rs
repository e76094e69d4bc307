// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Power-up known-answer self-tests.
//!
//! Runs each primitive against a published test vector and reports any
//! mismatch as `SelfTestFailed`. Integrators that gate crypto use on a
//! passing self-test call this once at startup; the library itself imposes
//! no policy.

use sha2::{Digest, Sha256};

use crate::error::CryptoError;
use crate::hkdf;

// SHA-256("abc"), FIPS 180-2 appendix B.1.
const SHA256_KAT_INPUT: &[u8] = b"abc";
const SHA256_KAT_DIGEST: [u8; 32] = [
    0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22,
    0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00,
    0x15, 0xad,
];

// RFC 5869 appendix A.1. Exercises HMAC-SHA256 underneath.
const HKDF_KAT_IKM: [u8; 22] = [0x0b; 22];
const HKDF_KAT_SALT: [u8; 13] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c,
];
const HKDF_KAT_INFO: [u8; 10] = [0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9];
const HKDF_KAT_OKM: [u8; 42] = [
    0x3c, 0xb2, 0x5f, 0x25, 0xfa, 0xac, 0xd5, 0x7a, 0x90, 0x43, 0x4f, 0x64, 0xd0, 0x36, 0x2f,
    0x2a, 0x2d, 0x2d, 0x0a, 0x90, 0xcf, 0x1a, 0x5a, 0x4c, 0x5d, 0xb0, 0x2d, 0x56, 0xec, 0xc4,
    0xc5, 0xbf, 0x34, 0x00, 0x72, 0x08, 0xd5, 0xb8, 0x87, 0x18, 0x58, 0x65,
];

fn sha256_self_test() -> Result<(), CryptoError> {
    let digest: [u8; 32] = Sha256::digest(SHA256_KAT_INPUT).into();
    if digest != SHA256_KAT_DIGEST {
        return Err(CryptoError::SelfTestFailed);
    }
    Ok(())
}

fn hkdf_self_test() -> Result<(), CryptoError> {
    let mut okm = [0u8; 42];
    hkdf::derive(&HKDF_KAT_SALT, &HKDF_KAT_IKM, &HKDF_KAT_INFO, &mut okm)?;
    if okm != HKDF_KAT_OKM {
        return Err(CryptoError::SelfTestFailed);
    }
    Ok(())
}

/// Run all known-answer tests.
pub fn power_up_self_test() -> Result<(), CryptoError> {
    sha256_self_test()?;
    hkdf_self_test()?;
    Ok(())
}
