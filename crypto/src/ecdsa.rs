// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! ECDSA P-256 signature verification using the p256 crate.

use p256::ecdsa::{signature::hazmat::PrehashVerifier, Signature, VerifyingKey};
use p256::EncodedPoint;

use crate::error::CryptoError;
use crate::DIGEST_LEN;

/// Length in bytes of an uncompressed public key (X || Y) and of a raw
/// signature (r || s).
pub const KEY_LEN: usize = 64;
pub const SIGNATURE_LEN: usize = 64;

/// Verifies an ECDSA P-256 signature against a SHA-256 digest.
///
/// `public_key` is the uncompressed point X || Y, `signature` the raw
/// scalars r || s. The digest is taken as-is; the caller hashes.
pub fn verify_signature(
    public_key: &[u8; KEY_LEN],
    digest: &[u8; DIGEST_LEN],
    signature: &[u8; SIGNATURE_LEN],
) -> Result<(), CryptoError> {
    let encoded_point = EncodedPoint::from_untagged_bytes(public_key.into());
    let verifying_key = VerifyingKey::from_encoded_point(&encoded_point)
        .map_err(|_| CryptoError::InvalidKey)?;

    let signature =
        Signature::from_bytes(signature.into()).map_err(|_| CryptoError::InvalidSignature)?;

    verifying_key
        .verify_prehash(digest, &signature)
        .map_err(|_| CryptoError::VerificationFailed)?;

    Ok(())
}
