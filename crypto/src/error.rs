// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Error codes for the crypto operations.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// The public key is not a valid uncompressed P-256 point.
    InvalidKey,

    /// The signature bytes do not encode valid scalars.
    InvalidSignature,

    /// The signature is well formed but does not verify against the digest
    /// and key.
    VerificationFailed,

    /// HKDF output length exceeds 255 hash blocks (RFC 5869 §2.3).
    OutputTooLong,

    /// A power-up known-answer test produced the wrong answer.
    SelfTestFailed,
}
