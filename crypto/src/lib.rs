// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Software crypto for firmware-update flows.
//!
//! The pieces of a crypto runtime that are pure computation: HMAC-SHA256,
//! HKDF key derivation (RFC 5869) and ECDSA P-256 signature verification
//! over precomputed digests, plus power-up known-answer self-tests.
//! Everything is synchronous and heap-free.

#![cfg_attr(not(test), no_std)]

pub mod ecdsa;
pub mod error;
pub mod fips;
pub mod hkdf;
pub mod hmac;

pub use error::CryptoError;

/// Length in bytes of a SHA-256 digest, and therefore of HMAC outputs and
/// HKDF pseudorandom keys.
pub const DIGEST_LEN: usize = 32;
