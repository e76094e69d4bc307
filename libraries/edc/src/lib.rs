// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Error-detection codes.
//!
//! Table-driven CRC16 and CRC32 calculators for firmware image and storage
//! metadata integrity checking. The CRC16 models cover the two polynomials
//! in common use in bootloader and storage stacks (0x1021 and 0x8005), each
//! in normal and reflected form. The CRC32 is the IEEE polynomial used for
//! whole-image checks.
//!
//! The streaming calculators take `&self` on `update()` so they can be
//! driven from code that only holds a shared reference.

#![cfg_attr(not(test), no_std)]

pub mod crc16;
pub mod crc32;

pub use crc16::{Crc16, Crc16Model};
pub use crc16::{CRC16_1021, CRC16_1021_REF, CRC16_8005, CRC16_8005_REF};
pub use crc32::Crc32;

/// One-shot CRC16 of `data` under `model`.
pub fn crc16(model: &Crc16Model, data: &[u8]) -> u16 {
    let crc = Crc16::new(model);
    crc.update(data);
    crc.finalise()
}

/// One-shot IEEE CRC32 of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    let crc = Crc32::new();
    crc.update(data);
    crc.finalise()
}
