// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Streaming IEEE CRC32.
//!
//! Reflected polynomial 0xEDB88320, initial value 0xFFFF_FFFF, final
//! complement. This is the CRC used over whole firmware image files; a
//! file that carries its own CRC32 appended little-endian hashes to the
//! constant [`Crc32::RESIDUAL`].

use core::cell::Cell;

const POLY: u32 = 0xEDB8_8320;
const INIT: u32 = 0xFFFF_FFFF;

const fn gen_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static TABLE: [u32; 256] = gen_table();

/// Streaming CRC32 calculator.
pub struct Crc32 {
    crc: Cell<u32>,
}

impl Crc32 {
    /// `finalise()` of any byte stream that ends with the CRC32 of the
    /// preceding bytes, appended little-endian.
    pub const RESIDUAL: u32 = 0x2144_DF1C;

    pub fn new() -> Self {
        Self {
            crc: Cell::new(INIT),
        }
    }

    /// Feed `data` into the calculation.
    pub fn update(&self, data: &[u8]) {
        let mut crc = self.crc.get();
        for byte in data {
            let index = ((crc ^ *byte as u32) & 0xFF) as usize;
            crc = (crc >> 8) ^ TABLE[index];
        }
        self.crc.set(crc);
    }

    /// The CRC of everything fed so far. Does not consume the calculator;
    /// more data may be fed afterwards.
    pub fn finalise(&self) -> u32 {
        !self.crc.get()
    }

    /// Restart the calculation.
    pub fn reset(&self) {
        self.crc.set(INIT);
    }
}
