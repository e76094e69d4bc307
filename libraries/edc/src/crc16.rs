// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Model-based CRC16.
//!
//! A model binds a polynomial, a default seed and the bit order together
//! with its 256-entry lookup table. The tables are generated at compile
//! time from the polynomial, so adding a model is one constant.

use core::cell::Cell;

/// A CRC16 variant: polynomial, default initial value and bit order.
pub struct Crc16Model {
    /// Generator polynomial, in normal (MSB-first) notation.
    pub poly: u16,
    /// Default initial register value.
    pub init: u16,
    /// True if input bytes and the output are bit-reflected.
    pub reflect: bool,
    table: [u16; 256],
}

const fn gen_table(poly: u16) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ poly
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn reflect16(mut value: u16) -> u16 {
    let mut reflected = 0;
    let mut i = 0;
    while i < 16 {
        reflected = (reflected << 1) | (value & 1);
        value >>= 1;
        i += 1;
    }
    reflected
}

const fn gen_table_reflected(poly: u16) -> [u16; 256] {
    let poly = reflect16(poly);
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ poly } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-16 poly 0x1021, MSB first (the XMODEM form).
pub static CRC16_1021: Crc16Model = Crc16Model {
    poly: 0x1021,
    init: 0x0000,
    reflect: false,
    table: gen_table(0x1021),
};

/// CRC-16 poly 0x1021, reflected (the Kermit form).
pub static CRC16_1021_REF: Crc16Model = Crc16Model {
    poly: 0x1021,
    init: 0x0000,
    reflect: true,
    table: gen_table_reflected(0x1021),
};

/// CRC-16 poly 0x8005, MSB first.
pub static CRC16_8005: Crc16Model = Crc16Model {
    poly: 0x8005,
    init: 0x0000,
    reflect: false,
    table: gen_table(0x8005),
};

/// CRC-16 poly 0x8005, reflected (the ARC form).
pub static CRC16_8005_REF: Crc16Model = Crc16Model {
    poly: 0x8005,
    init: 0x0000,
    reflect: true,
    table: gen_table_reflected(0x8005),
};

/// Streaming CRC16 calculator over a model.
pub struct Crc16<'a> {
    model: &'a Crc16Model,
    crc: Cell<u16>,
}

impl<'a> Crc16<'a> {
    /// Start a calculation with the model's default seed.
    pub fn new(model: &'a Crc16Model) -> Self {
        Self {
            model,
            crc: Cell::new(model.init),
        }
    }

    /// Start a calculation with an explicit seed, for variants that share
    /// a model's polynomial and bit order but seed differently (e.g. the
    /// 0xFFFF-seeded form of poly 0x1021).
    pub fn with_init(model: &'a Crc16Model, init: u16) -> Self {
        Self {
            model,
            crc: Cell::new(init),
        }
    }

    /// Feed `data` into the calculation.
    pub fn update(&self, data: &[u8]) {
        let mut crc = self.crc.get();
        if self.model.reflect {
            for byte in data {
                let index = ((crc ^ *byte as u16) & 0xFF) as usize;
                crc = (crc >> 8) ^ self.model.table[index];
            }
        } else {
            for byte in data {
                let index = (((crc >> 8) ^ *byte as u16) & 0xFF) as usize;
                crc = (crc << 8) ^ self.model.table[index];
            }
        }
        self.crc.set(crc);
    }

    /// The CRC of everything fed so far.
    pub fn finalise(&self) -> u16 {
        self.crc.get()
    }
}
