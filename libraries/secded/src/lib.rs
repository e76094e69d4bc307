// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Hamming SECDED code for 32-bit words.
//!
//! A (39,32) extended Hamming code: six check bits at the power-of-two
//! codeword positions plus an overall parity bit, packed into the low seven
//! bits of an ECC byte. One flipped bit anywhere in the word or the ECC
//! byte is corrected; two flipped bits are detected and reported as
//! uncorrectable rather than miscorrected.
//!
//! This is the scheme flash drivers store alongside each programmed word to
//! ride out single-bit retention errors.

#![cfg_attr(not(test), no_std)]

/// Number of check bits (excluding the overall parity bit).
const CHECK_BITS: u32 = 6;
/// Highest occupied codeword position (1-indexed).
const MAX_POSITION: u32 = 38;

/// Codeword position of each data bit, in data bit order. Data bits occupy
/// the non-power-of-two positions 3, 5, 6, 7, 9, ...
static POSITION_OF_BIT: [u8; 32] = gen_positions();

const fn gen_positions() -> [u8; 32] {
    let mut positions = [0u8; 32];
    let mut bit = 0;
    let mut pos: u32 = 1;
    while bit < 32 {
        if pos & (pos - 1) != 0 {
            positions[bit] = pos as u8;
            bit += 1;
        }
        pos += 1;
    }
    positions
}

/// Outcome of decoding a word/ECC pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// No error detected.
    Valid,
    /// A single data bit was flipped; the corrected word is returned.
    CorrectedWord(u32),
    /// A single bit of the ECC byte was flipped; the word is intact.
    CorrectedEcc,
    /// Two or more bits are flipped. The word cannot be trusted.
    Uncorrectable,
}

/// XOR of the codeword positions of all set data bits. Bit `i` of the
/// result is check bit `c_i`.
fn data_syndrome(word: u32) -> u8 {
    let mut syndrome: u32 = 0;
    for bit in 0..32 {
        if word >> bit & 1 == 1 {
            syndrome ^= POSITION_OF_BIT[bit] as u32;
        }
    }
    syndrome as u8
}

fn parity(value: u32) -> u8 {
    (value.count_ones() & 1) as u8
}

/// Compute the ECC byte for `word`.
///
/// Bits 0..=5 are the Hamming check bits, bit 6 is the overall parity of
/// the 38-bit codeword. Bit 7 is always zero.
pub fn encode(word: u32) -> u8 {
    let checks = data_syndrome(word);
    let overall = parity(word) ^ parity(checks as u32);
    checks | (overall << CHECK_BITS)
}

/// Check `word` against its stored `ecc` byte, correcting a single flipped
/// bit if there is one.
pub fn decode(word: u32, ecc: u8) -> Decoded {
    if ecc & 0x80 != 0 {
        // Bit 7 is outside the code; it can only be set by corruption.
        return Decoded::Uncorrectable;
    }

    let checks_stored = ecc & 0x3F;
    let overall_stored = ecc >> CHECK_BITS & 1;

    let syndrome = (checks_stored ^ data_syndrome(word)) as u32;
    let overall =
        parity(word) ^ parity(checks_stored as u32) ^ overall_stored;

    if syndrome == 0 && overall == 0 {
        return Decoded::Valid;
    }

    if overall == 0 {
        // The syndrome flags an error but the overall parity balances:
        // an even number of flips, so at least two.
        return Decoded::Uncorrectable;
    }

    // Exactly one flipped bit; the syndrome is its codeword position.
    if syndrome == 0 {
        // The overall parity bit itself.
        return Decoded::CorrectedEcc;
    }
    if syndrome & (syndrome - 1) == 0 {
        // A power-of-two position holds a check bit.
        return Decoded::CorrectedEcc;
    }
    if syndrome > MAX_POSITION {
        // Points outside the codeword; only multi-bit corruption does this.
        return Decoded::Uncorrectable;
    }

    for bit in 0..32 {
        if POSITION_OF_BIT[bit] as u32 == syndrome {
            return Decoded::CorrectedWord(word ^ (1 << bit));
        }
    }
    Decoded::Uncorrectable
}
