// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! The standard error codes used by image storage.

/// Standard error codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    /// We found a problem reading from flash.
    ReadFail,
    /// We found a problem writing to flash.
    WriteFail,
    /// We found a problem erasing flash.
    EraseFail,
    /// The slot table passed at construction is misaligned, overlapping
    /// or out of bounds.
    InvalidLayout,
    /// The slot index does not name a slot in the table.
    InvalidSlot,
    /// The offset and length do not fit inside the slot.
    OffsetOutOfRange,
    /// The bootload info page failed its magic, version or checksum
    /// check.
    MetadataInvalid,
    /// The stored image failed to parse or verify.
    CorruptImage,
}
