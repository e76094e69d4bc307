// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! The flash controller interface with hardware.

use crate::error_codes::ErrorCode;

/// Implementation required for the flash controller hardware. This
/// should read, write and erase flash from the hardware using the
/// flash controller.
///
/// The size of the regions (pages) must be the smallest size that can be
/// erased in a single operation. This is specified as the constant `S`
/// when implementing `FlashController` and `ImageStorage` and it must
/// match the length of the `read_buffer`.
///
/// The start and end address of the FlashController must be aligned
/// to the size of regions.
/// All `region_number`s and `address`es are offset from zero. If you
/// want to use flash that doesn't start at zero, or is a partition
/// offset from the start of flash you will need to add that offset
/// to the values in your implementation.
pub trait FlashController<const S: usize> {
    /// This function must read the region specified by `region_number`
    /// into `buf`. The length of the data read is the length of `buf`.
    ///
    /// On success it should return nothing, on failure it
    /// should return ErrorCode::ReadFail.
    fn read_region(&self, region_number: usize, buf: &mut [u8; S]) -> Result<(), ErrorCode>;

    /// This function must write the length of `buf` to the specified
    /// address in flash.
    /// If the length of `buf` is smaller than the minimum supported write
    /// size the implementation can write a larger value. This should be
    /// done by first reading the value, making the changes from `buf` and
    /// then writing it back.
    ///
    /// On success it should return nothing, on failure it
    /// should return ErrorCode::WriteFail.
    fn write(&self, address: usize, buf: &[u8]) -> Result<(), ErrorCode>;

    /// This function must erase the region specified by `region_number`.
    ///
    /// On success it should return nothing, on failure it
    /// should return ErrorCode::EraseFail.
    fn erase_region(&self, region_number: usize) -> Result<(), ErrorCode>;
}
