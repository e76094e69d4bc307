// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! The image storage implementation.

use core::cell::Cell;
use core::cmp;

use gbl_parser::{GblParser, ImageProperties, ImageSink, SinkError};

use crate::error_codes::ErrorCode;
use crate::flash_controller::FlashController;

/// The current version of the bootload info format.
pub const INFO_VERSION: u32 = 1;

const INFO_MAGIC: u32 = 0xB007_10AD;

// A list of offsets into the serialized bootload info.
const MAGIC_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 4;
const SLOT_OFFSET: usize = 8;
const IMAGE_CRC_OFFSET: usize = 12;
const CHECK_SUM_OFFSET: usize = 16;
pub(crate) const INFO_LENGTH: usize = 20;

/// A storage slot: a page-aligned window of the flash area that holds one
/// firmware image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    /// Zero-based start address within the flash area.
    pub address: usize,
    /// Length in bytes.
    pub length: usize,
}

/// The bootload request recorded for the bootloader to act on at the
/// next reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootloadInfo {
    /// Index of the slot holding the image to install.
    pub slot: u32,
    /// CRC32 of the stored image file.
    pub image_crc: u32,
}

impl BootloadInfo {
    fn serialize(&self) -> [u8; INFO_LENGTH] {
        let mut bytes = [0u8; INFO_LENGTH];
        bytes[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(&INFO_MAGIC.to_le_bytes());
        bytes[VERSION_OFFSET..VERSION_OFFSET + 4].copy_from_slice(&INFO_VERSION.to_le_bytes());
        bytes[SLOT_OFFSET..SLOT_OFFSET + 4].copy_from_slice(&self.slot.to_le_bytes());
        bytes[IMAGE_CRC_OFFSET..IMAGE_CRC_OFFSET + 4]
            .copy_from_slice(&self.image_crc.to_le_bytes());

        let check_sum = edc::crc32(&bytes[..CHECK_SUM_OFFSET]);
        bytes[CHECK_SUM_OFFSET..CHECK_SUM_OFFSET + 4].copy_from_slice(&check_sum.to_le_bytes());
        bytes
    }

    fn parse(bytes: &[u8; INFO_LENGTH]) -> Result<Self, ErrorCode> {
        let word = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        if word(MAGIC_OFFSET) != INFO_MAGIC || word(VERSION_OFFSET) != INFO_VERSION {
            return Err(ErrorCode::MetadataInvalid);
        }
        if word(CHECK_SUM_OFFSET) != edc::crc32(&bytes[..CHECK_SUM_OFFSET]) {
            return Err(ErrorCode::MetadataInvalid);
        }
        Ok(Self {
            slot: word(SLOT_OFFSET),
            image_crc: word(IMAGE_CRC_OFFSET),
        })
    }
}

/// A sink that verifies payloads exist without keeping them.
struct DiscardingSink;

impl ImageSink for DiscardingSink {
    fn program_data(&mut self, _address: u32, _data: &[u8]) -> Result<(), SinkError> {
        Ok(())
    }

    fn bootloader_data(&mut self, _address: u32, _data: &[u8]) -> Result<(), SinkError> {
        Ok(())
    }

    fn metadata(&mut self, _offset: u32, _data: &[u8]) -> Result<(), SinkError> {
        Ok(())
    }
}

/// The struct storing all of the image storage information.
///
/// The last page of the flash area is reserved for the bootload info;
/// slots live in the pages before it.
pub struct ImageStorage<'a, C: FlashController<S>, const S: usize> {
    /// The controller used for flash commands.
    pub controller: C,
    slots: &'a [Slot],
    flash_size: usize,
    read_buffer: Cell<Option<&'a mut [u8; S]>>,
}

impl<'a, C: FlashController<S>, const S: usize> ImageStorage<'a, C, S> {
    /// Create a new struct, checking the slot layout once.
    ///
    /// `C`: An implementation of the `FlashController` trait
    ///
    /// `controller`: A new struct implementing `FlashController`
    /// `slots`: The slot table; addresses and lengths must be multiples
    /// of `S` and slots must not overlap each other or the reserved
    /// bootload info page
    /// `read_buffer`: A buffer of one region size, loaned for the life
    /// of the struct
    /// `flash_size`: The total size of the flash used for image storage
    pub fn new(
        controller: C,
        slots: &'a [Slot],
        read_buffer: &'a mut [u8; S],
        flash_size: usize,
    ) -> Result<Self, ErrorCode> {
        // One page at the end is reserved for the bootload info.
        if S < INFO_LENGTH || flash_size % S != 0 || flash_size < S {
            return Err(ErrorCode::InvalidLayout);
        }
        let data_limit = flash_size - S;

        for (i, slot) in slots.iter().enumerate() {
            if slot.length == 0 || slot.address % S != 0 || slot.length % S != 0 {
                return Err(ErrorCode::InvalidLayout);
            }
            let end = slot
                .address
                .checked_add(slot.length)
                .ok_or(ErrorCode::InvalidLayout)?;
            if end > data_limit {
                return Err(ErrorCode::InvalidLayout);
            }
            for other in &slots[..i] {
                if slot.address < other.address + other.length && other.address < end {
                    return Err(ErrorCode::InvalidLayout);
                }
            }
        }

        Ok(Self {
            controller,
            slots,
            flash_size,
            read_buffer: Cell::new(Some(read_buffer)),
        })
    }

    fn slot(&self, slot: usize) -> Result<Slot, ErrorCode> {
        self.slots.get(slot).copied().ok_or(ErrorCode::InvalidSlot)
    }

    /// Check that `offset..offset + len` sits inside the slot and return
    /// the absolute flash address of `offset`.
    fn slot_range(&self, slot: Slot, offset: usize, len: usize) -> Result<usize, ErrorCode> {
        let end = offset.checked_add(len).ok_or(ErrorCode::OffsetOutOfRange)?;
        if end > slot.length {
            return Err(ErrorCode::OffsetOutOfRange);
        }
        Ok(slot.address + offset)
    }

    /// Erase every page of the slot.
    pub fn erase_slot(&self, slot: usize) -> Result<(), ErrorCode> {
        let slot = self.slot(slot)?;
        let first = slot.address / S;
        for region in first..first + slot.length / S {
            self.controller.erase_region(region)?;
        }
        Ok(())
    }

    /// Write `data` at `offset` within the slot. The caller is
    /// responsible for having erased the slot first.
    pub fn write_chunk(&self, slot: usize, offset: usize, data: &[u8]) -> Result<(), ErrorCode> {
        let slot = self.slot(slot)?;
        let address = self.slot_range(slot, offset, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        self.controller.write(address, data)
    }

    /// Read `buf.len()` bytes from `offset` within the slot. Reads may
    /// cross page boundaries.
    pub fn read_chunk(&self, slot: usize, offset: usize, buf: &mut [u8]) -> Result<(), ErrorCode> {
        let slot = self.slot(slot)?;
        let mut address = self.slot_range(slot, offset, buf.len())?;

        let read_buffer = self.read_buffer.take().unwrap();
        let mut copied = 0;
        while copied < buf.len() {
            let region_offset = address % S;
            if let Err(e) = self.controller.read_region(address / S, read_buffer) {
                self.read_buffer.replace(Some(read_buffer));
                return Err(e);
            }

            let n = cmp::min(S - region_offset, buf.len() - copied);
            buf[copied..copied + n]
                .copy_from_slice(&read_buffer[region_offset..region_offset + n]);
            copied += n;
            address += n;
        }
        self.read_buffer.replace(Some(read_buffer));
        Ok(())
    }

    /// Stream the slot contents through the image parser. With a public
    /// key the stored image must carry a valid signature. The image does
    /// not have to fill the slot.
    pub fn verify_slot(
        &self,
        slot: usize,
        public_key: Option<&[u8; 64]>,
    ) -> Result<ImageProperties, ErrorCode> {
        let slot = self.slot(slot)?;
        let mut sink = DiscardingSink;
        let mut parser = GblParser::new(&mut sink, public_key);

        let read_buffer = self.read_buffer.take().unwrap();
        let first = slot.address / S;
        let mut failed = false;
        for region in first..first + slot.length / S {
            if let Err(e) = self.controller.read_region(region, read_buffer) {
                self.read_buffer.replace(Some(read_buffer));
                return Err(e);
            }

            match parser.parse(&read_buffer[..]) {
                Ok(()) => {}
                // The image ended partway through this page; whatever
                // follows it in the slot is not ours to judge.
                Err(_) if parser.is_done() => break,
                Err(_) => {
                    failed = true;
                    break;
                }
            }
            if parser.is_done() {
                break;
            }
        }
        self.read_buffer.replace(Some(read_buffer));

        if failed {
            return Err(ErrorCode::CorruptImage);
        }
        parser.finish().map_err(|_| ErrorCode::CorruptImage)
    }

    /// Read the bootload info from its reserved page.
    pub fn read_bootload_info(&self) -> Result<BootloadInfo, ErrorCode> {
        let region = self.flash_size / S - 1;

        let read_buffer = self.read_buffer.take().unwrap();
        if let Err(e) = self.controller.read_region(region, read_buffer) {
            self.read_buffer.replace(Some(read_buffer));
            return Err(e);
        }

        let mut bytes = [0u8; INFO_LENGTH];
        bytes.copy_from_slice(&read_buffer[..INFO_LENGTH]);
        self.read_buffer.replace(Some(read_buffer));

        BootloadInfo::parse(&bytes)
    }

    /// Rewrite the bootload info page with `info`.
    pub fn write_bootload_info(&self, info: &BootloadInfo) -> Result<(), ErrorCode> {
        let region = self.flash_size / S - 1;
        self.controller.erase_region(region)?;
        self.controller.write(region * S, &info.serialize())
    }
}
