// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Slot-based firmware image storage over raw flash.
//!
//! Downloaded images are staged in fixed storage slots until the
//! bootloader installs one of them. This crate owns the slot table, the
//! chunked read/write path over a [`FlashController`], the bootload
//! request recorded for the bootloader, and a verification pass that
//! streams a stored image back through the GBL parser.
//!
//! The flash is described by an erase page size `S` and a total size;
//! the last page is reserved for the bootload info, and slots occupy
//! page-aligned windows of the pages before it. A single page-sized
//! read buffer is loaned in by the caller at construction, so the crate
//! itself allocates nothing.

#![cfg_attr(not(test), no_std)]

pub mod error_codes;
pub mod flash_controller;
pub mod storage;

#[cfg(test)]
mod tests;

pub use error_codes::ErrorCode;
pub use flash_controller::FlashController;
pub use storage::{BootloadInfo, ImageStorage, Slot, INFO_VERSION};
