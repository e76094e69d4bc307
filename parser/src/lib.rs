// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Streaming parser for GBL v3 firmware image containers.
//!
//! A GBL file is a flat sequence of tagged blocks (32-bit tag id, 32-bit
//! length, contents), ending in an end tag that seals the file with a
//! CRC32. Images may additionally carry an ECDSA P-256 signature over
//! everything that precedes the signature tag.
//!
//! The parser consumes the file in arbitrary-sized chunks, so it can sit
//! directly behind a radio or serial transport without buffering the whole
//! image. Program and metadata payloads are handed to an [`ImageSink`] as
//! they stream through; everything learned about the image ends up in an
//! [`ImageProperties`].

#![cfg_attr(not(test), no_std)]

pub mod parse;
pub mod types;

pub use parse::{GblParser, ImageSink, SinkError};
pub use types::{
    ApplicationData, BootloaderUpgrade, GblParseError, ImageProperties, TagHeader,
};
