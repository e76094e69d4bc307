// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! GBL container types and constants.

use ota_crypto::CryptoError;

/// Tag ids of the GBL v3 container format. Each id embeds its complement
/// bytes so a corrupted id is unlikely to alias another tag.
pub const GBL_TAG_ID_HEADER_V3: u32 = 0x03A617EB;
pub const GBL_TAG_ID_BOOTLOADER: u32 = 0xF50909F5;
pub const GBL_TAG_ID_APPLICATION: u32 = 0xF40A0AF4;
pub const GBL_TAG_ID_METADATA: u32 = 0xF60808F6;
pub const GBL_TAG_ID_PROG: u32 = 0xFE0101FE;
pub const GBL_TAG_ID_ERASEPROG: u32 = 0xFD0303FD;
pub const GBL_TAG_ID_END: u32 = 0xFC0404FC;
pub const GBL_TAG_ID_SE_UPGRADE: u32 = 0x5EA617EB;
pub const GBL_TAG_ID_VERSION_DEPENDENCY: u32 = 0x76A617EB;
pub const GBL_TAG_ID_ENC_INIT: u32 = 0xFA0606FA;
pub const GBL_TAG_ID_ENC_GBL_DATA: u32 = 0xF90707F9;
pub const GBL_TAG_ID_SIGNATURE_ECDSA_P256: u32 = 0xF70A0AF7;
pub const GBL_TAG_ID_CERTIFICATE_ECDSA_P256: u32 = 0xF30B0BF3;

/// Size of a tag header on the wire: id plus length, both little-endian.
pub const TAG_HEADER_LEN: usize = 8;

/// Major version of the container format this parser understands.
pub const GBL_VERSION_MAJOR: u8 = 3;

/// A decoded tag header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub tag_id: u32,
    pub length: u32,
}

impl TagHeader {
    pub fn parse(bytes: &[u8; TAG_HEADER_LEN]) -> Self {
        Self {
            tag_id: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            length: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// Contents of the application tag: what the image's application claims to
/// be. 28 bytes on the wire; later format revisions may append more, which
/// parsers ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicationData {
    pub app_type: u32,
    pub version: u32,
    pub capabilities: u32,
    pub product_id: [u8; 16],
}

/// Wire size of [`ApplicationData`].
pub const APPLICATION_DATA_LEN: usize = 28;

impl ApplicationData {
    pub fn parse(bytes: &[u8; APPLICATION_DATA_LEN]) -> Self {
        let mut product_id = [0u8; 16];
        product_id.copy_from_slice(&bytes[12..28]);
        Self {
            app_type: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            version: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            capabilities: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            product_id,
        }
    }
}

/// Bootloader upgrade information from the bootloader tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootloaderUpgrade {
    pub version: u32,
    pub address: u32,
}

/// Content-type flags for [`ImageProperties::contents`].
pub mod contents {
    pub const APPLICATION: u8 = 0x01;
    pub const BOOTLOADER: u8 = 0x02;
    pub const METADATA: u8 = 0x04;
}

/// Everything the parser learned about an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageProperties {
    /// Bitwise OR of [`contents`] flags for the tag types seen.
    pub contents: u8,

    /// The `gbl_type` word from the header tag.
    pub gbl_type: u32,

    /// Application information, if the image carried an application tag.
    pub application: Option<ApplicationData>,

    /// Bootloader upgrade information, if the image carried one.
    pub bootloader: Option<BootloaderUpgrade>,

    /// A valid end tag was seen and the whole-file CRC checked out.
    pub image_completed: bool,

    /// The image signature verified against the supplied public key.
    pub image_verified: bool,
}

impl ImageProperties {
    pub(crate) fn new() -> Self {
        Self {
            contents: 0,
            gbl_type: 0,
            application: None,
            bootloader: None,
            image_completed: false,
            image_verified: false,
        }
    }
}

/// Parse errors. Once any of these is returned the parser is stuck; a new
/// image requires a new parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GblParseError {
    /// A known tag appeared where the format does not allow it (e.g. a
    /// header tag that is not first, or a data tag after the signature).
    UnexpectedTag(u32),

    /// A tag id this parser has never heard of.
    UnknownTag(u32),

    /// A tag this parser recognizes but does not support (encrypted
    /// containers, SE upgrades, certificate chains).
    UnsupportedTag(u32),

    /// A tag's length field is impossible for its type.
    InvalidTagLength(u32),

    /// The header tag's version word is from a different format major.
    UnsupportedVersion(u32),

    /// The whole-file CRC32 did not land on the expected residual.
    CrcMismatch,

    /// A public key was supplied but the image ended without a valid
    /// signature.
    SignatureMissing,

    /// The signature tag failed verification.
    Signature(CryptoError),

    /// The sink refused data.
    Callback,

    /// Bytes arrived after the end tag.
    TrailingData,

    /// `finish()` was called before a valid end tag.
    Incomplete,
}

impl From<CryptoError> for GblParseError {
    fn from(e: CryptoError) -> Self {
        GblParseError::Signature(e)
    }
}
