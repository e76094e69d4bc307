// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! The GBL parser state machine.
//!
//! Tags are pulled apart as bytes arrive. Fixed-size pieces (tag headers,
//! the application info block, the signature) are collected in a small hold
//! buffer so they may straddle chunk boundaries; bulk payloads stream
//! straight through to the sink without copying.
//!
//! Two digests run alongside parsing: a CRC32 over every file byte, which
//! must land on the append residual when the end tag closes the file, and
//! a SHA-256 over the signed prefix (everything before the signature tag
//! header) for ECDSA verification.

use core::cmp;

use sha2::{Digest, Sha256};

use edc::Crc32;
use ota_crypto::ecdsa;

use crate::types::*;

/// Receiver for image payloads as they stream through the parser.
///
/// Addresses and offsets restate where each piece belongs, so
/// implementations do not need to track parser state: consecutive calls
/// within one tag carry consecutive addresses.
pub trait ImageSink {
    /// Program data (prog / erase-prog tags) destined for `address`.
    fn program_data(&mut self, address: u32, data: &[u8]) -> Result<(), SinkError>;

    /// Bootloader upgrade data destined for `address`.
    fn bootloader_data(&mut self, address: u32, data: &[u8]) -> Result<(), SinkError>;

    /// Opaque metadata, with a running offset across all metadata tags.
    fn metadata(&mut self, offset: u32, data: &[u8]) -> Result<(), SinkError>;
}

/// Returned by a sink to abort the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkError;

/// Size of the hold buffer: the largest fixed-size piece is the 64-byte
/// signature.
const HOLD_LEN: usize = 64;

#[derive(Clone, Copy)]
enum State {
    /// Collecting the next 8-byte tag header.
    TagHeader,
    /// Collecting the header tag contents (version, gbl_type).
    HeaderContents,
    /// Collecting the 28-byte application info block; `tag_length` is the
    /// full contents length, anything beyond the block is skipped.
    ApplicationInfo { tag_length: u32 },
    /// Collecting the bootloader tag's version and address words.
    BootloaderInfo { tag_length: u32 },
    /// Streaming bootloader upgrade data to the sink.
    BootloaderData { remaining: u32, address: u32 },
    /// Collecting a prog tag's 4-byte target address.
    ProgAddress { tag_length: u32 },
    /// Streaming program data to the sink.
    ProgData { remaining: u32, address: u32 },
    /// Streaming metadata to the sink.
    MetadataData { remaining: u32 },
    /// Skipping contents that carry no information for us.
    SkipContents { remaining: u32 },
    /// Collecting the 64-byte signature.
    SignatureContents,
    /// Collecting the end tag's CRC word.
    EndContents,
    /// A valid end tag was consumed; any further byte is an error.
    Done,
}

/// Streaming GBL image parser.
///
/// If `public_key` is supplied the image must carry a signature tag that
/// verifies against it; without a key, signatures are skipped and
/// [`ImageProperties::image_verified`] stays false.
pub struct GblParser<'a, S: ImageSink> {
    sink: &'a mut S,
    public_key: Option<&'a [u8; ecdsa::KEY_LEN]>,

    state: State,
    saw_header: bool,
    saw_signature: bool,

    hold: [u8; HOLD_LEN],
    hold_len: usize,

    file_crc: Crc32,
    signed_prefix: Sha256,
    metadata_offset: u32,

    properties: ImageProperties,
}

impl<'a, S: ImageSink> GblParser<'a, S> {
    pub fn new(sink: &'a mut S, public_key: Option<&'a [u8; ecdsa::KEY_LEN]>) -> Self {
        Self {
            sink,
            public_key,
            state: State::TagHeader,
            saw_header: false,
            saw_signature: false,
            hold: [0; HOLD_LEN],
            hold_len: 0,
            file_crc: Crc32::new(),
            signed_prefix: Sha256::new(),
            metadata_offset: 0,
            properties: ImageProperties::new(),
        }
    }

    /// Consume the next chunk of the file. Chunks may be any size,
    /// including empty; tags may straddle chunk boundaries.
    pub fn parse(&mut self, chunk: &[u8]) -> Result<(), GblParseError> {
        let mut input = chunk;
        while !input.is_empty() {
            input = self.step(input)?;
        }
        Ok(())
    }

    /// True once a valid end tag has been consumed.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Finish the parse and hand back what was learned about the image.
    /// Fails unless the file closed with a valid end tag.
    pub fn finish(self) -> Result<ImageProperties, GblParseError> {
        if self.is_done() {
            Ok(self.properties)
        } else {
            Err(GblParseError::Incomplete)
        }
    }

    /// Move bytes from `input` into the hold buffer until it holds `need`
    /// bytes. Returns the unconsumed remainder and whether the hold buffer
    /// is now full.
    fn gather<'b>(&mut self, input: &'b [u8], need: usize) -> (&'b [u8], bool) {
        let take = cmp::min(need - self.hold_len, input.len());
        self.hold[self.hold_len..self.hold_len + take].copy_from_slice(&input[..take]);
        self.hold_len += take;
        (&input[take..], self.hold_len == need)
    }

    /// Account streamed payload bytes in both running digests.
    fn digest_payload(&mut self, data: &[u8]) {
        self.file_crc.update(data);
        self.signed_prefix.update(data);
    }

    fn step<'b>(&mut self, input: &'b [u8]) -> Result<&'b [u8], GblParseError> {
        match self.state {
            State::TagHeader => {
                let (rest, complete) = self.gather(input, TAG_HEADER_LEN);
                if complete {
                    let mut bytes = [0u8; TAG_HEADER_LEN];
                    bytes.copy_from_slice(&self.hold[..TAG_HEADER_LEN]);
                    self.hold_len = 0;

                    let header = TagHeader::parse(&bytes);
                    self.file_crc.update(&bytes);
                    if header.tag_id != GBL_TAG_ID_SIGNATURE_ECDSA_P256 {
                        // The signed prefix stops at the signature tag
                        // header; every other header is part of it.
                        self.signed_prefix.update(&bytes);
                    }
                    self.state = self.dispatch(header)?;
                }
                Ok(rest)
            }

            State::HeaderContents => {
                let (rest, complete) = self.gather(input, 8);
                if complete {
                    let bytes = [
                        self.hold[0], self.hold[1], self.hold[2], self.hold[3], self.hold[4],
                        self.hold[5], self.hold[6], self.hold[7],
                    ];
                    self.hold_len = 0;
                    self.digest_payload(&bytes);

                    let version = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    if (version >> 24) as u8 != GBL_VERSION_MAJOR {
                        return Err(GblParseError::UnsupportedVersion(version));
                    }
                    self.properties.gbl_type =
                        u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
                    self.state = State::TagHeader;
                }
                Ok(rest)
            }

            State::ApplicationInfo { tag_length } => {
                let (rest, complete) = self.gather(input, APPLICATION_DATA_LEN);
                if complete {
                    let mut bytes = [0u8; APPLICATION_DATA_LEN];
                    bytes.copy_from_slice(&self.hold[..APPLICATION_DATA_LEN]);
                    self.hold_len = 0;
                    self.digest_payload(&bytes);

                    self.properties.application = Some(ApplicationData::parse(&bytes));
                    self.properties.contents |= contents::APPLICATION;

                    let remaining = tag_length - APPLICATION_DATA_LEN as u32;
                    self.state = if remaining > 0 {
                        State::SkipContents { remaining }
                    } else {
                        State::TagHeader
                    };
                }
                Ok(rest)
            }

            State::BootloaderInfo { tag_length } => {
                let (rest, complete) = self.gather(input, 8);
                if complete {
                    let bytes = [
                        self.hold[0], self.hold[1], self.hold[2], self.hold[3], self.hold[4],
                        self.hold[5], self.hold[6], self.hold[7],
                    ];
                    self.hold_len = 0;
                    self.digest_payload(&bytes);

                    let version = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    let address = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
                    self.properties.bootloader = Some(BootloaderUpgrade { version, address });
                    self.properties.contents |= contents::BOOTLOADER;

                    let remaining = tag_length - 8;
                    self.state = if remaining > 0 {
                        State::BootloaderData { remaining, address }
                    } else {
                        State::TagHeader
                    };
                }
                Ok(rest)
            }

            State::BootloaderData { remaining, address } => {
                let n = cmp::min(remaining as usize, input.len());
                let (data, rest) = input.split_at(n);
                self.digest_payload(data);
                self.sink
                    .bootloader_data(address, data)
                    .map_err(|_| GblParseError::Callback)?;

                let remaining = remaining - n as u32;
                self.state = if remaining == 0 {
                    State::TagHeader
                } else {
                    State::BootloaderData {
                        remaining,
                        address: address.wrapping_add(n as u32),
                    }
                };
                Ok(rest)
            }

            State::ProgAddress { tag_length } => {
                let (rest, complete) = self.gather(input, 4);
                if complete {
                    let bytes = [self.hold[0], self.hold[1], self.hold[2], self.hold[3]];
                    self.hold_len = 0;
                    self.digest_payload(&bytes);

                    let address = u32::from_le_bytes(bytes);
                    let remaining = tag_length - 4;
                    self.state = if remaining > 0 {
                        State::ProgData { remaining, address }
                    } else {
                        State::TagHeader
                    };
                }
                Ok(rest)
            }

            State::ProgData { remaining, address } => {
                let n = cmp::min(remaining as usize, input.len());
                let (data, rest) = input.split_at(n);
                self.digest_payload(data);
                self.sink
                    .program_data(address, data)
                    .map_err(|_| GblParseError::Callback)?;

                let remaining = remaining - n as u32;
                self.state = if remaining == 0 {
                    State::TagHeader
                } else {
                    State::ProgData {
                        remaining,
                        address: address.wrapping_add(n as u32),
                    }
                };
                Ok(rest)
            }

            State::MetadataData { remaining } => {
                let n = cmp::min(remaining as usize, input.len());
                let (data, rest) = input.split_at(n);
                self.digest_payload(data);
                let offset = self.metadata_offset;
                self.sink
                    .metadata(offset, data)
                    .map_err(|_| GblParseError::Callback)?;
                self.metadata_offset = offset.wrapping_add(n as u32);

                let remaining = remaining - n as u32;
                self.state = if remaining == 0 {
                    State::TagHeader
                } else {
                    State::MetadataData { remaining }
                };
                Ok(rest)
            }

            State::SkipContents { remaining } => {
                let n = cmp::min(remaining as usize, input.len());
                let (data, rest) = input.split_at(n);
                self.digest_payload(data);

                let remaining = remaining - n as u32;
                self.state = if remaining == 0 {
                    State::TagHeader
                } else {
                    State::SkipContents { remaining }
                };
                Ok(rest)
            }

            State::SignatureContents => {
                let (rest, complete) = self.gather(input, ecdsa::SIGNATURE_LEN);
                if complete {
                    let mut signature = [0u8; ecdsa::SIGNATURE_LEN];
                    signature.copy_from_slice(&self.hold[..ecdsa::SIGNATURE_LEN]);
                    self.hold_len = 0;
                    // The signature is file data for the CRC, but not part
                    // of the signed prefix.
                    self.file_crc.update(&signature);

                    if let Some(key) = self.public_key {
                        let digest: [u8; 32] = self.signed_prefix.clone().finalize().into();
                        ecdsa::verify_signature(key, &digest, &signature)?;
                        self.properties.image_verified = true;
                    }
                    self.state = State::TagHeader;
                }
                Ok(rest)
            }

            State::EndContents => {
                let (rest, complete) = self.gather(input, 4);
                if complete {
                    let bytes = [self.hold[0], self.hold[1], self.hold[2], self.hold[3]];
                    self.hold_len = 0;
                    self.file_crc.update(&bytes);

                    // The end tag's CRC word is the CRC32 of everything
                    // before it, so the running CRC over the whole file
                    // must now sit on the append residual.
                    if self.file_crc.finalise() != Crc32::RESIDUAL {
                        return Err(GblParseError::CrcMismatch);
                    }
                    if self.public_key.is_some() && !self.properties.image_verified {
                        return Err(GblParseError::SignatureMissing);
                    }
                    self.properties.image_completed = true;
                    self.state = State::Done;
                }
                Ok(rest)
            }

            State::Done => Err(GblParseError::TrailingData),
        }
    }

    /// Decide what a tag header means in the current position.
    fn dispatch(&mut self, header: TagHeader) -> Result<State, GblParseError> {
        // The header tag must come first, and only first.
        if !self.saw_header {
            if header.tag_id != GBL_TAG_ID_HEADER_V3 {
                return Err(GblParseError::UnexpectedTag(header.tag_id));
            }
            if header.length != 8 {
                return Err(GblParseError::InvalidTagLength(header.tag_id));
            }
            self.saw_header = true;
            return Ok(State::HeaderContents);
        }

        // Nothing unsigned may follow the signature except the end tag.
        if self.saw_signature && header.tag_id != GBL_TAG_ID_END {
            return Err(GblParseError::UnexpectedTag(header.tag_id));
        }

        match header.tag_id {
            GBL_TAG_ID_HEADER_V3 => Err(GblParseError::UnexpectedTag(header.tag_id)),

            GBL_TAG_ID_APPLICATION => {
                if (header.length as usize) < APPLICATION_DATA_LEN {
                    return Err(GblParseError::InvalidTagLength(header.tag_id));
                }
                Ok(State::ApplicationInfo {
                    tag_length: header.length,
                })
            }

            GBL_TAG_ID_BOOTLOADER => {
                if header.length < 8 {
                    return Err(GblParseError::InvalidTagLength(header.tag_id));
                }
                Ok(State::BootloaderInfo {
                    tag_length: header.length,
                })
            }

            GBL_TAG_ID_PROG | GBL_TAG_ID_ERASEPROG => {
                if header.length < 4 {
                    return Err(GblParseError::InvalidTagLength(header.tag_id));
                }
                Ok(State::ProgAddress {
                    tag_length: header.length,
                })
            }

            GBL_TAG_ID_METADATA => {
                self.properties.contents |= contents::METADATA;
                if header.length == 0 {
                    Ok(State::TagHeader)
                } else {
                    Ok(State::MetadataData {
                        remaining: header.length,
                    })
                }
            }

            GBL_TAG_ID_VERSION_DEPENDENCY => {
                if header.length == 0 {
                    Ok(State::TagHeader)
                } else {
                    Ok(State::SkipContents {
                        remaining: header.length,
                    })
                }
            }

            GBL_TAG_ID_SIGNATURE_ECDSA_P256 => {
                if header.length as usize != ecdsa::SIGNATURE_LEN {
                    return Err(GblParseError::InvalidTagLength(header.tag_id));
                }
                self.saw_signature = true;
                Ok(State::SignatureContents)
            }

            GBL_TAG_ID_END => {
                if header.length != 4 {
                    return Err(GblParseError::InvalidTagLength(header.tag_id));
                }
                Ok(State::EndContents)
            }

            GBL_TAG_ID_SE_UPGRADE
            | GBL_TAG_ID_ENC_INIT
            | GBL_TAG_ID_ENC_GBL_DATA
            | GBL_TAG_ID_CERTIFICATE_ECDSA_P256 => {
                Err(GblParseError::UnsupportedTag(header.tag_id))
            }

            _ => Err(GblParseError::UnknownTag(header.tag_id)),
        }
    }
}
