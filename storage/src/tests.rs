// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

use std::cell::RefCell;

use crate::error_codes::ErrorCode;
use crate::flash_controller::FlashController;
use crate::storage::{BootloadInfo, ImageStorage, Slot};

const PAGE: usize = 1024;
const PAGES: usize = 64;
const FLASH_SIZE: usize = PAGE * PAGES;

static SLOTS: [Slot; 2] = [
    Slot {
        address: 0,
        length: 16 * PAGE,
    },
    Slot {
        address: 16 * PAGE,
        length: 16 * PAGE,
    },
];

/// An in-memory flash model.
struct FlashCtrl {
    buf: RefCell<[[u8; PAGE]; PAGES]>,
}

impl FlashCtrl {
    fn new() -> Self {
        Self {
            buf: RefCell::new([[0xFF; PAGE]; PAGES]),
        }
    }
}

impl FlashController<PAGE> for FlashCtrl {
    fn read_region(&self, region_number: usize, buf: &mut [u8; PAGE]) -> Result<(), ErrorCode> {
        buf.copy_from_slice(&self.buf.borrow()[region_number]);
        Ok(())
    }

    fn write(&self, address: usize, buf: &[u8]) -> Result<(), ErrorCode> {
        for (i, d) in buf.iter().enumerate() {
            let address = address + i;
            self.buf.borrow_mut()[address / PAGE][address % PAGE] = *d;
        }
        Ok(())
    }

    fn erase_region(&self, region_number: usize) -> Result<(), ErrorCode> {
        for b in self.buf.borrow_mut()[region_number].iter_mut() {
            *b = 0xFF;
        }
        Ok(())
    }
}

/// Flip a bit behind the storage layer's back.
fn corrupt(ctrl: &FlashCtrl, address: usize) {
    ctrl.buf.borrow_mut()[address / PAGE][address % PAGE] ^= 0x01;
}

mod layout {
    use super::*;

    fn try_layout(slots: &[Slot]) -> Result<(), ErrorCode> {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        ImageStorage::new(FlashCtrl::new(), slots, &mut read_buf, FLASH_SIZE).map(|_| ())
    }

    #[test]
    fn valid_layout_is_accepted() {
        try_layout(&SLOTS).unwrap();
    }

    #[test]
    fn misaligned_or_empty_slots_are_rejected() {
        for slots in [
            [Slot {
                address: 100,
                length: PAGE,
            }],
            [Slot {
                address: 0,
                length: PAGE + 100,
            }],
            [Slot {
                address: 0,
                length: 0,
            }],
        ] {
            assert_eq!(try_layout(&slots), Err(ErrorCode::InvalidLayout));
        }
    }

    #[test]
    fn overlapping_slots_are_rejected() {
        let slots = [
            Slot {
                address: 0,
                length: 4 * PAGE,
            },
            Slot {
                address: 2 * PAGE,
                length: 4 * PAGE,
            },
        ];
        assert_eq!(try_layout(&slots), Err(ErrorCode::InvalidLayout));
    }

    #[test]
    fn slot_reaching_the_info_page_is_rejected() {
        // The last page belongs to the bootload info.
        let slots = [Slot {
            address: 0,
            length: FLASH_SIZE,
        }];
        assert_eq!(try_layout(&slots), Err(ErrorCode::InvalidLayout));

        let slots = [Slot {
            address: FLASH_SIZE - PAGE,
            length: PAGE,
        }];
        assert_eq!(try_layout(&slots), Err(ErrorCode::InvalidLayout));
    }
}

mod chunks {
    use super::*;

    #[test]
    fn chunks_round_trip_across_pages() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        storage.erase_slot(1).unwrap();
        let data: Vec<u8> = (0..3000u32).map(|i| i as u8).collect();
        // Straddles the page boundary at offset 1024.
        storage.write_chunk(1, 900, &data).unwrap();

        let mut back = vec![0u8; data.len()];
        storage.read_chunk(1, 900, &mut back).unwrap();
        assert_eq!(back, data);

        // A read offset into the middle of the write.
        let mut tail = vec![0u8; 100];
        storage.read_chunk(1, 900 + 2000, &mut tail).unwrap();
        assert_eq!(tail, data[2000..2100]);
    }

    #[test]
    fn erase_restores_blank_flash() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        storage.write_chunk(0, 0, &[0x00; 256]).unwrap();
        storage.erase_slot(0).unwrap();

        let mut back = [0u8; 256];
        storage.read_chunk(0, 0, &mut back).unwrap();
        assert_eq!(back, [0xFF; 256]);
    }

    #[test]
    fn zero_length_operations_succeed() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        storage.write_chunk(0, SLOTS[0].length, &[]).unwrap();
        storage.read_chunk(0, SLOTS[0].length, &mut []).unwrap();
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        assert_eq!(
            storage.write_chunk(0, SLOTS[0].length - 4, &[0; 8]),
            Err(ErrorCode::OffsetOutOfRange)
        );
        assert_eq!(
            storage.read_chunk(0, SLOTS[0].length, &mut [0; 1]),
            Err(ErrorCode::OffsetOutOfRange)
        );
        assert_eq!(
            storage.write_chunk(2, 0, &[0; 4]),
            Err(ErrorCode::InvalidSlot)
        );
    }
}

mod bootload_info {
    use super::*;

    #[test]
    fn info_round_trips() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        let info = BootloadInfo {
            slot: 1,
            image_crc: 0xDEAD_BEEF,
        };
        storage.write_bootload_info(&info).unwrap();
        assert_eq!(storage.read_bootload_info(), Ok(info));

        // Rewriting replaces the previous request.
        let info = BootloadInfo {
            slot: 0,
            image_crc: 0x1234_5678,
        };
        storage.write_bootload_info(&info).unwrap();
        assert_eq!(storage.read_bootload_info(), Ok(info));
    }

    #[test]
    fn blank_info_page_is_invalid() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        assert_eq!(
            storage.read_bootload_info(),
            Err(ErrorCode::MetadataInvalid)
        );
    }

    #[test]
    fn corrupted_info_page_is_invalid() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        storage
            .write_bootload_info(&BootloadInfo {
                slot: 1,
                image_crc: 0,
            })
            .unwrap();
        corrupt(&storage.controller, FLASH_SIZE - PAGE + 8);

        assert_eq!(
            storage.read_bootload_info(),
            Err(ErrorCode::MetadataInvalid)
        );
    }
}

mod verify {
    use super::*;
    use gbl_parser::types::{
        GBL_TAG_ID_END, GBL_TAG_ID_HEADER_V3, GBL_TAG_ID_PROG, GBL_TAG_ID_SIGNATURE_ECDSA_P256,
    };
    use p256::ecdsa::signature::hazmat::PrehashSigner;
    use p256::ecdsa::{Signature, SigningKey};
    use sha2::{Digest, Sha256};

    fn tag(id: u32, contents: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&(contents.len() as u32).to_le_bytes());
        out.extend_from_slice(contents);
        out
    }

    fn image_body() -> Vec<u8> {
        let mut contents = Vec::new();
        contents.extend_from_slice(&0x0300_0000u32.to_le_bytes());
        contents.extend_from_slice(&0u32.to_le_bytes());
        let mut body = tag(GBL_TAG_ID_HEADER_V3, &contents);

        let mut prog = Vec::new();
        prog.extend_from_slice(&0x4000u32.to_le_bytes());
        prog.extend_from_slice(&[0x11; 700]);
        body.extend_from_slice(&tag(GBL_TAG_ID_PROG, &prog));
        body
    }

    fn seal(mut body: Vec<u8>) -> Vec<u8> {
        body.extend_from_slice(&GBL_TAG_ID_END.to_le_bytes());
        body.extend_from_slice(&4u32.to_le_bytes());
        let crc = edc::crc32(&body);
        body.extend_from_slice(&crc.to_le_bytes());
        body
    }

    /// Stage an image in slot 0 through the chunked write path.
    fn stage(storage: &ImageStorage<'_, FlashCtrl, PAGE>, image: &[u8]) {
        storage.erase_slot(0).unwrap();
        for (i, chunk) in image.chunks(64).enumerate() {
            storage.write_chunk(0, i * 64, chunk).unwrap();
        }
    }

    #[test]
    fn stored_image_verifies() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        let image = seal(image_body());
        stage(&storage, &image);

        let properties = storage.verify_slot(0, None).unwrap();
        assert!(properties.image_completed);
        assert!(!properties.image_verified);
    }

    #[test]
    fn blank_slot_fails_verification() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        storage.erase_slot(0).unwrap();
        assert_eq!(storage.verify_slot(0, None), Err(ErrorCode::CorruptImage));
    }

    #[test]
    fn corrupted_image_fails_verification() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        let image = seal(image_body());
        stage(&storage, &image);
        corrupt(&storage.controller, SLOTS[0].address + image.len() / 2);

        assert_eq!(storage.verify_slot(0, None), Err(ErrorCode::CorruptImage));
    }

    #[test]
    fn truncated_image_fails_verification() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        let image = seal(image_body());
        storage.erase_slot(0).unwrap();
        storage.write_chunk(0, 0, &image[..image.len() - 8]).unwrap();

        assert_eq!(storage.verify_slot(0, None), Err(ErrorCode::CorruptImage));
    }

    #[test]
    fn signed_image_verifies_against_key() {
        let mut read_buf: [u8; PAGE] = [0; PAGE];
        let storage =
            ImageStorage::new(FlashCtrl::new(), &SLOTS, &mut read_buf, FLASH_SIZE).unwrap();

        let key = SigningKey::from_bytes(&[0x01; 32].into()).unwrap();
        let point = key.verifying_key().to_encoded_point(false);
        let mut public_key = [0u8; 64];
        public_key.copy_from_slice(&point.as_bytes()[1..65]);

        let mut body = image_body();
        let digest: [u8; 32] = Sha256::digest(&body).into();
        let signature: Signature = key.sign_prehash(&digest).unwrap();
        body.extend_from_slice(&tag(
            GBL_TAG_ID_SIGNATURE_ECDSA_P256,
            &signature.to_bytes()[..],
        ));
        let image = seal(body);
        stage(&storage, &image);

        let properties = storage.verify_slot(0, Some(&public_key)).unwrap();
        assert!(properties.image_verified);

        // The same key rejects the unsigned variant.
        let image = seal(image_body());
        stage(&storage, &image);
        assert_eq!(
            storage.verify_slot(0, Some(&public_key)),
            Err(ErrorCode::CorruptImage)
        );
    }
}
