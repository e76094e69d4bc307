// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! HKDF key derivation (RFC 5869), extract-then-expand over HMAC-SHA256.

use crate::error::CryptoError;
use crate::hmac::HmacSha256;
use crate::DIGEST_LEN;

/// HKDF-Extract: condense input keying material into a pseudorandom key.
///
/// An empty `salt` is treated as `DIGEST_LEN` zero bytes per RFC 5869 §2.2.
pub fn extract(salt: &[u8], ikm: &[u8]) -> [u8; DIGEST_LEN] {
    let zeros = [0u8; DIGEST_LEN];
    let salt = if salt.is_empty() { &zeros[..] } else { salt };

    let mut mac = HmacSha256::new(salt);
    mac.update(ikm);
    mac.finalise()
}

/// HKDF-Expand: stretch a pseudorandom key to `okm.len()` output bytes.
///
/// `okm` may be at most 255 hash lengths (8160 bytes); beyond that the
/// counter byte would wrap and `OutputTooLong` is returned. An empty `okm`
/// is a no-op.
pub fn expand(prk: &[u8; DIGEST_LEN], info: &[u8], okm: &mut [u8]) -> Result<(), CryptoError> {
    if okm.len() > 255 * DIGEST_LEN {
        return Err(CryptoError::OutputTooLong);
    }

    let mut previous: Option<[u8; DIGEST_LEN]> = None;
    for (counter, block) in okm.chunks_mut(DIGEST_LEN).enumerate() {
        // T(i) = HMAC(prk, T(i-1) | info | i), with i starting at 1.
        let mut mac = HmacSha256::new(prk);
        if let Some(prev) = previous {
            mac.update(&prev);
        }
        mac.update(info);
        mac.update(&[(counter + 1) as u8]);
        let t = mac.finalise();

        block.copy_from_slice(&t[..block.len()]);
        previous = Some(t);
    }

    Ok(())
}

/// HKDF-Extract followed by HKDF-Expand.
pub fn derive(salt: &[u8], ikm: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), CryptoError> {
    let prk = extract(salt, ikm);
    expand(&prk, info, okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unhex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    // RFC 5869 Appendix A.1.
    #[test]
    fn rfc5869_a1() {
        let ikm = [0x0b; 22];
        let salt = unhex("000102030405060708090a0b0c");
        let info = unhex("f0f1f2f3f4f5f6f7f8f9");

        let prk = extract(&salt, &ikm);
        assert_eq!(
            prk.to_vec(),
            unhex("077709362c2e32df0ddc3f0dc47bba6390b6c73bb50f9c3122ec844ad7c2b3e5")
        );

        let mut okm = [0u8; 42];
        expand(&prk, &info, &mut okm).unwrap();
        assert_eq!(
            okm.to_vec(),
            unhex(
                "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf\
                 34007208d5b887185865"
            )
        );
    }

    // RFC 5869 Appendix A.3: zero-length salt and info.
    #[test]
    fn rfc5869_a3() {
        let ikm = [0x0b; 22];

        let prk = extract(&[], &ikm);
        assert_eq!(
            prk.to_vec(),
            unhex("19ef24a32c717b167f33a91d6f648bdf96596776afdb6377ac434c1c293ccb04")
        );

        let mut okm = [0u8; 42];
        expand(&prk, &[], &mut okm).unwrap();
        assert_eq!(
            okm.to_vec(),
            unhex(
                "8da4e775a563c18f715f802a063c5a31b8a11f5c5ee1879ec3454e5f3c738d2d\
                 9d201395faa4b61a96c8"
            )
        );
    }

    #[test]
    fn derive_matches_extract_expand() {
        let salt = unhex("000102030405060708090a0b0c");
        let info = unhex("f0f1f2f3f4f5f6f7f8f9");

        let mut okm_a = [0u8; 42];
        derive(&salt, &[0x0b; 22], &info, &mut okm_a).unwrap();

        let prk = extract(&salt, &[0x0b; 22]);
        let mut okm_b = [0u8; 42];
        expand(&prk, &info, &mut okm_b).unwrap();

        assert_eq!(okm_a, okm_b);
    }

    #[test]
    fn empty_output_is_ok() {
        let prk = extract(&[], &[0x0b; 22]);
        expand(&prk, &[], &mut []).unwrap();
    }

    #[test]
    fn over_long_output_is_rejected() {
        let prk = extract(&[], &[0x0b; 22]);
        let mut okm = vec![0u8; 255 * DIGEST_LEN + 1];
        assert_eq!(
            expand(&prk, &[], &mut okm),
            Err(CryptoError::OutputTooLong)
        );
    }

    #[test]
    fn max_length_output_is_ok() {
        let prk = extract(&[], &[0x0b; 22]);
        let mut okm = vec![0u8; 255 * DIGEST_LEN];
        expand(&prk, &[], &mut okm).unwrap();
    }
}
