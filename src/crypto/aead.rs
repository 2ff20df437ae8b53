use super::{KEY_LEN, NONCE_LEN, TAG_LEN};
use crate::error::{Error, Result};
use aes_gcm::{
    Aes256Gcm, Key, Nonce, Tag,
    aead::{AeadInPlace, KeyInit},
};
use zeroize::Zeroizing;

/// Encrypt plaintext with AES-256-GCM.
///
/// Returns the ciphertext (same length as `plaintext`) and the detached tag.
/// The nonce must never be reused under the same key; this function does not
/// track nonces, callers draw a fresh one per call.
pub fn encrypt(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN])> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut buf = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut buf)
        .map_err(|_| Error::Encryption)?;

    let mut out = [0u8; TAG_LEN];
    out.copy_from_slice(&tag);

    Ok((buf, out))
}

/// Verify the tag and decrypt.
///
/// Nothing is returned unless the tag checks out; the working buffer is
/// zeroed on failure. Wrong key and tampered input yield the same error.
pub fn decrypt(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut buf = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            &mut *buf,
            Tag::from_slice(tag),
        )
        .map_err(|_| Error::AuthenticationFailure)?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_LEN] = [9u8; KEY_LEN];
    const NONCE: [u8; NONCE_LEN] = [3u8; NONCE_LEN];

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let (ciphertext, tag) = encrypt(&KEY, &NONCE, b"secret data").unwrap();
        let plaintext = decrypt(&KEY, &NONCE, &ciphertext, &tag).unwrap();
        assert_eq!(plaintext.as_slice(), b"secret data");
    }

    #[test]
    fn ciphertext_has_plaintext_length() {
        for len in [0usize, 1, 5, 16, 17, 1000] {
            let data = vec![0xabu8; len];
            let (ciphertext, _) = encrypt(&KEY, &NONCE, &data).unwrap();
            assert_eq!(ciphertext.len(), len);
        }
    }

    #[test]
    fn wrong_key_fails() {
        let (ciphertext, tag) = encrypt(&KEY, &NONCE, b"hello").unwrap();
        let other = [8u8; KEY_LEN];
        assert!(matches!(
            decrypt(&other, &NONCE, &ciphertext, &tag),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn tampered_tag_fails() {
        let (ciphertext, mut tag) = encrypt(&KEY, &NONCE, b"hello").unwrap();
        tag[0] ^= 1;
        assert!(matches!(
            decrypt(&KEY, &NONCE, &ciphertext, &tag),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn tampered_nonce_fails() {
        let (ciphertext, tag) = encrypt(&KEY, &NONCE, b"hello").unwrap();
        let mut nonce = NONCE;
        nonce[11] ^= 0x80;
        assert!(matches!(
            decrypt(&KEY, &nonce, &ciphertext, &tag),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn cipher_round_keys_are_wiped_on_drop() {
        fn assert_zeroize_on_drop<T: zeroize::ZeroizeOnDrop>() {}
        assert_zeroize_on_drop::<aes::Aes256>();
    }

    // NIST GCM test cases 13 and 14 (256-bit zero key, zero IV)
    #[test]
    fn matches_gcm_vectors() {
        let zero_key = [0u8; KEY_LEN];
        let zero_nonce = [0u8; NONCE_LEN];

        let (ciphertext, tag) = encrypt(&zero_key, &zero_nonce, b"").unwrap();
        assert!(ciphertext.is_empty());
        assert_eq!(
            tag,
            [
                0x53, 0x0f, 0x8a, 0xfb, 0xc7, 0x45, 0x36, 0xb9, 0xa9, 0x63, 0xb4, 0xf1, 0xc4, 0xcb,
                0x73, 0x8b
            ]
        );

        let (ciphertext, tag) = encrypt(&zero_key, &zero_nonce, &[0u8; 16]).unwrap();
        assert_eq!(
            ciphertext,
            [
                0xce, 0xa7, 0x40, 0x3d, 0x4d, 0x60, 0x6b, 0x6e, 0x07, 0x4e, 0xc5, 0xd3, 0xba, 0xf3,
                0x9d, 0x18
            ]
        );
        assert_eq!(
            tag,
            [
                0xd0, 0xd1, 0xc8, 0xa7, 0x99, 0x99, 0x6b, 0xf0, 0x26, 0x5b, 0x98, 0xb5, 0xd4, 0x8a,
                0xb9, 0x19
            ]
        );
    }
}
