use proptest::prelude::*;
use sealnote::{Envelope, Error, KdfParams, decrypt, encrypt_with_kdf};

fn fast() -> KdfParams {
    KdfParams::new(100).unwrap()
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Salt,
    Nonce,
    CipherText,
    Tag,
}

fn flip(env: &Envelope, field: Field, index: usize, bit: u8) -> Envelope {
    let mut salt = *env.salt();
    let mut nonce = *env.nonce();
    let mut ciphertext = env.ciphertext().to_vec();
    let mut tag = *env.tag();

    let mask = 1u8 << bit;
    match field {
        Field::Salt => salt[index % salt.len()] ^= mask,
        Field::Nonce => nonce[index % nonce.len()] ^= mask,
        Field::CipherText => {
            let len = ciphertext.len();
            ciphertext[index % len] ^= mask
        }
        Field::Tag => tag[index % tag.len()] ^= mask,
    }

    Envelope::new(*env.kdf(), salt, nonce, ciphertext, tag)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn roundtrip(message in any::<String>(), password in any::<String>()) {
        let env = encrypt_with_kdf(&message, &password, fast()).unwrap();
        prop_assert_eq!(env.ciphertext().len(), message.len());

        let decoded = Envelope::decode(&env.encode().unwrap()).unwrap();
        let plaintext = decrypt(&decoded, &password).unwrap();
        prop_assert_eq!(plaintext.as_str(), message.as_str());
    }

    #[test]
    fn wrong_password_is_rejected(
        message in any::<String>(),
        p1 in any::<String>(),
        p2 in any::<String>(),
    ) {
        prop_assume!(p1 != p2);
        let env = encrypt_with_kdf(&message, &p1, fast()).unwrap();
        prop_assert!(matches!(decrypt(&env, &p2), Err(Error::AuthenticationFailure)));
    }

    #[test]
    fn any_single_bit_flip_is_rejected(
        message in ".{1,64}",
        field in prop_oneof![
            Just(Field::Salt),
            Just(Field::Nonce),
            Just(Field::CipherText),
            Just(Field::Tag),
        ],
        index in any::<usize>(),
        bit in 0u8..8,
    ) {
        let env = encrypt_with_kdf(&message, "pw", fast()).unwrap();
        let tampered = flip(&env, field, index, bit);
        prop_assert!(matches!(decrypt(&tampered, "pw"), Err(Error::AuthenticationFailure)));
    }

    #[test]
    fn decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = Envelope::decode(&data);
    }
}
