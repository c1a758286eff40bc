//! RSAES-OAEP (PKCS #1 v2.2, section 7.1) with SHA-256, MGF1-SHA-256 and an empty label.

use num_bigint::BigUint;

use super::bigint::{fill_random, to_fixed_bytes};
use super::compare::constant_time_eq;
use super::keys::{KeyPair, PublicKey};
use super::sha256::{sha256, Sha256, DIGEST_SIZE};
use super::CryptoError;

/// `lHash` for the empty label
fn label_hash() -> [u8; DIGEST_SIZE] {
    sha256(&[])
}

/// MGF1 mask generation over SHA-256.
pub(crate) fn mgf1(seed: &[u8], len: usize) -> Vec<u8> {
    let mut mask = Vec::with_capacity(len + DIGEST_SIZE);
    let mut counter: u32 = 0;
    while mask.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(&counter.to_be_bytes());
        mask.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    mask.truncate(len);
    mask
}

fn xor_in_place(target: &mut [u8], mask: &[u8]) {
    for (t, m) in target.iter_mut().zip(mask) {
        *t ^= m;
    }
}

/// Largest plaintext that fits in a single block for a `k`-byte modulus.
pub fn max_message_len(k: usize) -> Option<usize> {
    k.checked_sub(2 * DIGEST_SIZE + 2).filter(|max| *max > 0)
}

/// Encrypt one block of at most [`max_message_len`] bytes into exactly `k` bytes.
pub fn encrypt_block(key: &PublicKey, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let k = key.size_bytes();
    let max = max_message_len(k).ok_or(CryptoError::KeyTooSmall(k))?;
    if message.len() > max {
        return Err(CryptoError::MessageTooLong {
            len: message.len(),
            max,
        });
    }

    // DB = lHash || PS || 0x01 || M
    let db_len = k - DIGEST_SIZE - 1;
    let mut db = Vec::with_capacity(db_len);
    db.extend_from_slice(&label_hash());
    db.resize(db_len - message.len() - 1, 0);
    db.push(0x01);
    db.extend_from_slice(message);

    let mut seed = [0u8; DIGEST_SIZE];
    fill_random(&mut seed);

    xor_in_place(&mut db, &mgf1(&seed, db_len));
    xor_in_place(&mut seed, &mgf1(&db, DIGEST_SIZE));

    let mut em = Vec::with_capacity(k);
    em.push(0x00);
    em.extend_from_slice(&seed);
    em.extend_from_slice(&db);

    let c = key.apply(&BigUint::from_bytes_be(&em));
    to_fixed_bytes(&c, k).ok_or(CryptoError::OutOfRange)
}

/// Decrypt one `k`-byte block.
///
/// Every structural failure maps to the same [`CryptoError::Decryption`] so callers cannot
/// tell which check rejected the block.
pub fn decrypt_block(key_pair: &KeyPair, block: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let k = key_pair.size_bytes();
    if max_message_len(k).is_none() {
        return Err(CryptoError::KeyTooSmall(k));
    }
    if block.len() != k {
        return Err(CryptoError::Decryption);
    }

    let c = BigUint::from_bytes_be(block);
    if &c >= key_pair.modulus() {
        return Err(CryptoError::Decryption);
    }
    let mut em = to_fixed_bytes(&key_pair.apply_private(&c), k).ok_or(CryptoError::Decryption)?;

    let (y, rest) = em.split_at_mut(1);
    let (seed, db) = rest.split_at_mut(DIGEST_SIZE);
    xor_in_place(seed, &mgf1(db, DIGEST_SIZE));
    xor_in_place(db, &mgf1(seed, db.len()));

    let hash_ok = constant_time_eq(&db[..DIGEST_SIZE], &label_hash());

    // first non-zero byte after lHash must be the 0x01 separator
    let separator = db[DIGEST_SIZE..].iter().position(|b| *b != 0);
    let separator_ok = separator
        .map(|i| db[DIGEST_SIZE + i] == 0x01)
        .unwrap_or(false);

    if y[0] != 0 || !hash_ok || !separator_ok {
        return Err(CryptoError::Decryption);
    }
    let start = DIGEST_SIZE + separator.unwrap_or_default() + 1;
    Ok(db[start..].to_vec())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testkit::keys::{test_key_pair, TestKey};

    #[test]
    fn test_mgf1_known_prefix() {
        // MGF1-SHA256("", 32) is SHA256(0x00000000)
        assert_eq!(mgf1(&[], 32), sha256(&[0, 0, 0, 0]).to_vec());
        assert_eq!(mgf1(b"seed", 80).len(), 80);
        assert_eq!(&mgf1(b"seed", 80)[..40], &mgf1(b"seed", 40)[..]);
    }

    #[test]
    fn test_block_round_trip() {
        let key_pair = test_key_pair(TestKey::Alice);
        let public = key_pair.public_key();
        let max = max_message_len(public.size_bytes()).unwrap();

        for message in [&b""[..], b"x", b"hello world", &vec![0xffu8; max]] {
            let block = encrypt_block(&public, message).unwrap();
            assert_eq!(block.len(), public.size_bytes());
            assert_eq!(decrypt_block(key_pair, &block).unwrap(), message);
        }
    }

    #[test]
    fn test_encryption_is_randomized() {
        let key_pair = test_key_pair(TestKey::Alice);
        let public = key_pair.public_key();
        let a = encrypt_block(&public, b"same").unwrap();
        let b = encrypt_block(&public, b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_oversized_block_rejected() {
        let public = test_key_pair(TestKey::Alice).public_key();
        let max = max_message_len(public.size_bytes()).unwrap();
        let err = encrypt_block(&public, &vec![1u8; max + 1]).unwrap_err();
        assert!(matches!(err, CryptoError::MessageTooLong { .. }));
    }

    #[test]
    fn test_tampered_block_fails_closed() {
        let key_pair = test_key_pair(TestKey::Alice);
        let mut block = encrypt_block(&key_pair.public_key(), b"attack at dawn").unwrap();
        let last = block.len() - 1;
        block[last] ^= 0x01;
        assert!(matches!(
            decrypt_block(key_pair, &block),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let block = encrypt_block(&test_key_pair(TestKey::Alice).public_key(), b"hi").unwrap();
        assert!(decrypt_block(test_key_pair(TestKey::Bob), &block).is_err());
    }
}
