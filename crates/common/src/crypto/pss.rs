//! RSASSA-PSS (PKCS #1 v2.2, section 8.1) with SHA-256, MGF1-SHA-256 and a 32-byte salt.

use num_bigint::BigUint;

use super::bigint::{fill_random, to_fixed_bytes};
use super::compare::constant_time_eq;
use super::keys::{KeyPair, PublicKey};
use super::oaep::mgf1;
use super::sha256::{sha256, Sha256, DIGEST_SIZE};
use super::CryptoError;

pub const SALT_SIZE: usize = 32;

const TRAILER: u8 = 0xbc;

/// `H(0x00 * 8 || mHash || salt)`
fn salted_hash(message_hash: &[u8], salt: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(&[0u8; 8]);
    hasher.update(message_hash);
    hasher.update(salt);
    hasher.finalize()
}

/// Mask selecting the low `8 * em_len - em_bits` unused bits of the leading byte.
fn top_byte_mask(em_len: usize, em_bits: usize) -> u8 {
    0xffu8 >> (8 * em_len - em_bits)
}

fn encoding_params(modulus_bits: u64) -> Result<(usize, usize), CryptoError> {
    let em_bits = (modulus_bits - 1) as usize;
    let em_len = em_bits.div_ceil(8);
    if em_len < DIGEST_SIZE + SALT_SIZE + 2 {
        return Err(CryptoError::KeyTooSmall(em_len));
    }
    Ok((em_bits, em_len))
}

/// Produce a `k`-byte signature over `message`.
pub fn sign(key_pair: &KeyPair, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let (em_bits, em_len) = encoding_params(key_pair.modulus().bits())?;
    let message_hash = sha256(message);

    let mut salt = [0u8; SALT_SIZE];
    fill_random(&mut salt);
    let h = salted_hash(&message_hash, &salt);

    // DB = PS || 0x01 || salt
    let db_len = em_len - DIGEST_SIZE - 1;
    let mut db = vec![0u8; db_len - SALT_SIZE - 1];
    db.push(0x01);
    db.extend_from_slice(&salt);

    for (byte, mask) in db.iter_mut().zip(mgf1(&h, db_len)) {
        *byte ^= mask;
    }
    db[0] &= top_byte_mask(em_len, em_bits);

    let mut em = db;
    em.extend_from_slice(&h);
    em.push(TRAILER);

    let s = key_pair.apply_private(&BigUint::from_bytes_be(&em));
    to_fixed_bytes(&s, key_pair.size_bytes()).ok_or(CryptoError::OutOfRange)
}

/// Check a signature produced by [`sign`].
///
/// Every mismatch, structural or otherwise, is reported as
/// [`CryptoError::InvalidSignature`].
pub fn verify(key: &PublicKey, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let (em_bits, em_len) = encoding_params(key.modulus().bits())?;
    if signature.len() != key.size_bytes() {
        return Err(CryptoError::InvalidSignature);
    }
    let s = BigUint::from_bytes_be(signature);
    if &s >= key.modulus() {
        return Err(CryptoError::InvalidSignature);
    }
    let em = to_fixed_bytes(&key.apply(&s), em_len).ok_or(CryptoError::InvalidSignature)?;

    if em[em_len - 1] != TRAILER {
        return Err(CryptoError::InvalidSignature);
    }
    let db_len = em_len - DIGEST_SIZE - 1;
    let (masked_db, rest) = em.split_at(db_len);
    let h = &rest[..DIGEST_SIZE];

    let mask = top_byte_mask(em_len, em_bits);
    if masked_db[0] & !mask != 0 {
        return Err(CryptoError::InvalidSignature);
    }

    let mut db: Vec<u8> = masked_db
        .iter()
        .zip(mgf1(h, db_len))
        .map(|(b, m)| b ^ m)
        .collect();
    db[0] &= mask;

    let ps_len = db_len - SALT_SIZE - 1;
    if db[..ps_len].iter().any(|b| *b != 0) || db[ps_len] != 0x01 {
        return Err(CryptoError::InvalidSignature);
    }
    let salt = &db[ps_len + 1..];

    let expected = salted_hash(&sha256(message), salt);
    if constant_time_eq(&expected, h) {
        Ok(())
    } else {
        Err(CryptoError::InvalidSignature)
    }
}
