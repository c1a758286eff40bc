//! HMAC-SHA-256 (RFC 2104) over the in-crate hash engine.

use super::compare::constant_time_eq;
use super::sha256::{sha256, Sha256, BLOCK_SIZE, DIGEST_SIZE};

/// Size of an authentication tag in bytes
pub const TAG_SIZE: usize = DIGEST_SIZE;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Compute `H((K' ^ opad) || H((K' ^ ipad) || message))`.
///
/// `K'` is the key zero-padded to the block size, or its digest when the key is longer
/// than a block.
pub fn create_tag(message: &[u8], key: &[u8]) -> [u8; TAG_SIZE] {
    let mut block_key = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        block_key[..DIGEST_SIZE].copy_from_slice(&sha256(key));
    } else {
        block_key[..key.len()].copy_from_slice(key);
    }

    let mut inner_pad = [0u8; BLOCK_SIZE];
    let mut outer_pad = [0u8; BLOCK_SIZE];
    for (i, byte) in block_key.iter().enumerate() {
        inner_pad[i] = byte ^ IPAD;
        outer_pad[i] = byte ^ OPAD;
    }

    let mut inner = Sha256::new();
    inner.update(&inner_pad);
    inner.update(message);
    let inner_digest = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(&outer_pad);
    outer.update(&inner_digest);
    outer.finalize()
}

/// Recompute the tag and compare it in constant time.
pub fn verify_tag(message: &[u8], tag: &[u8], key: &[u8]) -> bool {
    constant_time_eq(&create_tag(message, key), tag)
}
