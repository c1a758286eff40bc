use std::sync::OnceLock;

use crate::crypto::KeyPair;

/// Modulus size for test keys: large enough for OAEP and PSS, small enough to generate
/// quickly.
pub const TEST_KEY_BITS: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKey {
    Alice,
    Bob,
}

static ALICE: OnceLock<KeyPair> = OnceLock::new();
static BOB: OnceLock<KeyPair> = OnceLock::new();

/// A key pair generated once per test binary and shared by every test that asks for it.
pub fn test_key_pair(which: TestKey) -> &'static KeyPair {
    let cell = match which {
        TestKey::Alice => &ALICE,
        TestKey::Bob => &BOB,
    };
    cell.get_or_init(|| {
        KeyPair::generate(TEST_KEY_BITS).expect("test key generation failed")
    })
}
