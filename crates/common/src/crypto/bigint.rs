//! Arbitrary-precision helpers on top of `num-bigint`.
//!
//! `BigUint::modpow` covers modular exponentiation; everything else the RSA layer needs
//! (random sampling, modular inverse, fixed-width encoding) lives here.

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};

/// Fill a buffer from the operating system RNG.
pub(crate) fn fill_random(buf: &mut [u8]) {
    getrandom::getrandom(buf).expect("failed to generate random bytes");
}

/// Uniformly random integer in `[0, 2^bits)`.
pub fn random_bits(bits: u64) -> BigUint {
    if bits == 0 {
        return BigUint::zero();
    }
    let len = bits.div_ceil(8) as usize;
    let mut buf = vec![0u8; len];
    fill_random(&mut buf);

    let excess = (len as u64 * 8 - bits) as u32;
    buf[0] &= 0xff >> excess;
    BigUint::from_bytes_be(&buf)
}

/// Uniformly random integer in `[0, bound)` by rejection sampling.
///
/// # Panics
///
/// Panics if `bound` is zero.
pub fn random_below(bound: &BigUint) -> BigUint {
    assert!(!bound.is_zero(), "random_below called with a zero bound");
    let bits = bound.bits();
    loop {
        let candidate = random_bits(bits);
        if candidate < *bound {
            return candidate;
        }
    }
}

/// Uniformly random integer in the inclusive range `[low, high]`.
///
/// Callers must ensure `low <= high`.
pub fn random_in_range(low: &BigUint, high: &BigUint) -> BigUint {
    debug_assert!(low <= high);
    let span = high - low + 1u32;
    low + random_below(&span)
}

/// Modular inverse of `a` modulo `m` via the extended Euclidean algorithm.
///
/// Returns `None` when `gcd(a, m) != 1` (or `m` is zero). Terminates after at most
/// O(log m) division steps since the remainders strictly decrease.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() {
        return None;
    }
    if m.is_one() {
        return Some(BigUint::zero());
    }

    let modulus = BigInt::from_biguint(Sign::Plus, m.clone());
    let (mut old_r, mut r) = (BigInt::from_biguint(Sign::Plus, a % m), modulus.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    // invariant: old_s * a ≡ old_r (mod m)
    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return None;
    }
    old_s.mod_floor(&modulus).to_biguint()
}

/// Big-endian encoding of `n` left-padded with zeros to exactly `len` bytes
/// (I2OSP in PKCS #1 terms). `None` if `n` does not fit.
pub fn to_fixed_bytes(n: &BigUint, len: usize) -> Option<Vec<u8>> {
    if n.is_zero() {
        return Some(vec![0u8; len]);
    }
    let bytes = n.to_bytes_be();
    if bytes.len() > len {
        return None;
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(&bytes);
    Some(out)
}

/// Number of bytes needed to hold values below `modulus`.
pub fn byte_length(modulus: &BigUint) -> usize {
    modulus.bits().div_ceil(8) as usize
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mod_inverse_small() {
        let inv = mod_inverse(&BigUint::from(3u32), &BigUint::from(11u32)).unwrap();
        assert_eq!(inv, BigUint::from(4u32));

        let inv = mod_inverse(&BigUint::from(17u32), &BigUint::from(3120u32)).unwrap();
        assert_eq!(inv, BigUint::from(2753u32));
    }

    #[test]
    fn test_mod_inverse_none_when_not_coprime() {
        assert!(mod_inverse(&BigUint::from(6u32), &BigUint::from(9u32)).is_none());
        assert!(mod_inverse(&BigUint::from(0u32), &BigUint::from(7u32)).is_none());
        assert!(mod_inverse(&BigUint::from(5u32), &BigUint::from(0u32)).is_none());
    }

    #[test]
    fn test_mod_inverse_reduces_large_input() {
        let m = BigUint::from(1_000_003u64);
        let a = BigUint::from(123_456_789_123u64);
        let inv = mod_inverse(&a, &m).unwrap();
        assert!(inv < m);
        assert!(((a * inv) % m).is_one());
    }

    #[test]
    fn test_random_in_range_stays_in_bounds() {
        let low = BigUint::from(1000u32);
        let high = BigUint::from(1010u32);
        for _ in 0..500 {
            let n = random_in_range(&low, &high);
            assert!(n >= low && n <= high);
        }
    }

    #[test]
    fn test_random_bits_width() {
        for bits in [1u64, 7, 8, 9, 64, 129] {
            for _ in 0..50 {
                assert!(random_bits(bits).bits() <= bits);
            }
        }
    }

    #[test]
    fn test_to_fixed_bytes() {
        let n = BigUint::from(0x0102u32);
        assert_eq!(to_fixed_bytes(&n, 4).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(to_fixed_bytes(&n, 2).unwrap(), vec![1, 2]);
        assert!(to_fixed_bytes(&n, 1).is_none());
        assert_eq!(to_fixed_bytes(&BigUint::zero(), 3).unwrap(), vec![0, 0, 0]);
    }
}
