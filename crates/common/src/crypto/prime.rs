//! Probabilistic primality testing and random prime generation.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

use super::bigint::random_in_range;

/// Miller–Rabin witness bases. Deterministic for every n below 3.3 * 10^24 and a negligible
/// error rate above that.
const WITNESSES: [u32; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Small primes used to discard most candidates before running Miller–Rabin.
const SIEVE_PRIMES: [u32; 53] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

/// Upper bound on fresh random draws before giving up on a range.
const MAX_DRAWS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrimeError {
    #[error("range [{low}, {high}] contains no odd candidates")]
    EmptyRange { low: BigUint, high: BigUint },
    #[error("no prime found in [{low}, {high}]")]
    Exhausted { low: BigUint, high: BigUint },
}

/// Miller–Rabin test over the fixed witness set, restricted to bases below `n`.
pub fn is_probable_prime(n: &BigUint) -> bool {
    if *n <= BigUint::one() {
        return false;
    }
    if *n <= BigUint::from(3u32) {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // n - 1 = 2^r * d with d odd
    let n_minus_one = n - 1u32;
    let r = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> r;

    'witness: for base in WITNESSES {
        let a = BigUint::from(base);
        if a >= *n {
            continue;
        }

        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..r {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// True unless a small prime other than `n` itself divides `n`.
fn survives_sieve(n: &BigUint) -> bool {
    SIEVE_PRIMES.iter().all(|&p| {
        let p_big = BigUint::from(p);
        *n == p_big || !(n % p).is_zero()
    })
}

/// Random odd probable prime in the inclusive range `[low, high]`.
///
/// Draws a uniform candidate, forces it odd, then scans upward in steps of two. When the
/// scan runs past `high` a fresh candidate is drawn.
pub fn generate_prime(low: &BigUint, high: &BigUint) -> Result<BigUint, PrimeError> {
    let first_odd = if low.is_even() { low + 1u32 } else { low.clone() };
    if low > high || first_odd > *high {
        return Err(PrimeError::EmptyRange {
            low: low.clone(),
            high: high.clone(),
        });
    }

    for _ in 0..MAX_DRAWS {
        let mut candidate = random_in_range(low, high);
        if candidate.is_even() {
            candidate += 1u32;
        }

        while candidate <= *high {
            if survives_sieve(&candidate) && is_probable_prime(&candidate) {
                return Ok(candidate);
            }
            candidate += 2u32;
        }
    }

    Err(PrimeError::Exhausted {
        low: low.clone(),
        high: high.clone(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn is_prime_by_trial_division(n: u32) -> bool {
        if n < 2 {
            return false;
        }
        let mut i = 2;
        while i * i <= n {
            if n % i == 0 {
                return false;
            }
            i += 1;
        }
        true
    }

    #[test]
    fn test_matches_ground_truth_below_10000() {
        for n in 0u32..10_000 {
            assert_eq!(
                is_probable_prime(&BigUint::from(n)),
                is_prime_by_trial_division(n),
                "disagreement at {}",
                n
            );
        }
    }

    #[test]
    fn test_rejects_carmichael_numbers() {
        for n in [561u64, 1105, 1729, 2465, 2821, 6601, 8911, 41041, 825265, 321197185] {
            assert!(!is_probable_prime(&BigUint::from(n)), "{} is composite", n);
        }
    }

    #[test]
    fn test_accepts_large_known_primes() {
        // 2^127 - 1 and 2^89 - 1 are Mersenne primes
        let m127 = (BigUint::one() << 127u32) - 1u32;
        let m89 = (BigUint::one() << 89u32) - 1u32;
        assert!(is_probable_prime(&m127));
        assert!(is_probable_prime(&m89));
        assert!(!is_probable_prime(&(&m127 * &m89)));
    }

    #[test]
    fn test_generate_prime_in_bounds_and_odd() {
        let low = BigUint::from(10u32).pow(20);
        let high = BigUint::from(10u32).pow(21);
        for _ in 0..5 {
            let p = generate_prime(&low, &high).unwrap();
            assert!(p >= low && p <= high);
            assert!(p.is_odd());
            assert!(is_probable_prime(&p));
        }
    }

    #[test]
    fn test_generate_prime_narrow_range() {
        let low = BigUint::from(90u32);
        let high = BigUint::from(100u32);
        for _ in 0..20 {
            assert_eq!(generate_prime(&low, &high).unwrap(), BigUint::from(97u32));
        }
    }

    #[test]
    fn test_generate_prime_empty_range() {
        let err = generate_prime(&BigUint::from(10u32), &BigUint::from(10u32)).unwrap_err();
        assert!(matches!(err, PrimeError::EmptyRange { .. }));
        let err = generate_prime(&BigUint::from(20u32), &BigUint::from(10u32)).unwrap_err();
        assert!(matches!(err, PrimeError::EmptyRange { .. }));
    }
}
