use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

use super::bigint::{byte_length, mod_inverse};
use super::prime::{generate_prime, PrimeError};

/// Fixed public exponent (F4)
pub const PUBLIC_EXPONENT: u32 = 65537;
/// Smallest modulus we will generate or accept from a peer
pub const MIN_KEY_BITS: u64 = 128;
/// Modulus size used when nothing else is configured
pub const DEFAULT_KEY_BITS: u64 = 2048;

const PUBLIC_PEM_TAG: &str = "RSA PUBLIC KEY";
const PRIVATE_PEM_TAG: &str = "RSA PRIVATE KEY";

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key size must be at least 128 bits, got {0}")]
    TooSmall(u64),
    #[error("prime generation failed: {0}")]
    Prime(#[from] PrimeError),
    #[error("malformed key: {0}")]
    Malformed(String),
}

impl KeyError {
    fn malformed(msg: impl Into<String>) -> Self {
        KeyError::Malformed(msg.into())
    }
}

/// Public half of an RSA key: `(e, n)`.
///
/// This is what a node learns about its peer during the handshake. On the wire it is
/// either `"<e>:<n>"` in decimal or a PEM block tagged `RSA PUBLIC KEY`; [`FromStr`]
/// accepts both.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    exponent: BigUint,
    modulus: BigUint,
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("exponent", &self.exponent)
            .field("bits", &self.modulus.bits())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl PublicKey {
    /// Build a public key, rejecting values that cannot be a usable RSA key.
    pub fn new(exponent: BigUint, modulus: BigUint) -> Result<Self, KeyError> {
        if modulus.bits() < MIN_KEY_BITS {
            return Err(KeyError::malformed(format!(
                "modulus has {} bits, need at least {}",
                modulus.bits(),
                MIN_KEY_BITS
            )));
        }
        if modulus.is_even() {
            return Err(KeyError::malformed("modulus is even"));
        }
        if exponent < BigUint::from(3u32) || exponent >= modulus {
            return Err(KeyError::malformed("public exponent out of range"));
        }
        Ok(Self { exponent, modulus })
    }

    pub fn exponent(&self) -> &BigUint {
        &self.exponent
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Length of the modulus in bytes (`k` in PKCS #1)
    pub fn size_bytes(&self) -> usize {
        byte_length(&self.modulus)
    }

    /// `m^e mod n`
    pub(crate) fn apply(&self, m: &BigUint) -> BigUint {
        m.modpow(&self.exponent, &self.modulus)
    }

    /// Short hex identifier derived from the SHA-256 of the wire encoding.
    pub fn fingerprint(&self) -> String {
        let digest = super::sha256::sha256(self.to_wire().as_bytes());
        hex::encode(&digest[..8])
    }

    /// `"<e>:<n>"` in decimal.
    pub fn to_wire(&self) -> String {
        format!("{}:{}", self.exponent, self.modulus)
    }

    pub fn to_pem(&self) -> String {
        let contents = encode_fields(&[&self.exponent, &self.modulus]);
        pem::encode(&pem::Pem::new(PUBLIC_PEM_TAG, contents))
    }

    fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str)
            .map_err(|e| KeyError::malformed(format!("failed to parse PEM: {}", e)))?;
        if pem.tag() != PUBLIC_PEM_TAG {
            return Err(KeyError::malformed(format!(
                "invalid PEM tag, expected {}",
                PUBLIC_PEM_TAG
            )));
        }
        let mut fields = decode_fields(pem.contents(), 2)?.into_iter();
        match (fields.next(), fields.next()) {
            (Some(exponent), Some(modulus)) => Self::new(exponent, modulus),
            _ => Err(KeyError::malformed("missing key fields")),
        }
    }

    fn from_wire(wire: &str) -> Result<Self, KeyError> {
        let (exponent, modulus) = wire
            .split_once(':')
            .ok_or_else(|| KeyError::malformed("expected \"exponent:modulus\""))?;
        let exponent = parse_decimal(exponent, "exponent")?;
        let modulus = parse_decimal(modulus, "modulus")?;
        Self::new(exponent, modulus)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("-----BEGIN") {
            Self::from_pem(s)
        } else {
            Self::from_wire(s)
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// An RSA key pair owned by the local node.
///
/// Generated once at startup (or by `parley init`) and never sent anywhere; only the
/// [`PublicKey`] half leaves the process.
///
/// ```ignore
/// let key_pair = KeyPair::generate(2048)?;
/// let public = key_pair.public_key();
/// std::fs::write("key.pem", key_pair.to_pem())?;
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    public_exponent: BigUint,
    private_exponent: BigUint,
    modulus: BigUint,
    bit_length: u64,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_exponent", &self.public_exponent)
            .field("bit_length", &self.bit_length)
            .field("private_exponent", &"<redacted>")
            .finish()
    }
}

/// Bounds `[2^(b-1) + 2^(b-2), 2^b - 1]` for a `b`-bit prime. The top two bits are set so
/// the product of two such primes has exactly the sum of their bit lengths.
fn prime_bounds(bits: u64) -> (BigUint, BigUint) {
    let top = BigUint::one() << (bits - 1);
    let low = &top + (BigUint::one() << (bits - 2));
    let high = (BigUint::one() << bits) - 1u32;
    (low, high)
}

/// Whether `e` is invertible modulo `p - 1`. A prime failing this can never be part of a
/// key with public exponent `e`.
fn fits_exponent(p: &BigUint, e: &BigUint) -> bool {
    (p - 1u32).gcd(e).is_one()
}

/// Draw primes from `[low, high]` until one fits the public exponent.
fn generate_key_prime(
    low: &BigUint,
    high: &BigUint,
    e: &BigUint,
) -> Result<BigUint, KeyError> {
    loop {
        let p = generate_prime(low, high)?;
        if fits_exponent(&p, e) {
            return Ok(p);
        }
        tracing::debug!("prime does not fit the public exponent, redrawing");
    }
}

impl KeyPair {
    /// Generate a fresh key pair whose modulus has exactly `bits` bits.
    ///
    /// This is CPU-bound (seconds for 2048 bits); async callers should run it on a blocking
    /// thread.
    pub fn generate(bits: u64) -> Result<Self, KeyError> {
        if bits < MIN_KEY_BITS {
            return Err(KeyError::TooSmall(bits));
        }
        let start = Instant::now();

        let p_bits = bits - bits / 2;
        let q_bits = bits / 2;
        let (p_low, p_high) = prime_bounds(p_bits);
        let (q_low, q_high) = prime_bounds(q_bits);
        let e = BigUint::from(PUBLIC_EXPONENT);

        loop {
            let p = generate_key_prime(&p_low, &p_high, &e)?;
            let q = generate_key_prime(&q_low, &q_high, &e)?;
            if q == p {
                continue;
            }

            let phi = (&p - 1u32) * (&q - 1u32);
            let Some(d) = mod_inverse(&e, &phi) else {
                tracing::debug!("public exponent not invertible mod phi, redrawing");
                continue;
            };

            let modulus = &p * &q;
            let key_pair = Self {
                public_exponent: e,
                private_exponent: d,
                bit_length: modulus.bits(),
                modulus,
            };
            tracing::info!(
                bits = key_pair.bit_length,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "generated RSA key pair"
            );
            return Ok(key_pair);
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            exponent: self.public_exponent.clone(),
            modulus: self.modulus.clone(),
        }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn bit_length(&self) -> u64 {
        self.bit_length
    }

    pub fn size_bytes(&self) -> usize {
        byte_length(&self.modulus)
    }

    /// `c^d mod n`
    pub(crate) fn apply_private(&self, c: &BigUint) -> BigUint {
        c.modpow(&self.private_exponent, &self.modulus)
    }

    /// Encode for local storage in PEM format with tag "RSA PRIVATE KEY".
    pub fn to_pem(&self) -> String {
        let contents = encode_fields(&[
            &self.public_exponent,
            &self.private_exponent,
            &self.modulus,
        ]);
        pem::encode(&pem::Pem::new(PRIVATE_PEM_TAG, contents))
    }

    /// Parse a key pair written by [`KeyPair::to_pem`].
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM is malformed, carries the wrong tag, or the exponents do
    /// not invert each other.
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str)
            .map_err(|e| KeyError::malformed(format!("failed to parse PEM: {}", e)))?;
        if pem.tag() != PRIVATE_PEM_TAG {
            return Err(KeyError::malformed(format!(
                "invalid PEM tag, expected {}",
                PRIVATE_PEM_TAG
            )));
        }

        let mut fields = decode_fields(pem.contents(), 3)?.into_iter();
        let (Some(public_exponent), Some(private_exponent), Some(modulus)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(KeyError::malformed("missing key fields"));
        };

        // validates the public half
        PublicKey::new(public_exponent.clone(), modulus.clone())?;
        if private_exponent.is_zero() || private_exponent >= modulus {
            return Err(KeyError::malformed("private exponent out of range"));
        }

        let key_pair = Self {
            public_exponent,
            private_exponent,
            bit_length: modulus.bits(),
            modulus,
        };

        // a cheap consistency check: (2^e)^d must come back to 2
        let sample = BigUint::from(2u32);
        if key_pair.apply_private(&key_pair.public_key().apply(&sample)) != sample {
            return Err(KeyError::malformed("exponents do not match"));
        }
        Ok(key_pair)
    }
}

fn parse_decimal(s: &str, what: &str) -> Result<BigUint, KeyError> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyError::malformed(format!("{} is not a decimal integer", what)));
    }
    BigUint::from_str(s).map_err(|e| KeyError::malformed(format!("{}: {}", what, e)))
}

/// `u32-be length || big-endian bytes` for each field.
fn encode_fields(fields: &[&BigUint]) -> Vec<u8> {
    let mut out = Vec::new();
    for field in fields {
        let bytes = field.to_bytes_be();
        out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        out.extend_from_slice(&bytes);
    }
    out
}

fn decode_fields(mut data: &[u8], count: usize) -> Result<Vec<BigUint>, KeyError> {
    let mut fields = Vec::with_capacity(count);
    for _ in 0..count {
        if data.len() < 4 {
            return Err(KeyError::malformed("truncated length prefix"));
        }
        let (len, rest) = data.split_at(4);
        let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize;
        if rest.len() < len {
            return Err(KeyError::malformed("truncated key field"));
        }
        let (field, rest) = rest.split_at(len);
        fields.push(BigUint::from_bytes_be(field));
        data = rest;
    }
    if !data.is_empty() {
        return Err(KeyError::malformed("trailing bytes after key fields"));
    }
    Ok(fields)
}
