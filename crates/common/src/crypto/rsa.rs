use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use super::keys::{KeyPair, PublicKey};
use super::oaep;
use super::pss;
use super::sha256::sha256;
use super::CryptoError;

/// How RSA is applied to messages and signatures.
///
/// `Raw` encrypts each byte independently with textbook RSA and signs the bare digest. It is
/// deterministic, malleable and leaks message length, and exists only so a node can talk to
/// peers that speak the old format. `Padded` (OAEP + PSS) is the default.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryptoMode {
    Raw,
    #[default]
    Padded,
}

impl fmt::Display for CryptoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoMode::Raw => f.write_str("raw"),
            CryptoMode::Padded => f.write_str("padded"),
        }
    }
}

impl FromStr for CryptoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(CryptoMode::Raw),
            "padded" => Ok(CryptoMode::Padded),
            other => Err(format!("unknown crypto mode: {}", other)),
        }
    }
}

impl CryptoMode {
    /// Encrypt `plaintext` for the holder of `key`.
    ///
    /// Raw output is the ASCII comma-joined list of per-byte ciphertexts. Padded output is a
    /// sequence of `k`-byte OAEP blocks; an empty plaintext still produces one block.
    pub fn encrypt(self, key: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            CryptoMode::Raw => {
                let values: Vec<String> = plaintext
                    .iter()
                    .map(|byte| key.apply(&BigUint::from(*byte)).to_string())
                    .collect();
                Ok(values.join(",").into_bytes())
            }
            CryptoMode::Padded => {
                let k = key.size_bytes();
                let max = oaep::max_message_len(k).ok_or(CryptoError::KeyTooSmall(k))?;
                if plaintext.is_empty() {
                    return oaep::encrypt_block(key, plaintext);
                }
                let mut out = Vec::with_capacity(plaintext.len().div_ceil(max) * k);
                for chunk in plaintext.chunks(max) {
                    out.extend(oaep::encrypt_block(key, chunk)?);
                }
                Ok(out)
            }
        }
    }

    pub fn decrypt(self, key_pair: &KeyPair, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            CryptoMode::Raw => {
                if ciphertext.is_empty() {
                    return Ok(Vec::new());
                }
                let text = std::str::from_utf8(ciphertext)
                    .map_err(|_| CryptoError::MalformedCiphertext("not ASCII".into()))?;
                let limit = BigUint::from(256u32);
                text.split(',')
                    .map(|value| {
                        let c = parse_decimal(value)
                            .ok_or_else(|| CryptoError::MalformedCiphertext(value.into()))?;
                        if &c >= key_pair.modulus() {
                            return Err(CryptoError::OutOfRange);
                        }
                        let m = key_pair.apply_private(&c);
                        if m >= limit {
                            return Err(CryptoError::Decryption);
                        }
                        Ok(m.to_bytes_be().first().copied().unwrap_or(0))
                    })
                    .collect()
            }
            CryptoMode::Padded => {
                let k = key_pair.size_bytes();
                if ciphertext.is_empty() || ciphertext.len() % k != 0 {
                    return Err(CryptoError::MalformedCiphertext(format!(
                        "length {} is not a multiple of {}",
                        ciphertext.len(),
                        k
                    )));
                }
                let mut out = Vec::new();
                for block in ciphertext.chunks(k) {
                    out.extend(oaep::decrypt_block(key_pair, block)?);
                }
                Ok(out)
            }
        }
    }

    /// Sign `message` with the node's private key.
    ///
    /// Raw signatures are the ASCII decimal of `(H(m) mod n)^d mod n`; padded ones are
    /// `k`-byte PSS signatures.
    pub fn sign(self, key_pair: &KeyPair, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            CryptoMode::Raw => {
                let digest = digest_mod(message, key_pair.modulus());
                Ok(key_pair.apply_private(&digest).to_string().into_bytes())
            }
            CryptoMode::Padded => pss::sign(key_pair, message),
        }
    }

    pub fn verify(
        self,
        key: &PublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        match self {
            CryptoMode::Raw => {
                let s = std::str::from_utf8(signature)
                    .ok()
                    .and_then(parse_decimal)
                    .ok_or(CryptoError::InvalidSignature)?;
                if &s >= key.modulus() {
                    return Err(CryptoError::InvalidSignature);
                }
                if key.apply(&s) == digest_mod(message, key.modulus()) {
                    Ok(())
                } else {
                    Err(CryptoError::InvalidSignature)
                }
            }
            CryptoMode::Padded => pss::verify(key, message, signature),
        }
    }
}

fn digest_mod(message: &[u8], modulus: &BigUint) -> BigUint {
    BigUint::from_bytes_be(&sha256(message)) % modulus
}

fn parse_decimal(s: &str) -> Option<BigUint> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(s.as_bytes(), 10)
}
