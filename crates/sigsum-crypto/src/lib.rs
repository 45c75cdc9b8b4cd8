//! Cryptographic primitives for the Sigsum log ecosystem
//!
//! Everything on the Sigsum wire is built from three fixed-size values:
//! 32-byte SHA-256 hashes, 32-byte Ed25519 public keys, and 64-byte Ed25519
//! signatures. This crate provides those values, the Merkle node hashing
//! with RFC 9162 domain separation, and the [`Signer`] capability used by
//! everything that produces signatures.

pub mod ssh;

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Size in bytes of a hash value.
pub const HASH_SIZE: usize = 32;
/// Size in bytes of an Ed25519 public key.
pub const PUBLIC_KEY_SIZE: usize = 32;
/// Size in bytes of an Ed25519 signature.
pub const SIGNATURE_SIZE: usize = 64;

/// An opaque 32-byte SHA-256 output.
pub type Hash = [u8; HASH_SIZE];
/// A raw Ed25519 public key (RFC 8032).
pub type PublicKey = [u8; PUBLIC_KEY_SIZE];
/// A raw Ed25519 signature (RFC 8032).
pub type Signature = [u8; SIGNATURE_SIZE];

/// Errors from key parsing and signing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("unexpected length: got {got} bytes, expected {want}")]
    Length { want: usize, got: usize },
    #[error("invalid Ed25519 key")]
    InvalidKey,
    #[error("signing failed: {0}")]
    Signer(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Hash arbitrary bytes with SHA-256.
pub fn hash_bytes(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash of the empty tree, `H("")`.
pub fn hash_empty_tree() -> Hash {
    hash_bytes(&[])
}

/// Hash a leaf node, `H(0x00 || data)`.
pub fn hash_leaf_node(data: &[u8]) -> Hash {
    let mut h = Sha256::new();
    h.update([0x00]);
    h.update(data);
    h.finalize().into()
}

/// Hash an interior node, `H(0x01 || left || right)`.
pub fn hash_interior_node(left: &Hash, right: &Hash) -> Hash {
    let mut h = Sha256::new();
    h.update([0x01]);
    h.update(left);
    h.update(right);
    h.finalize().into()
}

/// The key hash identifying a public key on the wire, `H(pub)`.
pub fn key_hash(public_key: &PublicKey) -> Hash {
    hash_bytes(public_key)
}

/// Verify an Ed25519 signature. Malformed public keys verify as false.
pub fn verify(public_key: &PublicKey, msg: &[u8], signature: &Signature) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(signature);
    key.verify_strict(msg, &signature).is_ok()
}

/// A signing capability: given message bytes, return a signature.
///
/// Implementations may be backed by an in-process key ([`KeyPair`]) or an
/// external agent; the caller owns any such state. The core never reads
/// private key material directly.
pub trait Signer {
    fn public(&self) -> PublicKey;
    fn sign(&self, msg: &[u8]) -> Result<Signature>;
}

/// An in-process Ed25519 key pair.
#[derive(Clone)]
pub struct KeyPair {
    key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the system RNG.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Parse a raw hex-encoded private key (RFC 8032 seed).
    pub fn from_hex(s: &str) -> Result<Self> {
        let seed: [u8; 32] = from_hex(s.trim())?;
        Ok(Self {
            key: SigningKey::from_bytes(&seed),
        })
    }

    /// Construct from a raw 32-byte private key seed.
    pub fn from_bytes(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }

    /// Hex encoding of the private key seed.
    pub fn to_hex(&self) -> String {
        hex::encode(self.key.to_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print private key material.
        f.debug_struct("KeyPair")
            .field("public", &hex::encode(self.public()))
            .finish()
    }
}

impl Signer for KeyPair {
    fn public(&self) -> PublicKey {
        self.key.verifying_key().to_bytes()
    }

    fn sign(&self, msg: &[u8]) -> Result<Signature> {
        Ok(self.key.sign(msg).to_bytes())
    }
}

fn from_hex<const N: usize>(s: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(s)?;
    bytes.try_into().map_err(|b: Vec<u8>| Error::Length {
        want: N,
        got: b.len(),
    })
}

/// Parse a 32-byte hash from lowercase hex.
pub fn hash_from_hex(s: &str) -> Result<Hash> {
    from_hex(s)
}

/// Parse a 32-byte public key from lowercase hex.
pub fn public_key_from_hex(s: &str) -> Result<PublicKey> {
    from_hex(s)
}

/// Parse a 64-byte signature from lowercase hex.
pub fn signature_from_hex(s: &str) -> Result<Signature> {
    from_hex(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_hash_is_sha256_of_nothing() {
        assert_eq!(
            hex::encode(hash_empty_tree()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn node_hashing_is_domain_separated() {
        let left = hash_bytes(b"left");
        let right = hash_bytes(b"right");
        let mut concat = vec![0x01];
        concat.extend_from_slice(&left);
        concat.extend_from_slice(&right);
        assert_eq!(hash_interior_node(&left, &right), hash_bytes(&concat));
        assert_ne!(hash_leaf_node(b"x"), hash_bytes(b"x"));
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let pair = KeyPair::from_bytes(&[7u8; 32]);
        let msg = b"tree head";
        let sig = pair.sign(msg).unwrap();
        assert!(verify(&pair.public(), msg, &sig));
        assert!(!verify(&pair.public(), b"other message", &sig));
    }

    #[test]
    fn tampered_signature_fails() {
        let pair = KeyPair::from_bytes(&[9u8; 32]);
        let msg = b"payload";
        let mut sig = pair.sign(msg).unwrap();
        sig[0] ^= 0x01;
        assert!(!verify(&pair.public(), msg, &sig));
    }

    #[test]
    fn generated_keys_are_distinct() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public(), b.public());
        assert!(verify(&a.public(), b"msg", &a.sign(b"msg").unwrap()));
    }

    #[test]
    fn keypair_hex_roundtrip() {
        let pair = KeyPair::from_bytes(&[3u8; 32]);
        let parsed = KeyPair::from_hex(&pair.to_hex()).unwrap();
        assert_eq!(pair.public(), parsed.public());
    }

    #[test]
    fn hex_parsing_checks_length() {
        assert!(hash_from_hex(&"00".repeat(32)).is_ok());
        assert!(matches!(
            hash_from_hex(&"00".repeat(31)),
            Err(Error::Length { want: 32, got: 31 })
        ));
        assert!(hash_from_hex("not hex").is_err());
        assert!(signature_from_hex(&"ff".repeat(64)).is_ok());
    }
}
