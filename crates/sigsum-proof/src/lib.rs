//! Sigsum proof bundles
//!
//! A proof bundle is a self-contained artifact proving that a message is
//! logged: a short leaf, a cosigned tree head, and an inclusion proof
//! linking the two. Given the message, the submitter's public key, and a
//! trust policy, verification needs no further network access.

use sigsum_crypto::{hash_bytes, key_hash, Hash, PublicKey, Signature};
use sigsum_policy::{Policy, PolicyError};
use sigsum_types::ascii::{self, Parser};
use sigsum_types::{CosignedTreeHead, InclusionProof, Leaf};

pub const SIGSUM_PROOF_VERSION: u64 = 0;
pub const SHORT_CHECKSUM_SIZE: usize = 2;

/// The truncated checksum carried in a proof bundle.
pub type ShortChecksum = [u8; SHORT_CHECKSUM_SIZE];

/// Why a proof bundle failed to parse or verify.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("invalid proof: {0}")]
    InvalidProof(&'static str),
    #[error("checksum doesn't match truncated checksum")]
    ChecksumMismatch,
    #[error("unexpected submit key hash")]
    WrongSubmitKey,
    #[error("leaf signature not valid")]
    BadLeafSignature,
    #[error(transparent)]
    Wire(#[from] sigsum_types::Error),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Merkle(#[from] sigsum_merkle::ProofError),
}

/// Variant of [`Leaf`] with the checksum truncated to its first two
/// bytes; the full checksum is recomputed from the message at verify
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortLeaf {
    pub short_checksum: ShortChecksum,
    pub signature: Signature,
    pub key_hash: Hash,
}

impl ShortLeaf {
    pub fn new(leaf: &Leaf) -> Self {
        Self {
            short_checksum: [leaf.checksum[0], leaf.checksum[1]],
            signature: leaf.signature,
            key_hash: leaf.key_hash,
        }
    }

    /// Reconstruct the full leaf for a candidate checksum. The truncation
    /// must match, or the bundle is for some other message.
    pub fn to_leaf(&self, checksum: &Hash) -> Result<Leaf, ProofError> {
        if self.short_checksum != checksum[..SHORT_CHECKSUM_SIZE] {
            return Err(ProofError::ChecksumMismatch);
        }
        Ok(Leaf {
            checksum: *checksum,
            signature: self.signature,
            key_hash: self.key_hash,
        })
    }

    // Same layout as a leaf line from get-leaves, except that the
    // checksum is truncated and the key hash comes before the signature.
    pub fn to_ascii(&self, out: &mut String) {
        out.push_str("leaf=");
        out.push_str(&hex::encode(self.short_checksum));
        out.push(' ');
        out.push_str(&hex::encode(self.key_hash));
        out.push(' ');
        out.push_str(&hex::encode(self.signature));
        out.push('\n');
    }

    pub fn parse(p: &mut Parser) -> Result<Self, ProofError> {
        let v = p.get_values("leaf", 3)?;
        let short_checksum = hex::decode(v[0])
            .ok()
            .and_then(|b| ShortChecksum::try_from(b.as_slice()).ok())
            .ok_or(ProofError::InvalidProof("invalid submitter checksum"))?;
        Ok(Self {
            short_checksum,
            key_hash: sigsum_crypto::hash_from_hex(v[1])
                .map_err(|_| ProofError::InvalidProof("invalid submitter key hash"))?,
            signature: sigsum_crypto::signature_from_hex(v[2])
                .map_err(|_| ProofError::InvalidProof("invalid leaf signature"))?,
        })
    }
}

/// A complete Sigsum proof bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigsumProof {
    pub log_key_hash: Hash,
    pub leaf: ShortLeaf,
    pub tree_head: CosignedTreeHead,
    pub inclusion: InclusionProof,
}

impl SigsumProof {
    /// Assemble a bundle. For a single-leaf tree, pass `None` for the
    /// inclusion proof; it is implied.
    pub fn new(
        log_key_hash: Hash,
        leaf: &Leaf,
        tree_head: CosignedTreeHead,
        inclusion: Option<InclusionProof>,
    ) -> Self {
        let inclusion = inclusion.unwrap_or(InclusionProof {
            leaf_index: 0,
            tree_size: 1,
            path: Vec::new(),
        });
        Self {
            log_key_hash,
            leaf: ShortLeaf::new(leaf),
            tree_head,
            inclusion,
        }
    }

    /// Parse the three blank-line-separated blocks of a proof document.
    /// The inclusion block must be absent exactly when the tree has a
    /// single leaf.
    pub fn from_ascii(input: &str) -> Result<Self, ProofError> {
        let parts: Vec<&str> = input.split("\n\n").collect();
        if parts.len() < 2 {
            return Err(ProofError::InvalidProof("too few parts"));
        }

        let mut p = Parser::new(parts[0]);
        let version = p.get_int("version")?;
        if version != SIGSUM_PROOF_VERSION {
            return Err(ProofError::InvalidProof("unexpected version"));
        }
        let log_key_hash = p.get_hash("log")?;
        let leaf = ShortLeaf::parse(&mut p)?;
        p.get_eof()?;

        let tree_head = CosignedTreeHead::from_ascii(parts[1])?;
        let size = tree_head.tree_head().size;
        if size == 0 {
            return Err(ProofError::InvalidProof("empty tree"));
        }
        if size == 1 {
            if parts.len() != 2 {
                return Err(ProofError::InvalidProof("too many parts"));
            }
            return Ok(Self {
                log_key_hash,
                leaf,
                tree_head,
                inclusion: InclusionProof {
                    leaf_index: 0,
                    tree_size: 1,
                    path: Vec::new(),
                },
            });
        }
        if parts.len() != 3 {
            return Err(ProofError::InvalidProof("too few parts"));
        }
        let inclusion = InclusionProof::from_ascii(parts[2])?;
        Ok(Self {
            log_key_hash,
            leaf,
            tree_head,
            inclusion,
        })
    }

    pub fn to_ascii(&self) -> String {
        let mut out = String::new();
        ascii::write_int(&mut out, "version", SIGSUM_PROOF_VERSION);
        ascii::write_hex(&mut out, "log", &self.log_key_hash);
        self.leaf.to_ascii(&mut out);
        // Empty line as block separator.
        out.push('\n');
        self.tree_head.to_ascii(&mut out);
        if self.tree_head.tree_head().size <= 1 {
            return out;
        }
        out.push('\n');
        self.inclusion.to_ascii(&mut out);
        out
    }

    /// Verify the whole chain: message checksum, submitter key and leaf
    /// signature, the policy over the cosigned tree head, and finally the
    /// Merkle inclusion of the leaf. The first failure is returned.
    pub fn verify(
        &self,
        msg: &Hash,
        submit_key: &PublicKey,
        policy: &Policy,
    ) -> Result<(), ProofError> {
        let checksum = hash_bytes(msg);
        let leaf = self.leaf.to_leaf(&checksum)?;
        if self.leaf.key_hash != key_hash(submit_key) {
            return Err(ProofError::WrongSubmitKey);
        }
        if !leaf.verify(submit_key) {
            return Err(ProofError::BadLeafSignature);
        }
        policy.verify_cosigned_tree_head(&self.log_key_hash, &self.tree_head)?;
        self.inclusion
            .verify(&leaf.to_hash(), self.tree_head.tree_head())?;
        Ok(())
    }

    /// Verify against a bare log key, with no witness quorum.
    pub fn verify_no_cosignatures(
        &self,
        msg: &Hash,
        submit_key: &PublicKey,
        log_key: &PublicKey,
    ) -> Result<(), ProofError> {
        let policy = Policy::k_of_n(&[*log_key], &[], 0)?;
        self.verify(msg, submit_key, &policy)
    }
}
