//! Log leaves
//!
//! A leaf commits to a submitter's message: `checksum = H(message)`, an
//! Ed25519 signature over the checksum under the tree-leaf namespace, and
//! the hash of the submitter's public key.

use crate::ascii::{self, Parser};
use crate::error::{Error, Result};
use sigsum_crypto::{
    hash_leaf_node, key_hash, ssh, verify, Hash, PublicKey, Signature, Signer, HASH_SIZE,
    SIGNATURE_SIZE,
};

/// Domain-separation namespace bound into every leaf signature.
pub const TREE_LEAF_NAMESPACE: &str = "tree-leaf:v0@sigsum.org";

/// A committed log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    pub checksum: Hash,
    pub signature: Signature,
    pub key_hash: Hash,
}

/// The bytes a submitter actually signs for a given checksum.
pub fn leaf_signed_data(checksum: &Hash) -> Vec<u8> {
    ssh::signed_data(TREE_LEAF_NAMESPACE, checksum)
}

impl Leaf {
    /// Create a leaf for `checksum`, signed with the submitter's key.
    pub fn sign(signer: &dyn Signer, checksum: &Hash) -> Result<Self> {
        let signature = signer.sign(&leaf_signed_data(checksum))?;
        Ok(Self {
            checksum: *checksum,
            signature,
            key_hash: key_hash(&signer.public()),
        })
    }

    /// Check the leaf signature against the submitter's public key.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        verify(public_key, &leaf_signed_data(&self.checksum), &self.signature)
    }

    /// Fixed 96-byte serialization: `checksum || signature || key_hash`.
    pub fn to_binary(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 * HASH_SIZE + SIGNATURE_SIZE);
        buf.extend_from_slice(&self.checksum);
        buf.extend_from_slice(&self.signature);
        buf.extend_from_slice(&self.key_hash);
        buf
    }

    /// The leaf's hash in the Merkle tree, `H(0x00 || to_binary())`.
    pub fn to_hash(&self) -> Hash {
        hash_leaf_node(&self.to_binary())
    }

    pub fn to_ascii(&self, out: &mut String) {
        out.push_str("leaf=");
        out.push_str(&hex::encode(self.checksum));
        out.push(' ');
        out.push_str(&hex::encode(self.signature));
        out.push(' ');
        out.push_str(&hex::encode(self.key_hash));
        out.push('\n');
    }

    pub fn parse(p: &mut Parser) -> Result<Self> {
        let v = p.get_values("leaf", 3)?;
        Ok(Self {
            checksum: sigsum_crypto::hash_from_hex(v[0]).map_err(|e| ascii::invalid("leaf", e))?,
            signature: sigsum_crypto::signature_from_hex(v[1])
                .map_err(|e| ascii::invalid("leaf", e))?,
            key_hash: sigsum_crypto::hash_from_hex(v[2]).map_err(|e| ascii::invalid("leaf", e))?,
        })
    }
}

/// Serialize a get-leaves response body, one `leaf=` line per leaf.
pub fn leaves_to_ascii(leaves: &[Leaf]) -> String {
    let mut out = String::new();
    for leaf in leaves {
        leaf.to_ascii(&mut out);
    }
    out
}

/// Parse a get-leaves response body until end of input.
pub fn leaves_from_ascii(input: &str) -> Result<Vec<Leaf>> {
    let mut p = Parser::new(input);
    let mut leaves = Vec::new();
    while p.peek_key() == Some("leaf") {
        leaves.push(Leaf::parse(&mut p)?);
    }
    p.get_eof()?;
    if leaves.is_empty() {
        return Err(Error::UnexpectedEof("leaf"));
    }
    Ok(leaves)
}
