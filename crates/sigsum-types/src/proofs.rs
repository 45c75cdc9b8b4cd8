//! Inclusion and consistency proofs as wire artifacts
//!
//! The Merkle arithmetic lives in `sigsum-merkle`; these types carry the
//! proofs on the wire and bind them to a tree head at verification time.

use crate::ascii::{self, Parser};
use crate::tree_head::TreeHead;
use sigsum_crypto::Hash;
use sigsum_merkle::{verify_consistency, verify_inclusion, ProofError};

/// Merkle audit path proving that a leaf is in a tree of a given size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    pub leaf_index: u64,
    pub tree_size: u64,
    pub path: Vec<Hash>,
}

impl InclusionProof {
    /// Verify the proof against a tree head. The proof's `tree_size` must
    /// agree with the head's `size`.
    pub fn verify(&self, leaf_hash: &Hash, tree_head: &TreeHead) -> Result<(), ProofError> {
        if self.tree_size != tree_head.size {
            return Err(ProofError::MalformedProof);
        }
        verify_inclusion(
            leaf_hash,
            self.leaf_index,
            tree_head.size,
            &tree_head.root_hash,
            &self.path,
        )
    }

    pub fn to_ascii(&self, out: &mut String) {
        ascii::write_int(out, "leaf_index", self.leaf_index);
        ascii::write_int(out, "tree_size", self.tree_size);
        for hash in &self.path {
            ascii::write_hex(out, "node_hash", hash);
        }
    }

    pub fn parse(p: &mut Parser) -> Result<Self, crate::Error> {
        let leaf_index = p.get_int("leaf_index")?;
        let tree_size = p.get_int("tree_size")?;
        let mut path = Vec::new();
        while p.peek_key() == Some("node_hash") {
            path.push(p.get_hash("node_hash")?);
        }
        Ok(Self {
            leaf_index,
            tree_size,
            path,
        })
    }

    pub fn from_ascii(input: &str) -> Result<Self, crate::Error> {
        let mut p = Parser::new(input);
        let proof = Self::parse(&mut p)?;
        p.get_eof()?;
        Ok(proof)
    }
}

/// Merkle path proving that one tree is a prefix of another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyProof {
    pub old_size: u64,
    pub new_size: u64,
    pub path: Vec<Hash>,
}

impl ConsistencyProof {
    /// Verify the proof between two tree heads. The proof's sizes must
    /// agree with the heads'.
    pub fn verify(&self, old: &TreeHead, new: &TreeHead) -> Result<(), ProofError> {
        if self.old_size != old.size || self.new_size != new.size {
            return Err(ProofError::MalformedProof);
        }
        verify_consistency(
            old.size,
            new.size,
            &old.root_hash,
            &new.root_hash,
            &self.path,
        )
    }

    pub fn to_ascii(&self, out: &mut String) {
        ascii::write_int(out, "old_size", self.old_size);
        ascii::write_int(out, "new_size", self.new_size);
        for hash in &self.path {
            ascii::write_hex(out, "node_hash", hash);
        }
    }

    pub fn parse(p: &mut Parser) -> Result<Self, crate::Error> {
        let old_size = p.get_int("old_size")?;
        let new_size = p.get_int("new_size")?;
        let mut path = Vec::new();
        while p.peek_key() == Some("node_hash") {
            path.push(p.get_hash("node_hash")?);
        }
        Ok(Self {
            old_size,
            new_size,
            path,
        })
    }

    pub fn from_ascii(input: &str) -> Result<Self, crate::Error> {
        let mut p = Parser::new(input);
        let proof = Self::parse(&mut p)?;
        p.get_eof()?;
        Ok(proof)
    }
}
