//! Request parameters for the log endpoints
//!
//! GET parameters travel at the end of a slash-terminated URL; POST bodies
//! use the ASCII codec. Server-side precondition checks (`size >= 2`,
//! `old_size < new_size`, `start_index < end_index`) belong to the API
//! boundary, not to these carriers.

use crate::ascii::{self, Parser};
use crate::error::{Error, Result};
use crate::proofs;
use crate::tree_head::SignedTreeHead;
use sigsum_crypto::{Hash, PublicKey, Signature};

/// Body of an add-leaf request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    pub message: Hash,
    pub signature: Signature,
    pub public_key: PublicKey,
}

impl Leaf {
    pub fn to_ascii(&self, out: &mut String) {
        ascii::write_hex(out, "message", &self.message);
        ascii::write_hex(out, "signature", &self.signature);
        ascii::write_hex(out, "public_key", &self.public_key);
    }

    pub fn from_ascii(input: &str) -> Result<Self> {
        let mut p = Parser::new(input);
        let req = Self {
            message: p.get_hash("message")?,
            signature: p.get_signature("signature")?,
            public_key: p.get_public_key("public_key")?,
        };
        p.get_eof()?;
        Ok(req)
    }
}

/// Parameters of a get-leaves request; the range is half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaves {
    pub start_index: u64,
    pub end_index: u64,
}

/// Parameters of a get-inclusion-proof request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InclusionProof {
    pub size: u64,
    pub leaf_hash: Hash,
}

/// Parameters of a get-consistency-proof request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencyProof {
    pub old_size: u64,
    pub new_size: u64,
}

fn last_two_segments(url: &str) -> Result<(&str, &str)> {
    let mut iter = url.rsplit('/');
    let last = iter.next().filter(|s| !s.is_empty());
    let second_last = iter.next();
    match (second_last, last) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(Error::MalformedLine(url.to_string())),
    }
}

impl Leaves {
    /// Append the parameters to a slash-terminated URL.
    pub fn to_url(&self, url: &str) -> String {
        format!("{url}{}/{}", self.start_index, self.end_index)
    }

    /// Parse the parameters from a URL that is not slash-terminated.
    pub fn from_url(url: &str) -> Result<Self> {
        let (start, end) = last_two_segments(url)?;
        Ok(Self {
            start_index: ascii::parse_int("start_index", start)?,
            end_index: ascii::parse_int("end_index", end)?,
        })
    }
}

impl InclusionProof {
    /// Append the parameters to a slash-terminated URL.
    pub fn to_url(&self, url: &str) -> String {
        format!("{url}{}/{}", self.size, hex::encode(self.leaf_hash))
    }

    /// Parse the parameters from a URL that is not slash-terminated.
    pub fn from_url(url: &str) -> Result<Self> {
        let (size, leaf_hash) = last_two_segments(url)?;
        Ok(Self {
            size: ascii::parse_int("size", size)?,
            leaf_hash: sigsum_crypto::hash_from_hex(leaf_hash)
                .map_err(|e| ascii::invalid("leaf_hash", e))?,
        })
    }
}

impl ConsistencyProof {
    /// Append the parameters to a slash-terminated URL.
    pub fn to_url(&self, url: &str) -> String {
        format!("{url}{}/{}", self.old_size, self.new_size)
    }

    /// Parse the parameters from a URL that is not slash-terminated.
    pub fn from_url(url: &str) -> Result<Self> {
        let (old, new) = last_two_segments(url)?;
        Ok(Self {
            old_size: ascii::parse_int("old_size", old)?,
            new_size: ascii::parse_int("new_size", new)?,
        })
    }
}

/// Body of an add-cosignature request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cosignature {
    pub key_hash: Hash,
    pub signature: Signature,
}

impl Cosignature {
    pub fn to_ascii(&self, out: &mut String) {
        out.push_str("cosignature=");
        out.push_str(&hex::encode(self.key_hash));
        out.push(' ');
        out.push_str(&hex::encode(self.signature));
        out.push('\n');
    }

    pub fn from_ascii(input: &str) -> Result<Self> {
        let mut p = Parser::new(input);
        let v = p.get_values("cosignature", 2)?;
        let req = Self {
            key_hash: sigsum_crypto::hash_from_hex(v[0])
                .map_err(|e| ascii::invalid("cosignature", e))?,
            signature: sigsum_crypto::signature_from_hex(v[1])
                .map_err(|e| ascii::invalid("cosignature", e))?,
        };
        p.get_eof()?;
        Ok(req)
    }
}

/// Body of an add-tree-head request, as sent from a log to its witness.
///
/// The consistency proof links the witness's previously seen size to the
/// new tree head; it is omitted from the body exactly when consistency is
/// trivial (`old_size == 0` or `old_size == size`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTreeHead {
    pub key_hash: Hash,
    pub tree_head: SignedTreeHead,
    pub old_size: u64,
    pub proof: proofs::ConsistencyProof,
}

impl AddTreeHead {
    fn trivial_consistency(&self) -> bool {
        self.old_size == 0 || self.old_size == self.tree_head.tree_head.size
    }

    pub fn to_ascii(&self, out: &mut String) {
        ascii::write_hex(out, "key_hash", &self.key_hash);
        self.tree_head.to_ascii(out);
        ascii::write_int(out, "old_size", self.old_size);
        if !self.trivial_consistency() {
            for hash in &self.proof.path {
                ascii::write_hex(out, "node_hash", hash);
            }
        }
    }

    pub fn from_ascii(input: &str) -> Result<Self> {
        let mut p = Parser::new(input);
        let key_hash = p.get_hash("key_hash")?;
        let tree_head = SignedTreeHead::parse(&mut p)?;
        let old_size = p.get_int("old_size")?;
        if old_size > tree_head.tree_head.size {
            return Err(Error::InvalidValue {
                key: "old_size",
                reason: format!(
                    "old_size ({old_size}) larger than size ({})",
                    tree_head.tree_head.size
                ),
            });
        }

        let mut path = Vec::new();
        if old_size != 0 && old_size != tree_head.tree_head.size {
            while p.peek_key() == Some("node_hash") {
                path.push(p.get_hash("node_hash")?);
            }
        }
        p.get_eof()?;
        Ok(Self {
            key_hash,
            tree_head,
            old_size,
            proof: proofs::ConsistencyProof {
                old_size,
                new_size: tree_head.tree_head.size,
                path,
            },
        })
    }
}

/// Parameters of a get-tree-size request, as sent from a log to its
/// witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetTreeSize {
    pub key_hash: Hash,
}

impl GetTreeSize {
    /// Append the parameters to a slash-terminated URL.
    pub fn to_url(&self, url: &str) -> String {
        format!("{url}{}", hex::encode(self.key_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree_head::TreeHead;
    use sigsum_crypto::{hash_bytes, key_hash, KeyPair, Signer};

    #[test]
    fn leaf_request_ascii_roundtrip() {
        let pair = KeyPair::from_bytes(&[21; 32]);
        let message = hash_bytes(b"artifact");
        let req = Leaf {
            message,
            signature: pair.sign(&message).unwrap(),
            public_key: pair.public(),
        };
        let mut text = String::new();
        req.to_ascii(&mut text);
        assert!(text.starts_with("message="));
        assert_eq!(Leaf::from_ascii(&text).unwrap(), req);

        // Lines in the wrong order are rejected.
        assert!(Leaf::from_ascii(&text.lines().rev().map(|l| format!("{l}\n")).collect::<String>())
            .is_err());
    }

    #[test]
    fn url_parameter_roundtrips() {
        let leaves = Leaves {
            start_index: 10,
            end_index: 20,
        };
        let url = leaves.to_url("https://log.example.org/get-leaves/");
        assert!(url.ends_with("/get-leaves/10/20"));
        assert_eq!(Leaves::from_url(&url).unwrap(), leaves);

        let inclusion = InclusionProof {
            size: 4711,
            leaf_hash: hash_bytes(b"leaf"),
        };
        let url = inclusion.to_url("https://log.example.org/get-inclusion-proof/");
        assert_eq!(InclusionProof::from_url(&url).unwrap(), inclusion);

        let consistency = ConsistencyProof {
            old_size: 42,
            new_size: 4711,
        };
        let url = consistency.to_url("https://log.example.org/get-consistency-proof/");
        assert_eq!(ConsistencyProof::from_url(&url).unwrap(), consistency);
    }

    #[test]
    fn url_parsing_needs_two_segments() {
        assert!(Leaves::from_url("10").is_err());
        assert!(Leaves::from_url("https://log.example.org/get-leaves/10/").is_err());
        assert!(Leaves::from_url("a/b").is_err());
    }

    #[test]
    fn cosignature_request_ascii_roundtrip() {
        let pair = KeyPair::from_bytes(&[22; 32]);
        let req = Cosignature {
            key_hash: key_hash(&pair.public()),
            signature: pair.sign(b"head").unwrap(),
        };
        let mut text = String::new();
        req.to_ascii(&mut text);
        assert_eq!(Cosignature::from_ascii(&text).unwrap(), req);
    }

    fn signed_head(size: u64) -> (SignedTreeHead, Hash) {
        let log = KeyPair::from_bytes(&[23; 32]);
        let log_key_hash = key_hash(&log.public());
        let head = TreeHead {
            size,
            root_hash: hash_bytes(b"root"),
        };
        (head.sign(&log, &log_key_hash).unwrap(), log_key_hash)
    }

    #[test]
    fn add_tree_head_roundtrip_with_proof() {
        let (tree_head, log_key_hash) = signed_head(7);
        let req = AddTreeHead {
            key_hash: log_key_hash,
            tree_head,
            old_size: 3,
            proof: proofs::ConsistencyProof {
                old_size: 3,
                new_size: 7,
                path: vec![hash_bytes(b"n0"), hash_bytes(b"n1")],
            },
        };
        let mut text = String::new();
        req.to_ascii(&mut text);
        assert_eq!(text.matches("node_hash=").count(), 2);
        assert_eq!(AddTreeHead::from_ascii(&text).unwrap(), req);
    }

    #[test]
    fn add_tree_head_trivial_consistency_omits_proof() {
        let (tree_head, log_key_hash) = signed_head(7);
        for old_size in [0, 7] {
            let req = AddTreeHead {
                key_hash: log_key_hash,
                tree_head,
                old_size,
                proof: proofs::ConsistencyProof {
                    old_size,
                    new_size: 7,
                    path: Vec::new(),
                },
            };
            let mut text = String::new();
            req.to_ascii(&mut text);
            assert!(!text.contains("node_hash="));
            assert_eq!(AddTreeHead::from_ascii(&text).unwrap(), req);
        }
    }

    #[test]
    fn add_tree_head_rejects_shrinking_tree() {
        let (tree_head, log_key_hash) = signed_head(7);
        let req = AddTreeHead {
            key_hash: log_key_hash,
            tree_head,
            old_size: 9,
            proof: proofs::ConsistencyProof {
                old_size: 9,
                new_size: 7,
                path: Vec::new(),
            },
        };
        let mut text = String::new();
        req.to_ascii(&mut text);
        assert!(AddTreeHead::from_ascii(&text).is_err());
    }
}
