//! Tree heads, log signatures, and witness cosignatures

use crate::ascii::{self, Parser};
use crate::error::{Error, Result};
use sigsum_crypto::{key_hash, ssh, verify, Hash, PublicKey, Signature, Signer};

/// Domain-separation namespace bound into the log's tree-head signature.
pub const TREE_HEAD_NAMESPACE: &str = "signed-tree-head:v0@sigsum.org";

/// Prefix of the checkpoint origin identifying a Sigsum log by key hash.
pub const CHECKPOINT_NAME_PREFIX: &str = "sigsum.org/v1/tree/";

/// The checkpoint origin of the log with the given key hash.
pub fn tree_origin(log_key_hash: &Hash) -> String {
    format!("{CHECKPOINT_NAME_PREFIX}{}", hex::encode(log_key_hash))
}

/// Cryptographic summary of the log at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeHead {
    pub size: u64,
    pub root_hash: Hash,
}

impl TreeHead {
    /// The byte layout that the log signs:
    /// `size_be64 || root_hash || log_key_hash`.
    pub fn to_binary(&self, log_key_hash: &Hash) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + 2 * 32);
        buf.extend_from_slice(&self.size.to_be_bytes());
        buf.extend_from_slice(&self.root_hash);
        buf.extend_from_slice(log_key_hash);
        buf
    }

    fn to_signed_data(&self, log_key_hash: &Hash) -> Vec<u8> {
        ssh::signed_data(TREE_HEAD_NAMESPACE, &self.to_binary(log_key_hash))
    }

    /// Sign the tree head with the log's key.
    pub fn sign(&self, signer: &dyn Signer, log_key_hash: &Hash) -> Result<SignedTreeHead> {
        let signature = signer.sign(&self.to_signed_data(log_key_hash))?;
        Ok(SignedTreeHead {
            tree_head: *self,
            signature,
        })
    }

    /// The checkpoint body: the origin line followed by the canonical
    /// tree-head lines.
    pub fn to_checkpoint_body(&self, origin: &str) -> String {
        let mut out = String::with_capacity(origin.len() + 96);
        out.push_str(origin);
        out.push('\n');
        self.to_ascii(&mut out);
        out
    }

    pub fn to_ascii(&self, out: &mut String) {
        ascii::write_int(out, "size", self.size);
        ascii::write_hex(out, "root_hash", &self.root_hash);
    }

    pub fn parse(p: &mut Parser) -> Result<Self> {
        Ok(Self {
            size: p.get_int("size")?,
            root_hash: p.get_hash("root_hash")?,
        })
    }

    pub fn from_ascii(input: &str) -> Result<Self> {
        let mut p = Parser::new(input);
        let tree_head = Self::parse(&mut p)?;
        p.get_eof()?;
        Ok(tree_head)
    }
}

/// What a witness signs: the observation time concatenated with the
/// checkpoint body under the log's derived origin.
fn cosigned_data(tree_head: &TreeHead, log_key_hash: &Hash, timestamp: u64) -> Vec<u8> {
    let body = tree_head.to_checkpoint_body(&tree_origin(log_key_hash));
    let mut buf = Vec::with_capacity(8 + body.len());
    buf.extend_from_slice(&timestamp.to_be_bytes());
    buf.extend_from_slice(body.as_bytes());
    buf
}

/// A witness's assertion that it observed a tree head at a UTC second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cosignature {
    pub key_hash: Hash,
    pub timestamp: u64,
    pub signature: Signature,
}

impl Cosignature {
    pub fn verify(
        &self,
        public_key: &PublicKey,
        log_key_hash: &Hash,
        tree_head: &TreeHead,
    ) -> bool {
        verify(
            public_key,
            &cosigned_data(tree_head, log_key_hash, self.timestamp),
            &self.signature,
        )
    }
}

/// A tree head together with the log's signature over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedTreeHead {
    pub tree_head: TreeHead,
    pub signature: Signature,
}

impl SignedTreeHead {
    /// Check the log signature.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        verify(
            public_key,
            &self.tree_head.to_signed_data(&key_hash(public_key)),
            &self.signature,
        )
    }

    /// Produce a witness cosignature over this tree head.
    pub fn cosign(
        &self,
        signer: &dyn Signer,
        log_key_hash: &Hash,
        timestamp: u64,
    ) -> Result<Cosignature> {
        let signature = signer.sign(&cosigned_data(&self.tree_head, log_key_hash, timestamp))?;
        Ok(Cosignature {
            key_hash: key_hash(&signer.public()),
            timestamp,
            signature,
        })
    }

    pub fn to_ascii(&self, out: &mut String) {
        self.tree_head.to_ascii(out);
        ascii::write_hex(out, "signature", &self.signature);
    }

    pub fn parse(p: &mut Parser) -> Result<Self> {
        Ok(Self {
            tree_head: TreeHead::parse(p)?,
            signature: p.get_signature("signature")?,
        })
    }

    pub fn from_ascii(input: &str) -> Result<Self> {
        let mut p = Parser::new(input);
        let sth = Self::parse(&mut p)?;
        p.get_eof()?;
        Ok(sth)
    }
}

/// A signed tree head with zero or more witness cosignatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosignedTreeHead {
    pub signed_tree_head: SignedTreeHead,
    pub cosignatures: Vec<Cosignature>,
}

impl CosignedTreeHead {
    pub fn tree_head(&self) -> &TreeHead {
        &self.signed_tree_head.tree_head
    }

    /// Check the log signature; cosignatures are judged by a policy.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        self.signed_tree_head.verify(public_key)
    }

    pub fn to_ascii(&self, out: &mut String) {
        self.signed_tree_head.to_ascii(out);
        for cs in &self.cosignatures {
            out.push_str("cosignature=");
            out.push_str(&hex::encode(cs.key_hash));
            out.push(' ');
            out.push_str(&cs.timestamp.to_string());
            out.push(' ');
            out.push_str(&hex::encode(cs.signature));
            out.push('\n');
        }
    }

    pub fn parse(p: &mut Parser) -> Result<Self> {
        let signed_tree_head = SignedTreeHead::parse(p)?;
        let mut cosignatures = Vec::new();
        while p.peek_key() == Some("cosignature") {
            let v = p.get_values("cosignature", 3)?;
            cosignatures.push(Cosignature {
                key_hash: sigsum_crypto::hash_from_hex(v[0])
                    .map_err(|e| ascii::invalid("cosignature", e))?,
                timestamp: ascii::parse_int("cosignature", v[1])?,
                signature: sigsum_crypto::signature_from_hex(v[2])
                    .map_err(|e| ascii::invalid("cosignature", e))?,
            });
        }
        Ok(Self {
            signed_tree_head,
            cosignatures,
        })
    }

    pub fn from_ascii(input: &str) -> Result<Self> {
        let mut p = Parser::new(input);
        let cth = Self::parse(&mut p)?;
        p.get_eof()?;
        Ok(cth)
    }
}
