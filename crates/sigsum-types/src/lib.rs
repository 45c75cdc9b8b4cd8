//! Core types and wire codecs for the Sigsum log ecosystem
//!
//! This crate provides the artifacts that cross the Sigsum wire — leaves,
//! tree heads, cosignatures, Merkle proofs, request parameters — together
//! with the line-oriented ASCII codec and the checkpoint (signed note)
//! form used to transport cosignatures.

pub mod ascii;
pub mod checkpoint;
pub mod endpoint;
pub mod error;
pub mod leaf;
pub mod proofs;
pub mod requests;
pub mod tree_head;

pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use leaf::{leaf_signed_data, leaves_from_ascii, leaves_to_ascii, Leaf, TREE_LEAF_NAMESPACE};
pub use proofs::{ConsistencyProof, InclusionProof};
pub use tree_head::{
    tree_origin, Cosignature, CosignedTreeHead, SignedTreeHead, TreeHead, CHECKPOINT_NAME_PREFIX,
    TREE_HEAD_NAMESPACE,
};
