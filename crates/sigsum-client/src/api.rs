//! The log API surface
//!
//! [`Log`] is the capability a server binds its endpoints to and a client
//! mirrors. The core does not carry the HTTP transport; this module only
//! fixes the contract an adapter must follow: argument preconditions that
//! map to 400, and the status codes for the [`ApiError`] sentinels.

use async_trait::async_trait;

use sigsum_types::requests;
use sigsum_types::{ConsistencyProof, CosignedTreeHead, InclusionProof, Leaf};

/// Name of the optional submit-token HTTP header.
pub const SUBMIT_HEADER_NAME: &str = "Sigsum-Token";

/// An opaque `Sigsum-Token` header value. Rate-limit tokens are handled
/// outside the core; the value is passed through to the log untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitHeader(pub String);

/// Errors crossing the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Argument precondition violated; an HTTP adapter answers 400.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The requested artifact does not exist (yet); 404.
    #[error("not found")]
    NotFound,
    /// Sentinel: the request was acknowledged but the artifact is not yet
    /// queryable; 202.
    #[error("accepted")]
    Accepted,
    /// The peer answered, but not with a valid artifact.
    #[error("bad response: {0}")]
    BadResponse(String),
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// The HTTP status an adapter reports for this error.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::NotFound => 404,
            ApiError::Accepted => 202,
            ApiError::BadResponse(_) | ApiError::Transport(_) => 500,
        }
    }
}

/// The abstract log capability.
///
/// Implementations may be invoked concurrently from many request
/// contexts; every method is a pure request/response exchange.
#[async_trait]
pub trait Log: Send + Sync {
    /// The latest cosigned tree head.
    async fn get_tree_head(&self) -> Result<CosignedTreeHead, ApiError>;

    /// Inclusion proof for a leaf hash in the tree of the given size.
    async fn get_inclusion_proof(
        &self,
        req: requests::InclusionProof,
    ) -> Result<InclusionProof, ApiError>;

    /// Consistency proof between two published tree sizes.
    async fn get_consistency_proof(
        &self,
        req: requests::ConsistencyProof,
    ) -> Result<ConsistencyProof, ApiError>;

    /// Leaves in ascending index order, contiguous from `start_index`.
    async fn get_leaves(&self, req: requests::Leaves) -> Result<Vec<Leaf>, ApiError>;

    /// Submit a leaf. Returns true once the leaf is persisted; false
    /// means accepted but not yet sequenced, and the submitter retries.
    async fn add_leaf(
        &self,
        req: requests::Leaf,
        header: Option<SubmitHeader>,
    ) -> Result<bool, ApiError>;
}

/// Server-side precondition for get-inclusion-proof. Size 0 can prove
/// nothing, and size 1 needs no proof.
pub fn check_inclusion_request(req: &requests::InclusionProof) -> Result<(), ApiError> {
    if req.size < 2 {
        return Err(ApiError::InvalidRequest(format!(
            "size ({}) must be larger than one",
            req.size
        )));
    }
    Ok(())
}

/// Server-side precondition for get-consistency-proof.
pub fn check_consistency_request(req: &requests::ConsistencyProof) -> Result<(), ApiError> {
    if req.old_size < 1 {
        return Err(ApiError::InvalidRequest(format!(
            "old_size ({}) must be larger than zero",
            req.old_size
        )));
    }
    if req.new_size <= req.old_size {
        return Err(ApiError::InvalidRequest(format!(
            "new_size ({}) must be larger than old_size ({})",
            req.new_size, req.old_size
        )));
    }
    Ok(())
}

/// Server-side precondition for get-leaves.
pub fn check_leaves_request(req: &requests::Leaves) -> Result<(), ApiError> {
    if req.start_index >= req.end_index {
        return Err(ApiError::InvalidRequest(format!(
            "start_index ({}) must be less than end_index ({})",
            req.start_index, req.end_index
        )));
    }
    Ok(())
}
