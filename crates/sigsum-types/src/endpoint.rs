//! Endpoint paths of the log and witness HTTP APIs

/// A named API endpoint. GET endpoints with URL parameters end in a
/// slash; their parameters are appended by the request types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    AddLeaf,
    GetTreeHead,
    GetNextTreeHead,
    GetTreeHeadUnsigned,
    GetInclusionProof,
    GetConsistencyProof,
    GetLeaves,
    AddTreeHead,
    GetTreeSize,
}

impl Endpoint {
    fn suffix(&self) -> &'static str {
        match self {
            Endpoint::AddLeaf => "add-leaf",
            Endpoint::GetTreeHead => "get-tree-head",
            Endpoint::GetNextTreeHead => "get-next-tree-head",
            Endpoint::GetTreeHeadUnsigned => "get-tree-head-unsigned",
            Endpoint::GetInclusionProof => "get-inclusion-proof/",
            Endpoint::GetConsistencyProof => "get-consistency-proof/",
            Endpoint::GetLeaves => "get-leaves/",
            Endpoint::AddTreeHead => "add-tree-head",
            Endpoint::GetTreeSize => "get-tree-size/",
        }
    }

    /// The endpoint's URL under a slash-terminated base URL.
    pub fn path(&self, base_url: &str) -> String {
        format!("{base_url}{}", self.suffix())
    }
}
