//! Merkle proof verification
//!
//! Verifies inclusion, consistency, and batch-inclusion proofs over the
//! binary hash tree of RFC 9162, §2.1. All functions are pure: they take
//! slices, return nothing but a verdict, and keep no state between calls.

use sigsum_crypto::{hash_empty_tree, hash_interior_node, Hash};

/// Why a Merkle proof was rejected.
///
/// There is deliberately just one error kind for all Merkle failures; the
/// variant is a reason tag, not a separate contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    #[error("malformed proof input")]
    MalformedProof,
    #[error("root mismatch")]
    RootMismatch,
    #[error("leaf range inconsistent with proof paths")]
    LeafRangeInconsistent,
}

fn bit_len(x: u64) -> usize {
    (u64::BITS - x.leading_zeros()) as usize
}

/// Number of sibling hashes in an inclusion proof for leaf `index` in a
/// tree of `size` leaves.
pub fn inclusion_path_length(index: u64, size: u64) -> usize {
    // k is the number of lowend bits that differ between index and
    // size-1, i.e., the number of levels until the two positions merge.
    let k = bit_len(index ^ (size - 1));
    k + (index >> k).count_ones() as usize
}

/// Number of hashes in a consistency proof from `old_size` to `new_size`,
/// for `0 < old_size < new_size`.
pub fn consistency_path_length(old_size: u64, new_size: u64) -> usize {
    let trim = old_size.trailing_zeros();
    let fn_ = (old_size - 1) >> trim;
    let sn = (new_size - 1) >> trim;
    inclusion_path_length(fn_, sn + 1) + usize::from(fn_ > 0)
}

/// Verify that a leaf hash is included in a Merkle tree. The algorithm is
/// equivalent to the one in RFC 9162, §2.1.3.2. With `index == 0` and
/// `size == 1` the empty path is a valid proof, and inclusion means that
/// `leaf == root`.
pub fn verify_inclusion(
    leaf: &Hash,
    index: u64,
    size: u64,
    root: &Hash,
    path: &[Hash],
) -> Result<(), ProofError> {
    if index >= size {
        return Err(ProofError::MalformedProof);
    }
    if path.len() != inclusion_path_length(index, size) {
        return Err(ProofError::MalformedProof);
    }

    // Each iteration eliminates the bottom layer of the tree. fn_ is the
    // index of the hash of interest r; sn is the index of the last node.
    // All leaves sit at the bottom layer, though the parent of the last
    // one may be more than one level up. E.g., the tree with 3 leaves:
    //
    //     o      Root node
    //    / \
    //   o   \
    //  / \   \
    // o   o   o  The three leaf nodes
    // 0   1   2
    let mut r = *leaf;
    let mut fn_ = index;
    let mut sn = size - 1;
    let mut path = path.iter();
    while sn > 0 {
        if fn_ & 1 == 1 {
            // Node on path is a left sibling.
            let p = path.next().ok_or(ProofError::MalformedProof)?;
            r = hash_interior_node(p, &r);
        } else if fn_ < sn {
            // Node on path is a right sibling.
            let p = path.next().ok_or(ProofError::MalformedProof)?;
            r = hash_interior_node(&r, p);
        }
        fn_ >>= 1;
        sn >>= 1;
    }
    if path.next().is_some() {
        return Err(ProofError::MalformedProof);
    }
    if r != *root {
        return Err(ProofError::RootMismatch);
    }
    Ok(())
}

/// Verify that the tree of `old_size` leaves with root `old_root` is a
/// prefix of the tree of `new_size` leaves with root `new_root`. The
/// algorithm is the one in RFC 9162, §2.1.4.2.
pub fn verify_consistency(
    old_size: u64,
    new_size: u64,
    old_root: &Hash,
    new_root: &Hash,
    path: &[Hash],
) -> Result<(), ProofError> {
    // The easy cases where an empty proof is valid.
    if old_size == new_size {
        if !path.is_empty() {
            return Err(ProofError::MalformedProof);
        }
        if old_root != new_root {
            return Err(ProofError::RootMismatch);
        }
        return Ok(());
    }
    if old_size > new_size {
        return Err(ProofError::MalformedProof);
    }
    if old_size == 0 {
        // Anything is consistent with the empty tree.
        if !path.is_empty() {
            return Err(ProofError::MalformedProof);
        }
        if *old_root != hash_empty_tree() {
            return Err(ProofError::RootMismatch);
        }
        return Ok(());
    }

    // The last leaf of the old tree is at index fn_. Eliminate bottom
    // layers of the tree until fn_ points at a subtree that is a left
    // child; that subtree is included as-is in the new tree, and is the
    // starting point for the traversal.
    let trim = old_size.trailing_zeros();
    let mut fn_ = (old_size - 1) >> trim;
    let mut sn = (new_size - 1) >> trim;

    if path.len() != consistency_path_length(old_size, new_size) {
        return Err(ProofError::MalformedProof);
    }
    let mut path = path.iter();

    // With fn_ == 0 we start at the old root, otherwise at the first
    // element of the supplied path.
    let mut fr = if fn_ == 0 {
        *old_root
    } else {
        *path.next().ok_or(ProofError::MalformedProof)?
    };
    let mut sr = fr;

    while sn > 0 {
        if fn_ & 1 == 1 {
            // Node on path is a left sibling.
            let p = path.next().ok_or(ProofError::MalformedProof)?;
            fr = hash_interior_node(p, &fr);
            sr = hash_interior_node(p, &sr);
        } else if fn_ < sn {
            // Node on path is a right sibling for the larger tree.
            let p = path.next().ok_or(ProofError::MalformedProof)?;
            sr = hash_interior_node(&sr, p);
        }
        fn_ >>= 1;
        sn >>= 1;
    }
    if path.next().is_some() {
        return Err(ProofError::MalformedProof);
    }
    if fr != *old_root {
        return Err(ProofError::RootMismatch);
    }
    if sr != *new_root {
        return Err(ProofError::RootMismatch);
    }
    Ok(())
}

fn extend_range(cr: &mut Vec<Hash>, i: u64, mut h: Hash, make_node: impl Fn(&Hash, &Hash) -> Hash) {
    let mut s = i + 1;
    while s & 1 == 0 {
        let Some(top) = cr.pop() else { break };
        h = make_node(&top, &h);
        s >>= 1;
    }
    cr.push(h);
}

// Compact range of a leaf interval ending at a multiple of 2^k, in
// reverse order, rightmost subtree first.
fn make_left_range(leaves: &[Hash]) -> Vec<Hash> {
    let Some(last) = leaves.last() else {
        return Vec::new();
    };
    let mut cr = vec![*last];
    for i in 1..leaves.len() {
        extend_range(&mut cr, i as u64, leaves[leaves.len() - 1 - i], |left, right| {
            hash_interior_node(right, left)
        });
    }
    cr
}

// Compact range of a leaf interval starting at a multiple of 2^k.
fn make_right_range(leaves: &[Hash]) -> Vec<Hash> {
    let Some(first) = leaves.first() else {
        return Vec::new();
    };
    let mut cr = vec![*first];
    for i in 1..leaves.len() {
        extend_range(&mut cr, i as u64, leaves[i], hash_interior_node);
    }
    cr
}

/// Verify that a consecutive sequence of leaf hashes, starting at index
/// `first_index`, is included in a Merkle tree. The algorithm extends the
/// RFC 9162 inclusion proof, using the inclusion paths for the first and
/// last (inclusive) leaves of the sequence.
pub fn verify_inclusion_batch(
    leaves: &[Hash],
    first_index: u64,
    size: u64,
    root: &Hash,
    start_path: &[Hash],
    end_path: &[Hash],
) -> Result<(), ProofError> {
    if leaves.is_empty() {
        return Err(ProofError::MalformedProof);
    }
    let en = first_index + leaves.len() as u64 - 1;
    if en >= size {
        return Err(ProofError::MalformedProof);
    }

    if leaves.len() == 1 {
        if start_path != end_path {
            return Err(ProofError::LeafRangeInconsistent);
        }
        return verify_inclusion(&leaves[0], first_index, size, root, start_path);
    }
    if start_path.len() != inclusion_path_length(first_index, size) {
        return Err(ProofError::MalformedProof);
    }
    if end_path.len() != inclusion_path_length(en, size) {
        return Err(ProofError::MalformedProof);
    }

    // k is the bit index of the most significant bit where the first and
    // last leaf indices differ. Split the range at a multiple of 2^k, so
    // that split - 2^k <= first_index < split <= en < split + 2^k.
    let k = bit_len(first_index ^ en) - 1;
    let split = en & !((1u64 << k) - 1);

    // Compact ranges over the intermediate leaves, i.e., excluding the
    // leaves at first_index and en, split as above.
    let mut left_range = make_left_range(&leaves[1..(split - first_index) as usize]);
    let mut right_range = make_right_range(&leaves[(split - first_index) as usize..leaves.len() - 1]);

    // Process the start path. For the first k levels, right siblings must
    // match the left compact range.
    let mut fr = leaves[0];
    let mut fn_ = first_index;
    for i in 0..k {
        let sibling = start_path.get(i).ok_or(ProofError::MalformedProof)?;
        if fn_ & 1 == 1 {
            // Node on path is a left sibling.
            fr = hash_interior_node(sibling, &fr);
        } else {
            let s = left_range.pop().ok_or(ProofError::LeafRangeInconsistent)?;
            if s != *sibling {
                return Err(ProofError::LeafRangeInconsistent);
            }
            fr = hash_interior_node(&fr, &s);
        }
        fn_ >>= 1;
    }
    let start_path = &start_path[k..];

    // Process the end path. For the first k levels, left siblings must
    // match the right compact range.
    let mut en_ = en;
    let mut sn = size - 1;
    let mut er = leaves[leaves.len() - 1];
    let mut consumed = 0;
    for _ in 0..k {
        if en_ & 1 == 1 {
            let s = right_range.pop().ok_or(ProofError::LeafRangeInconsistent)?;
            let sibling = end_path.get(consumed).ok_or(ProofError::MalformedProof)?;
            if s != *sibling {
                return Err(ProofError::LeafRangeInconsistent);
            }
            er = hash_interior_node(&s, &er);
            consumed += 1;
        } else if en_ < sn {
            let sibling = end_path.get(consumed).ok_or(ProofError::MalformedProof)?;
            er = hash_interior_node(&er, sibling);
            consumed += 1;
        }
        en_ >>= 1;
        sn >>= 1;
    }
    let end_path = &end_path[consumed..];

    // The two positions are now adjacent siblings about to merge into a
    // single node, and both compact ranges must be exhausted.
    debug_assert!(fn_ & 1 == 0 && en_ & 1 == 1 && fn_ + 1 == en_);
    debug_assert!(left_range.is_empty() && right_range.is_empty());
    let (Some(start_first), Some(end_first)) = (start_path.first(), end_path.first()) else {
        return Err(ProofError::MalformedProof);
    };
    if *start_first != er || *end_first != fr {
        return Err(ProofError::LeafRangeInconsistent);
    }
    if start_path[1..] != end_path[1..] {
        return Err(ProofError::LeafRangeInconsistent);
    }

    let parent = hash_interior_node(&fr, &er);
    verify_inclusion(&parent, fn_ >> 1, (sn >> 1) + 1, root, &start_path[1..])
}
