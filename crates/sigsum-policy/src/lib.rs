//! Trust policy for cosigned tree heads
//!
//! A policy is a set of trusted log keys, a set of trusted witness keys,
//! and a quorum threshold k. A cosigned tree head satisfies the policy if
//! it carries a valid signature from a trusted log and valid cosignatures
//! from at least k distinct trusted witnesses.

use std::collections::{HashMap, HashSet};

use sigsum_crypto::{key_hash, Hash, PublicKey};
use sigsum_types::CosignedTreeHead;

/// Why a cosigned tree head failed the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("quorum {quorum} exceeds the number of witnesses {witnesses}")]
    QuorumTooLarge { quorum: usize, witnesses: usize },
    #[error("tree head from an unknown log")]
    UnknownLog,
    #[error("invalid log signature on tree head")]
    BadLogSignature,
    #[error("insufficient cosignatures: {got} valid, {need} required")]
    InsufficientCosignatures { need: usize, got: usize },
}

/// A k-of-n witness-quorum predicate gated by a log identity.
#[derive(Debug, Clone)]
pub struct Policy {
    logs: HashMap<Hash, PublicKey>,
    witnesses: HashMap<Hash, PublicKey>,
    quorum: usize,
}

impl Policy {
    /// Build a policy trusting the given logs and witnesses, requiring
    /// valid cosignatures from at least `quorum` distinct witnesses.
    pub fn k_of_n(
        logs: &[PublicKey],
        witnesses: &[PublicKey],
        quorum: usize,
    ) -> Result<Self, PolicyError> {
        let witnesses: HashMap<Hash, PublicKey> =
            witnesses.iter().map(|key| (key_hash(key), *key)).collect();
        if quorum > witnesses.len() {
            return Err(PolicyError::QuorumTooLarge {
                quorum,
                witnesses: witnesses.len(),
            });
        }
        Ok(Self {
            logs: logs.iter().map(|key| (key_hash(key), *key)).collect(),
            witnesses,
            quorum,
        })
    }

    /// Check a cosigned tree head claimed to come from the log with key
    /// hash `log_key_hash`. Cosignatures from unknown witnesses and
    /// invalid cosignatures are ignored; each witness counts at most once
    /// towards the quorum.
    pub fn verify_cosigned_tree_head(
        &self,
        log_key_hash: &Hash,
        cth: &CosignedTreeHead,
    ) -> Result<(), PolicyError> {
        let log_key = self.logs.get(log_key_hash).ok_or(PolicyError::UnknownLog)?;
        if !cth.verify(log_key) {
            return Err(PolicyError::BadLogSignature);
        }

        let mut valid: HashSet<Hash> = HashSet::new();
        for cs in &cth.cosignatures {
            let Some(witness_key) = self.witnesses.get(&cs.key_hash) else {
                continue;
            };
            if cs.verify(witness_key, log_key_hash, cth.tree_head()) {
                valid.insert(cs.key_hash);
            }
        }
        if valid.len() < self.quorum {
            return Err(PolicyError::InsufficientCosignatures {
                need: self.quorum,
                got: valid.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigsum_crypto::{hash_bytes, KeyPair, Signer};
    use sigsum_types::TreeHead;

    struct Setup {
        log: KeyPair,
        log_key_hash: Hash,
        witnesses: Vec<KeyPair>,
        cth: CosignedTreeHead,
    }

    fn setup(cosigners: &[usize]) -> Setup {
        let log = KeyPair::from_bytes(&[41; 32]);
        let log_key_hash = key_hash(&log.public());
        let witnesses: Vec<KeyPair> = (0..3u8)
            .map(|i| KeyPair::from_bytes(&[50 + i; 32]))
            .collect();

        let head = TreeHead {
            size: 17,
            root_hash: hash_bytes(b"root"),
        };
        let sth = head.sign(&log, &log_key_hash).unwrap();
        let cosignatures = cosigners
            .iter()
            .map(|&i| sth.cosign(&witnesses[i], &log_key_hash, 100 + i as u64).unwrap())
            .collect();
        Setup {
            log,
            log_key_hash,
            witnesses,
            cth: CosignedTreeHead {
                signed_tree_head: sth,
                cosignatures,
            },
        }
    }

    fn witness_keys(s: &Setup) -> Vec<PublicKey> {
        s.witnesses.iter().map(|w| w.public()).collect()
    }

    #[test]
    fn quorum_larger_than_witness_set_is_rejected() {
        let s = setup(&[]);
        assert!(matches!(
            Policy::k_of_n(&[s.log.public()], &witness_keys(&s), 4),
            Err(PolicyError::QuorumTooLarge { quorum: 4, witnesses: 3 })
        ));
    }

    #[test]
    fn zero_quorum_needs_only_the_log_signature() {
        let s = setup(&[]);
        let policy = Policy::k_of_n(&[s.log.public()], &[], 0).unwrap();
        assert_eq!(
            policy.verify_cosigned_tree_head(&s.log_key_hash, &s.cth),
            Ok(())
        );
    }

    #[test]
    fn two_of_three_with_one_invalid_cosignature() {
        let mut s = setup(&[0, 1, 2]);
        // Corrupt the third cosignature; two valid ones remain.
        s.cth.cosignatures[2].signature[0] ^= 1;
        let policy = Policy::k_of_n(&[s.log.public()], &witness_keys(&s), 2).unwrap();
        assert_eq!(
            policy.verify_cosigned_tree_head(&s.log_key_hash, &s.cth),
            Ok(())
        );
    }

    #[test]
    fn one_valid_cosignature_misses_a_two_quorum() {
        let s = setup(&[1]);
        let policy = Policy::k_of_n(&[s.log.public()], &witness_keys(&s), 2).unwrap();
        assert_eq!(
            policy.verify_cosigned_tree_head(&s.log_key_hash, &s.cth),
            Err(PolicyError::InsufficientCosignatures { need: 2, got: 1 })
        );
    }

    #[test]
    fn full_quorum_requires_every_witness() {
        let s = setup(&[0, 1, 2]);
        let policy = Policy::k_of_n(&[s.log.public()], &witness_keys(&s), 3).unwrap();
        assert_eq!(
            policy.verify_cosigned_tree_head(&s.log_key_hash, &s.cth),
            Ok(())
        );

        let mut partial = s.cth.clone();
        partial.cosignatures.pop();
        assert_eq!(
            policy.verify_cosigned_tree_head(&s.log_key_hash, &partial),
            Err(PolicyError::InsufficientCosignatures { need: 3, got: 2 })
        );
    }

    #[test]
    fn duplicate_cosignatures_count_once() {
        let mut s = setup(&[0]);
        let duplicate = s.cth.cosignatures[0];
        s.cth.cosignatures.push(duplicate);
        let policy = Policy::k_of_n(&[s.log.public()], &witness_keys(&s), 2).unwrap();
        assert_eq!(
            policy.verify_cosigned_tree_head(&s.log_key_hash, &s.cth),
            Err(PolicyError::InsufficientCosignatures { need: 2, got: 1 })
        );
    }

    #[test]
    fn cosignatures_from_unknown_witnesses_are_ignored() {
        let s = setup(&[0]);
        let stranger = KeyPair::from_bytes(&[60; 32]);
        let mut cth = s.cth.clone();
        cth.cosignatures.push(
            cth.signed_tree_head
                .cosign(&stranger, &s.log_key_hash, 200)
                .unwrap(),
        );
        let policy = Policy::k_of_n(&[s.log.public()], &witness_keys(&s), 2).unwrap();
        assert_eq!(
            policy.verify_cosigned_tree_head(&s.log_key_hash, &cth),
            Err(PolicyError::InsufficientCosignatures { need: 2, got: 1 })
        );
    }

    #[test]
    fn unknown_log_is_rejected_before_signature_checks() {
        let s = setup(&[0, 1]);
        let policy = Policy::k_of_n(&[], &witness_keys(&s), 1).unwrap();
        assert_eq!(
            policy.verify_cosigned_tree_head(&s.log_key_hash, &s.cth),
            Err(PolicyError::UnknownLog)
        );
    }

    #[test]
    fn tampered_tree_head_fails_the_log_signature() {
        let mut s = setup(&[0, 1]);
        s.cth.signed_tree_head.tree_head.size += 1;
        let policy = Policy::k_of_n(&[s.log.public()], &witness_keys(&s), 1).unwrap();
        assert_eq!(
            policy.verify_cosigned_tree_head(&s.log_key_hash, &s.cth),
            Err(PolicyError::BadLogSignature)
        );
    }

    #[test]
    fn cosignature_bound_to_other_log_does_not_count() {
        // Witness cosigns the same tree head but for a different log
        // identity; the cosignature must not satisfy this log's policy.
        let s = setup(&[]);
        let other_log_key_hash = hash_bytes(b"other log");
        let mut cth = s.cth.clone();
        cth.cosignatures.push(
            cth.signed_tree_head
                .cosign(&s.witnesses[0], &other_log_key_hash, 300)
                .unwrap(),
        );
        let policy = Policy::k_of_n(&[s.log.public()], &witness_keys(&s), 1).unwrap();
        assert_eq!(
            policy.verify_cosigned_tree_head(&s.log_key_hash, &cth),
            Err(PolicyError::InsufficientCosignatures { need: 1, got: 0 })
        );
    }
}
