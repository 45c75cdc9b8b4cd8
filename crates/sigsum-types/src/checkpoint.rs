//! Checkpoints and the signed-note signature lines
//!
//! Cosignatures travel inside a signed note (a "checkpoint"): a text body
//! naming the log by origin, a blank line, then one signature line per
//! signer. Each line is `— <key name> <base64(key_id || blob)>` with an
//! em dash, where the blob is 64 bytes for an Ed25519 log signature and
//! 72 bytes (`timestamp_be64 || signature`) for a witness cosignature.

use base64::Engine;

use crate::ascii::Parser;
use crate::error::{Error, Result};
use crate::tree_head::{Cosignature, SignedTreeHead, TreeHead};
use sigsum_crypto::{hash_bytes, key_hash, PublicKey, Signature, SIGNATURE_SIZE};

const SIG_TYPE_ED25519: u8 = 0x01;
const SIG_TYPE_COSIGNATURE: u8 = 0x04;

/// Four-byte hint identifying a signer within a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyId(pub [u8; 4]);

fn make_key_id(key_name: &str, sig_type: u8, public_key: &PublicKey) -> KeyId {
    let mut data = Vec::with_capacity(key_name.len() + 2 + public_key.len());
    data.extend_from_slice(key_name.as_bytes());
    data.push(0x0A);
    data.push(sig_type);
    data.extend_from_slice(public_key);
    let hash = hash_bytes(&data);
    KeyId([hash[0], hash[1], hash[2], hash[3]])
}

/// Key id for a log signing checkpoints under `key_name`.
pub fn log_key_id(key_name: &str, public_key: &PublicKey) -> KeyId {
    make_key_id(key_name, SIG_TYPE_ED25519, public_key)
}

/// Key id for a witness cosigning under `key_name`.
pub fn witness_key_id(key_name: &str, public_key: &PublicKey) -> KeyId {
    make_key_id(key_name, SIG_TYPE_COSIGNATURE, public_key)
}

fn write_note_signature(out: &mut String, key_name: &str, key_id: &KeyId, signature: &[u8]) {
    let mut blob = Vec::with_capacity(key_id.0.len() + signature.len());
    blob.extend_from_slice(&key_id.0);
    blob.extend_from_slice(signature);
    out.push_str("\u{2014} ");
    out.push_str(key_name);
    out.push(' ');
    out.push_str(&base64::engine::general_purpose::STANDARD.encode(blob));
    out.push('\n');
}

// Input is a single signature line with no trailing newline. Returns key
// name, key id and the decoded signature blob. A blob of the wrong size
// for this signature type is an unwanted (skippable) signature, not
// corruption.
fn parse_note_signature(line: &str, signature_size: usize) -> Result<(&str, KeyId, Vec<u8>)> {
    let fields: Vec<&str> = line.split(' ').collect();
    if fields.len() != 3 || fields[0] != "\u{2014}" {
        return Err(Error::MalformedLine(line.to_string()));
    }
    let blob = base64::engine::general_purpose::STANDARD
        .decode(fields[2])
        .map_err(|_| Error::MalformedLine(line.to_string()))?;
    if blob.len() != 4 + signature_size {
        return Err(Error::UnwantedSignature);
    }
    let key_id = KeyId([blob[0], blob[1], blob[2], blob[3]]);
    Ok((fields[1], key_id, blob[4..].to_vec()))
}

/// Write a log's Ed25519 signature line.
pub fn write_ed25519_signature(
    out: &mut String,
    origin: &str,
    key_id: &KeyId,
    signature: &Signature,
) {
    write_note_signature(out, origin, key_id, signature);
}

/// Parse a single signature line carrying an Ed25519 log signature under
/// `key_name`. Returns [`Error::UnwantedSignature`] for a line that is
/// syntactically valid but belongs to some other signer or signature
/// type; callers skip those and try the next line.
pub fn parse_ed25519_signature_line(line: &str, key_name: &str) -> Result<(KeyId, Signature)> {
    let (name, key_id, blob) = parse_note_signature(line, SIGNATURE_SIZE)?;
    if name != key_name {
        return Err(Error::UnwantedSignature);
    }
    let mut signature = [0u8; SIGNATURE_SIZE];
    signature.copy_from_slice(&blob);
    Ok((key_id, signature))
}

/// Write a witness cosignature line.
pub fn write_cosignature(
    out: &mut String,
    key_name: &str,
    key_id: &KeyId,
    timestamp: u64,
    signature: &Signature,
) {
    let mut blob = Vec::with_capacity(8 + SIGNATURE_SIZE);
    blob.extend_from_slice(&timestamp.to_be_bytes());
    blob.extend_from_slice(signature);
    write_note_signature(out, key_name, key_id, &blob);
}

/// Look for a cosignature by a particular witness key. The key name on
/// the line is only used to match the key id. Does not verify the
/// signature.
pub fn parse_cosignature(line: &str, public_key: &PublicKey) -> Result<Cosignature> {
    let (name, key_id, blob) = parse_note_signature(line, 8 + SIGNATURE_SIZE)?;
    if key_id != witness_key_id(name, public_key) {
        return Err(Error::UnwantedSignature);
    }
    let mut timestamp = [0u8; 8];
    timestamp.copy_from_slice(&blob[..8]);
    let mut signature = [0u8; SIGNATURE_SIZE];
    signature.copy_from_slice(&blob[8..]);
    Ok(Cosignature {
        key_hash: key_hash(public_key),
        timestamp: u64::from_be_bytes(timestamp),
        signature,
    })
}

/// A signed tree head in checkpoint (signed note) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub origin: String,
    pub key_id: KeyId,
    pub signed_tree_head: SignedTreeHead,
}

impl Checkpoint {
    pub fn new(origin: &str, log_public_key: &PublicKey, signed_tree_head: SignedTreeHead) -> Self {
        Self {
            origin: origin.to_string(),
            key_id: log_key_id(origin, log_public_key),
            signed_tree_head,
        }
    }

    /// The note body plus the log's signature line. Witnesses append
    /// their own lines with [`write_cosignature`].
    pub fn to_ascii(&self) -> String {
        let mut out = self
            .signed_tree_head
            .tree_head
            .to_checkpoint_body(&self.origin);
        out.push('\n');
        write_ed25519_signature(
            &mut out,
            &self.origin,
            &self.key_id,
            &self.signed_tree_head.signature,
        );
        out
    }

    /// Parse a checkpoint, locating the log's signature line by key name
    /// and key id. Foreign signature lines are skipped.
    pub fn from_ascii(input: &str, log_public_key: &PublicKey) -> Result<Self> {
        let (body, signatures) = split_note(input)?;

        let mut lines = body.lines();
        let origin = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or(Error::UnexpectedEof("origin"))?
            .to_string();
        let rest = &body[origin.len() + 1..];
        let mut p = Parser::new(rest);
        let tree_head = TreeHead::parse(&mut p)?;
        p.get_eof()?;

        let want_key_id = log_key_id(&origin, log_public_key);
        for line in signatures.lines() {
            let (key_id, signature) = match parse_ed25519_signature_line(line, &origin) {
                Ok(parsed) => parsed,
                Err(Error::UnwantedSignature) => continue,
                Err(err) => return Err(err),
            };
            if key_id != want_key_id {
                continue;
            }
            return Ok(Self {
                origin,
                key_id,
                signed_tree_head: SignedTreeHead {
                    tree_head,
                    signature,
                },
            });
        }
        Err(Error::MissingSignature)
    }

    /// Collect this witness's cosignatures from a checkpoint's signature
    /// lines. Does not verify them.
    pub fn cosignatures(input: &str, witness_public_key: &PublicKey) -> Result<Vec<Cosignature>> {
        let (_, signatures) = split_note(input)?;
        let mut found = Vec::new();
        for line in signatures.lines() {
            match parse_cosignature(line, witness_public_key) {
                Ok(cs) => found.push(cs),
                Err(Error::UnwantedSignature) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(found)
    }
}

fn split_note(input: &str) -> Result<(&str, &str)> {
    let i = input
        .find("\n\n")
        .ok_or(Error::UnexpectedEof("signature lines"))?;
    Ok((&input[..i + 1], &input[i + 2..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree_head::tree_origin;
    use sigsum_crypto::{KeyPair, Signer};

    fn test_checkpoint() -> (Checkpoint, KeyPair, sigsum_crypto::Hash) {
        let log = KeyPair::from_bytes(&[31; 32]);
        let log_key_hash = key_hash(&log.public());
        let head = TreeHead {
            size: 42,
            root_hash: hash_bytes(b"root"),
        };
        let sth = head.sign(&log, &log_key_hash).unwrap();
        let origin = tree_origin(&log_key_hash);
        (
            Checkpoint::new(&origin, &log.public(), sth),
            log,
            log_key_hash,
        )
    }

    #[test]
    fn key_ids_distinguish_signature_types() {
        let key = KeyPair::from_bytes(&[32; 32]).public();
        assert_ne!(log_key_id("example.org/log", &key), witness_key_id("example.org/log", &key));
        assert_ne!(log_key_id("a", &key), log_key_id("b", &key));
    }

    #[test]
    fn checkpoint_roundtrip() {
        let (cp, log, _) = test_checkpoint();
        let text = cp.to_ascii();
        // body, blank separator, one signature line
        assert_eq!(text.matches('\n').count(), 5);
        assert!(text.contains("\n\n\u{2014} "));
        assert_eq!(Checkpoint::from_ascii(&text, &log.public()).unwrap(), cp);
    }

    #[test]
    fn foreign_signature_lines_are_skipped() {
        let (cp, log, _) = test_checkpoint();

        // Rebuild the note with a syntactically valid line from an
        // unrelated signer ahead of the log's own line.
        let other = KeyPair::from_bytes(&[33; 32]);
        let mut text = cp.signed_tree_head.tree_head.to_checkpoint_body(&cp.origin);
        text.push('\n');
        write_ed25519_signature(
            &mut text,
            "example.org/other-log",
            &log_key_id("example.org/other-log", &other.public()),
            &other.sign(b"something else").unwrap(),
        );
        write_ed25519_signature(
            &mut text,
            &cp.origin,
            &cp.key_id,
            &cp.signed_tree_head.signature,
        );
        assert_eq!(Checkpoint::from_ascii(&text, &log.public()).unwrap(), cp);
    }

    #[test]
    fn missing_log_signature_is_an_error() {
        let (cp, _, _) = test_checkpoint();
        let wrong_key = KeyPair::from_bytes(&[34; 32]);
        assert!(matches!(
            Checkpoint::from_ascii(&cp.to_ascii(), &wrong_key.public()),
            Err(Error::MissingSignature)
        ));
    }

    #[test]
    fn cosignature_line_roundtrip() {
        let (cp, _, log_key_hash) = test_checkpoint();
        let witness = KeyPair::from_bytes(&[35; 32]);
        let cosignature = cp
            .signed_tree_head
            .cosign(&witness, &log_key_hash, 1234567890)
            .unwrap();

        let mut text = cp.to_ascii();
        write_cosignature(
            &mut text,
            "example.org/witness",
            &witness_key_id("example.org/witness", &witness.public()),
            cosignature.timestamp,
            &cosignature.signature,
        );

        let found = Checkpoint::cosignatures(&text, &witness.public()).unwrap();
        assert_eq!(found, vec![cosignature]);
        assert!(found[0].verify(
            &witness.public(),
            &log_key_hash,
            &cp.signed_tree_head.tree_head
        ));

        // A different witness key matches nothing.
        let other = KeyPair::from_bytes(&[36; 32]);
        assert!(Checkpoint::cosignatures(&text, &other.public())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn wrong_size_blob_is_unwanted_not_fatal() {
        // An Ed25519-sized blob is not a cosignature and vice versa.
        let key = KeyPair::from_bytes(&[37; 32]);
        let mut line = String::new();
        write_ed25519_signature(
            &mut line,
            "example.org/log",
            &log_key_id("example.org/log", &key.public()),
            &[0u8; 64],
        );
        let line = line.trim_end();
        assert!(matches!(
            parse_cosignature(line, &key.public()),
            Err(Error::UnwantedSignature)
        ));
        assert!(matches!(
            parse_ed25519_signature_line(line, "example.org/other"),
            Err(Error::UnwantedSignature)
        ));
        assert!(matches!(
            parse_ed25519_signature_line("not a signature line", "x"),
            Err(Error::MalformedLine(_))
        ));
    }
}
