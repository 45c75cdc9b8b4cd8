//! The subset of OpenSSH wire formats that Sigsum signatures use
//!
//! Sigsum signatures never sign raw messages. The signed bytes are an
//! SSH signature envelope (the `SSHSIG` blob from OpenSSH's sshsig
//! protocol) carrying a namespace string for domain separation and the
//! SHA-256 of the actual message. Public keys are accepted in the
//! single-line `ssh-ed25519` format.

use base64::Engine;

use crate::{hash_bytes, Error, PublicKey, Result, PUBLIC_KEY_SIZE};

const MAGIC_PREAMBLE: &[u8] = b"SSHSIG";
const KEY_TYPE_ED25519: &[u8] = b"ssh-ed25519";

fn put_string(buf: &mut Vec<u8>, s: &[u8]) {
    buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
    buf.extend_from_slice(s);
}

/// The bytes that are actually signed: an `SSHSIG` envelope binding the
/// namespace and the SHA-256 of `msg`.
pub fn signed_data(namespace: &str, msg: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAGIC_PREAMBLE.len() + namespace.len() + 64);
    buf.extend_from_slice(MAGIC_PREAMBLE);
    put_string(&mut buf, namespace.as_bytes());
    put_string(&mut buf, b""); // reserved
    put_string(&mut buf, b"sha256");
    put_string(&mut buf, &hash_bytes(msg));
    buf
}

fn get_string<'a>(blob: &mut &'a [u8]) -> Result<&'a [u8]> {
    if blob.len() < 4 {
        return Err(Error::InvalidKey);
    }
    let (len, rest) = blob.split_at(4);
    let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize;
    if rest.len() < len {
        return Err(Error::InvalidKey);
    }
    let (s, rest) = rest.split_at(len);
    *blob = rest;
    Ok(s)
}

/// Parse a single-line OpenSSH `ssh-ed25519` public key, with or without a
/// trailing comment.
pub fn parse_public_ed25519(line: &str) -> Result<PublicKey> {
    let mut fields = line.trim().split_ascii_whitespace();
    if fields.next() != Some("ssh-ed25519") {
        return Err(Error::InvalidKey);
    }
    let blob = base64::engine::general_purpose::STANDARD
        .decode(fields.next().ok_or(Error::InvalidKey)?)
        .map_err(|_| Error::InvalidKey)?;

    let mut rest = blob.as_slice();
    if get_string(&mut rest)? != KEY_TYPE_ED25519 {
        return Err(Error::InvalidKey);
    }
    let key = get_string(&mut rest)?;
    if !rest.is_empty() {
        return Err(Error::InvalidKey);
    }
    key.try_into().map_err(|_| Error::Length {
        want: PUBLIC_KEY_SIZE,
        got: key.len(),
    })
}

/// Format a public key as a single-line OpenSSH `ssh-ed25519` key.
pub fn format_public_ed25519(public_key: &PublicKey) -> String {
    let mut blob = Vec::with_capacity(4 + KEY_TYPE_ED25519.len() + 4 + PUBLIC_KEY_SIZE);
    put_string(&mut blob, KEY_TYPE_ED25519);
    put_string(&mut blob, public_key);
    format!(
        "ssh-ed25519 {}",
        base64::engine::general_purpose::STANDARD.encode(blob)
    )
}
