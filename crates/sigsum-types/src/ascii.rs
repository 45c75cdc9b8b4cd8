//! Line-oriented ASCII wire codec
//!
//! Every Sigsum request, response and proof artifact is a sequence of
//! `key=value` lines: lowercase hex for byte fields, decimal for unsigned
//! integers, LF terminators, no trailing whitespace. The [`Parser`]
//! consumes lines in a fixed key order; repeated fields are read by
//! peeking at the next key.

use crate::error::{Error, Result};
use sigsum_crypto::{Hash, PublicKey, Signature};

/// Parser over a complete ASCII document.
#[derive(Debug)]
pub struct Parser<'a> {
    rest: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn next_line(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        match self.rest.find('\n') {
            Some(i) => {
                let line = &self.rest[..i];
                self.rest = &self.rest[i + 1..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = "";
                Some(line)
            }
        }
    }

    /// Key of the next line, if any. Used to detect the end of a run of
    /// repeated fields without consuming the line that follows them.
    pub fn peek_key(&self) -> Option<&'a str> {
        let line = self.rest.lines().next()?;
        line.split_once('=').map(|(key, _)| key)
    }

    /// Consume the next line, which must carry exactly `key`.
    pub fn next_value(&mut self, key: &'static str) -> Result<&'a str> {
        let line = self.next_line().ok_or(Error::UnexpectedEof(key))?;
        let (got, value) = line
            .split_once('=')
            .ok_or_else(|| Error::MalformedLine(line.to_string()))?;
        if got != key {
            return Err(Error::UnexpectedKey {
                want: key,
                got: got.to_string(),
            });
        }
        Ok(value)
    }

    pub fn get_int(&mut self, key: &'static str) -> Result<u64> {
        parse_int(key, self.next_value(key)?)
    }

    pub fn get_hash(&mut self, key: &'static str) -> Result<Hash> {
        let value = self.next_value(key)?;
        sigsum_crypto::hash_from_hex(value).map_err(|e| invalid(key, e))
    }

    pub fn get_public_key(&mut self, key: &'static str) -> Result<PublicKey> {
        let value = self.next_value(key)?;
        sigsum_crypto::public_key_from_hex(value).map_err(|e| invalid(key, e))
    }

    pub fn get_signature(&mut self, key: &'static str) -> Result<Signature> {
        let value = self.next_value(key)?;
        sigsum_crypto::signature_from_hex(value).map_err(|e| invalid(key, e))
    }

    /// Read a line whose value is exactly `n` space-separated fields.
    pub fn get_values(&mut self, key: &'static str, n: usize) -> Result<Vec<&'a str>> {
        let value = self.next_value(key)?;
        let values: Vec<&str> = value.split(' ').collect();
        if values.len() != n {
            return Err(Error::ValueCount {
                want: n,
                got: values.len(),
                key,
            });
        }
        Ok(values)
    }

    /// Require that the whole document has been consumed.
    pub fn get_eof(&mut self) -> Result<()> {
        match self.next_line() {
            None => Ok(()),
            Some(_) => Err(Error::TrailingInput),
        }
    }
}

/// Parse a canonical decimal integer: digits only, no sign, no spaces.
pub fn parse_int(key: &'static str, value: &str) -> Result<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidValue {
            key,
            reason: format!("not a decimal integer: {value:?}"),
        });
    }
    value.parse().map_err(|e| Error::InvalidValue {
        key,
        reason: format!("{e}"),
    })
}

pub(crate) fn invalid(key: &'static str, err: sigsum_crypto::Error) -> Error {
    Error::InvalidValue {
        key,
        reason: err.to_string(),
    }
}

/// Write a `key=<decimal>` line.
pub fn write_int(out: &mut String, key: &str, value: u64) {
    out.push_str(key);
    out.push('=');
    out.push_str(&value.to_string());
    out.push('\n');
}

/// Write a `key=<lowercase hex>` line.
pub fn write_hex(out: &mut String, key: &str, value: &[u8]) {
    out.push_str(key);
    out.push('=');
    out.push_str(&hex::encode(value));
    out.push('\n');
}
