//! XOR codec for the WLD name table ("namehash") and other obfuscated strings.
//!
//! The same 8-byte key is restarted at index 0 for every encoded run, so a
//! bitmap file name stored inside a fragment decodes independently of the
//! name table.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Repeating XOR key.
pub const KEY: [u8; 8] = [0x95, 0x3A, 0xC5, 0x2A, 0x95, 0x7A, 0x95, 0x6A];

/// XOR `bytes` with the key in place. Applying it twice restores the input.
pub fn decode_in_place(bytes: &mut [u8]) {
    for (i, b) in bytes.iter_mut().enumerate() {
        *b ^= KEY[i & 7];
    }
}

/// Decoded copy of `bytes`.
pub fn decode(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    decode_in_place(&mut out);
    out
}

/// Encoding is the same operation as decoding.
pub fn encode(bytes: &[u8]) -> Vec<u8> {
    decode(bytes)
}

/// The string up to the first NUL byte.
///
/// A run without any terminator yields the empty string, matching how the
/// format's own tools treat unterminated names.
pub fn c_string(bytes: &[u8]) -> String {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => String::from_utf8_lossy(&bytes[..end]).into_owned(),
        None => String::new(),
    }
}

/// Decoded name table addressed by negative offsets.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    bytes: Vec<u8>,
}

impl NameTable {
    /// Decode a raw (encoded) name table.
    pub fn from_encoded(raw: &[u8]) -> Self {
        Self { bytes: decode(raw) }
    }

    /// Wrap an already decoded table.
    pub fn from_decoded(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Resolve a name reference.
    ///
    /// The reference is a negated byte offset into the table. Offset 0 is the
    /// "no name" sentinel and resolves to the empty string.
    pub fn lookup(&self, name_ref: i32) -> Result<String> {
        let position = -i64::from(name_ref);
        if position == 0 {
            return Ok(String::new());
        }
        if position < 0 || position as usize >= self.bytes.len() {
            return Err(Error::InvalidNameOffset {
                name_ref,
                len: self.bytes.len(),
            });
        }
        Ok(c_string(&self.bytes[position as usize..]))
    }

    /// Iterate all `(name_ref, name)` pairs in table order, skipping the sentinel.
    pub fn iter(&self) -> impl Iterator<Item = (i32, String)> + '_ {
        let mut pos = 0usize;
        std::iter::from_fn(move || {
            while pos < self.bytes.len() {
                let start = pos;
                let end = self.bytes[start..]
                    .iter()
                    .position(|&b| b == 0)
                    .map_or(self.bytes.len(), |n| start + n);
                pos = end + 1;
                if end > start && start > 0 {
                    let name = String::from_utf8_lossy(&self.bytes[start..end]).into_owned();
                    return Some((-(start as i32), name));
                }
            }
            None
        })
    }
}

/// Builds an encoded name table for writing.
#[derive(Debug, Clone)]
pub struct NameTableBuilder {
    bytes: Vec<u8>,
    offsets: HashMap<String, i32>,
}

impl NameTableBuilder {
    /// Start a table with the leading sentinel byte.
    pub fn new() -> Self {
        Self {
            bytes: vec![0],
            offsets: HashMap::new(),
        }
    }

    /// Add a name (or reuse an existing one) and return its reference.
    pub fn add(&mut self, name: &str) -> i32 {
        if let Some(&name_ref) = self.offsets.get(name) {
            return name_ref;
        }
        let name_ref = -(self.bytes.len() as i32);
        self.bytes.extend_from_slice(name.as_bytes());
        self.bytes.push(0);
        self.offsets.insert(name.to_string(), name_ref);
        name_ref
    }

    /// Decoded length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encoded table bytes.
    pub fn finish(&self) -> Vec<u8> {
        encode(&self.bytes)
    }
}

impl Default for NameTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
