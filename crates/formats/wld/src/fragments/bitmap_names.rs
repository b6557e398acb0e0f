use crate::cursor::{Cursor, Writer};
use crate::error::Result;
use crate::namehash;

/// Texture bitmap file names (fragment 0x03).
///
/// Usually a single file name; each name is XOR-encoded with the name table
/// key and NUL-terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapNames {
    pub names: Vec<String>,
}

impl BitmapNames {
    /// Parse the fragment body.
    ///
    /// A count of zero still describes one entry. When that entry is missing
    /// or empty the fragment yields a single empty name, never zero names.
    pub fn parse(c: &mut Cursor<'_>) -> Result<Self> {
        let count = c.read_i32()?;
        let zero_count = count == 0;
        let count = if zero_count { 1 } else { count.max(0) as usize };

        let mut names = Vec::with_capacity(count.min(c.remaining() / 2));
        for _ in 0..count {
            if zero_count && c.remaining() < 2 {
                break;
            }
            let len = c.read_u16()? as usize;
            if len == 0 {
                continue;
            }
            let encoded = c.read_bytes(len)?;
            names.push(namehash::c_string(&namehash::decode(encoded)));
        }

        if zero_count && names.is_empty() {
            names.push(String::new());
        }
        Ok(Self { names })
    }

    /// The file name used for texturing: the first entry.
    pub fn file_name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    /// Encode the fragment body.
    pub fn write(&self, w: &mut Writer) {
        w.write_i32(self.names.len() as i32);
        for name in &self.names {
            let mut raw = name.as_bytes().to_vec();
            raw.push(0);
            w.write_u16(raw.len() as u16);
            w.write_bytes(&namehash::encode(&raw));
        }
    }
}
