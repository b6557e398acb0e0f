use crate::cursor::{Cursor, Writer};
use crate::error::Result;

/// Texture list (fragment 0x31).
///
/// Each entry references a 0x30 fragment; the entry's position is the slot
/// index that mesh polygon runs select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureList {
    pub flags: u32,
    pub references: Vec<i32>,
}

impl TextureList {
    pub fn parse(c: &mut Cursor<'_>) -> Result<Self> {
        let flags = c.read_u32()?;
        let count = c.read_i32()?.max(0) as usize;
        let references = c.read_reference_list(count)?;
        Ok(Self { flags, references })
    }

    /// Reference stored in `slot`.
    pub fn slot(&self, slot: usize) -> Option<i32> {
        self.references.get(slot).copied()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn write(&self, w: &mut Writer) {
        w.write_u32(self.flags);
        w.write_i32(self.references.len() as i32);
        for r in &self.references {
            w.write_i32(*r);
        }
    }
}
