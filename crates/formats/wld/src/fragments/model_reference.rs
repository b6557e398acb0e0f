use crate::cursor::{Cursor, Writer};
use crate::error::Result;

/// Flag bit announcing the optional `params1` word.
pub const HAS_PARAMS1: u32 = 1 << 0;
/// Flag bit announcing the optional seven-word `params2` block.
pub const HAS_PARAMS2: u32 = 1 << 1;

/// Static or animated model reference (fragment 0x14).
///
/// For a static model the first entry of `references` points at a 0x2D mesh
/// reference; animated models point at a skeleton track instead. The trailing
/// name block is not decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReference {
    pub flags: u32,
    pub fragment1: i32,
    pub fragment2: i32,
    pub params1: Option<u32>,
    pub params2: Option<[u32; 7]>,
    /// Per-entry `(u32, f32)` pairs.
    pub entries: Vec<Vec<(u32, f32)>>,
    pub references: Vec<i32>,
}

impl ModelReference {
    pub fn parse(c: &mut Cursor<'_>) -> Result<Self> {
        let flags = c.read_u32()?;
        let fragment1 = c.read_i32()?;
        let entry_count = c.read_u32()? as usize;
        let reference_count = c.read_u32()? as usize;
        let fragment2 = c.read_i32()?;

        let params1 = if flags & HAS_PARAMS1 != 0 {
            Some(c.read_u32()?)
        } else {
            None
        };
        let params2 = if flags & HAS_PARAMS2 != 0 {
            let mut block = [0u32; 7];
            for word in &mut block {
                *word = c.read_u32()?;
            }
            Some(block)
        } else {
            None
        };

        let mut entries = Vec::with_capacity(entry_count.min(c.remaining() / 4));
        for _ in 0..entry_count {
            let pairs = c.read_u32()? as usize;
            let mut entry = Vec::with_capacity(pairs.min(c.remaining() / 8));
            for _ in 0..pairs {
                entry.push((c.read_u32()?, c.read_f32()?));
            }
            entries.push(entry);
        }
        let references = c.read_reference_list(reference_count)?;

        Ok(Self {
            flags,
            fragment1,
            fragment2,
            params1,
            params2,
            entries,
            references,
        })
    }

    /// The reference a static model's mesh is found through.
    pub fn mesh_reference(&self) -> Option<i32> {
        self.references.first().copied()
    }

    /// Encode the body with an empty name block.
    pub fn write(&self, w: &mut Writer) {
        let mut flags = self.flags & !(HAS_PARAMS1 | HAS_PARAMS2);
        if self.params1.is_some() {
            flags |= HAS_PARAMS1;
        }
        if self.params2.is_some() {
            flags |= HAS_PARAMS2;
        }
        w.write_u32(flags);
        w.write_i32(self.fragment1);
        w.write_u32(self.entries.len() as u32);
        w.write_u32(self.references.len() as u32);
        w.write_i32(self.fragment2);
        if let Some(p) = self.params1 {
            w.write_u32(p);
        }
        if let Some(block) = self.params2 {
            for word in block {
                w.write_u32(word);
            }
        }
        for entry in &self.entries {
            w.write_u32(entry.len() as u32);
            for &(a, b) in entry {
                w.write_u32(a);
                w.write_f32(b);
            }
        }
        for r in &self.references {
            w.write_i32(*r);
        }
        w.write_u32(0);
    }
}
