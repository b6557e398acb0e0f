use crate::cursor::{Cursor, Writer};
use crate::error::Result;

/// Mesh reference (fragment 0x2D): points a model at its 0x36 mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshReference {
    pub reference: i32,
    pub flags: u32,
}

impl MeshReference {
    pub fn parse(c: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            reference: c.read_i32()?,
            flags: c.read_u32()?,
        })
    }

    pub fn write(&self, w: &mut Writer) {
        w.write_i32(self.reference);
        w.write_u32(self.flags);
    }
}
