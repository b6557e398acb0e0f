use crate::cursor::{Cursor, Writer};
use crate::error::Result;

/// Texture bitmap info reference (fragment 0x05): points at a 0x04 fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfoReference {
    pub reference: i32,
    pub flags: u32,
}

impl BitmapInfoReference {
    pub fn parse(c: &mut Cursor<'_>) -> Result<Self> {
        let reference = c.read_i32()?;
        let flags = c.read_u32()?;
        Ok(Self { reference, flags })
    }

    pub fn write(&self, w: &mut Writer) {
        w.write_i32(self.reference);
        w.write_u32(self.flags);
    }
}
