use crate::cursor::{Cursor, Writer};
use crate::error::Result;

/// Flag bit announcing the trailing data pair. The pair is never decoded.
pub const HAS_DATA_PAIR: u32 = 1 << 1;

/// `params1` bit marking a semi-transparent material (water and the like).
pub const SEMI_TRANSPARENT: u32 = 0x0000_0004;
/// `params1` bit that must be set for a material to be visible at all.
pub const VISIBLE: u32 = 0x8000_0000;

/// Texture / material reference (fragment 0x30).
///
/// `reference` normally points at a 0x05 fragment, but some files point it
/// straight at a 0x03 fragment or at something unrelated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureReference {
    pub flags: u32,
    pub params1: u32,
    pub params2: u32,
    pub params3: [f32; 2],
    pub reference: i32,
}

impl TextureReference {
    /// Parse the fixed 24-byte body.
    pub fn parse(c: &mut Cursor<'_>) -> Result<Self> {
        let flags = c.read_u32()?;
        let params1 = c.read_u32()?;
        let params2 = c.read_u32()?;
        let params3 = [c.read_f32()?, c.read_f32()?];
        let reference = c.read_i32()?;
        Ok(Self {
            flags,
            params1,
            params2,
            params3,
            reference,
        })
    }

    /// Whether an (unread) data pair follows the fixed body.
    pub fn has_data_pair(&self) -> bool {
        self.flags & HAS_DATA_PAIR != 0
    }

    /// Encode the fixed body. A data pair announced by the flags is written
    /// as zeros.
    pub fn write(&self, w: &mut Writer) {
        w.write_u32(self.flags);
        w.write_u32(self.params1);
        w.write_u32(self.params2);
        w.write_f32(self.params3[0]);
        w.write_f32(self.params3[1]);
        w.write_i32(self.reference);
        if self.has_data_pair() {
            w.write_u32(0);
            w.write_u32(0);
        }
    }
}
