use crate::cursor::{Cursor, Writer};
use crate::error::Result;

/// Flag bit announcing the optional `params1` word (current frame).
pub const HAS_PARAMS1: u32 = 1 << 2;
/// Flag bit announcing the optional `params2` word (frame delay in ms).
pub const HAS_PARAMS2: u32 = 1 << 3;

/// Texture bitmap info (fragment 0x04): the ordered frames of a sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapInfo {
    pub flags: u32,
    pub params1: Option<u32>,
    pub params2: Option<u32>,
    /// References to 0x03 fragments in animation order.
    pub references: Vec<i32>,
}

impl BitmapInfo {
    pub fn parse(c: &mut Cursor<'_>) -> Result<Self> {
        let flags = c.read_u32()?;
        let count = c.read_i32()?.max(0) as usize;
        let params1 = if flags & HAS_PARAMS1 != 0 {
            Some(c.read_u32()?)
        } else {
            None
        };
        let params2 = if flags & HAS_PARAMS2 != 0 {
            Some(c.read_u32()?)
        } else {
            None
        };
        let references = c.read_reference_list(count)?;
        Ok(Self {
            flags,
            params1,
            params2,
            references,
        })
    }

    /// Delay between animation frames, when the fragment carries one.
    pub fn frame_delay(&self) -> Option<u32> {
        self.params2
    }

    pub fn is_animated(&self) -> bool {
        self.references.len() > 1
    }

    /// Encode the fragment body. The optional words are written when present,
    /// and the corresponding flag bits are set to match.
    pub fn write(&self, w: &mut Writer) {
        let mut flags = self.flags & !(HAS_PARAMS1 | HAS_PARAMS2);
        if self.params1.is_some() {
            flags |= HAS_PARAMS1;
        }
        if self.params2.is_some() {
            flags |= HAS_PARAMS2;
        }
        w.write_u32(flags);
        w.write_i32(self.references.len() as i32);
        if let Some(p) = self.params1 {
            w.write_u32(p);
        }
        if let Some(p) = self.params2 {
            w.write_u32(p);
        }
        for r in &self.references {
            w.write_i32(*r);
        }
    }
}
