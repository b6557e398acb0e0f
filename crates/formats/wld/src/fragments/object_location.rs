use crate::cursor::{Cursor, Writer};
use crate::error::Result;

/// Rotation units per full turn.
pub const ROTATION_UNITS: f32 = 512.0;

/// Object location (fragment 0x15): one placed instance of a model.
///
/// `model_ref` is a name reference to the model's 0x14 fragment name, not a
/// fragment reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectLocation {
    pub model_ref: i32,
    pub flags: u32,
    pub fragment1: i32,
    pub position: [f32; 3],
    /// Stored order, in 1/512ths of a turn.
    pub rotation: [f32; 3],
    /// Stored order. The first word is unused by placed objects; the second
    /// scales both horizontal axes and the third the vertical one.
    pub scale: [f32; 3],
    /// Vertex color reference. Absent in short fragments.
    pub color_reference: Option<i32>,
    pub params2: Option<u32>,
}

impl ObjectLocation {
    pub fn parse(c: &mut Cursor<'_>) -> Result<Self> {
        let model_ref = c.read_i32()?;
        let flags = c.read_u32()?;
        let fragment1 = c.read_i32()?;
        let position = [c.read_f32()?, c.read_f32()?, c.read_f32()?];
        let rotation = [c.read_f32()?, c.read_f32()?, c.read_f32()?];
        let scale = [c.read_f32()?, c.read_f32()?, c.read_f32()?];
        let color_reference = if c.remaining() >= 4 {
            Some(c.read_i32()?)
        } else {
            None
        };
        let params2 = if c.remaining() >= 4 {
            Some(c.read_u32()?)
        } else {
            None
        };
        Ok(Self {
            model_ref,
            flags,
            fragment1,
            position,
            rotation,
            scale,
            color_reference,
            params2,
        })
    }

    pub fn rotation_degrees(&self) -> [f32; 3] {
        self.rotation.map(|r| r / ROTATION_UNITS * 360.0)
    }

    /// Scale applied to the model: `scale[1]` on both horizontal axes,
    /// `scale[2]` vertically.
    pub fn effective_scale(&self) -> [f32; 3] {
        [self.scale[1], self.scale[1], self.scale[2]]
    }

    pub fn write(&self, w: &mut Writer) {
        w.write_i32(self.model_ref);
        w.write_u32(self.flags);
        w.write_i32(self.fragment1);
        for v in self.position.iter().chain(&self.rotation).chain(&self.scale) {
            w.write_f32(*v);
        }
        // params2 cannot be written without a color reference before it
        if self.color_reference.is_some() || self.params2.is_some() {
            w.write_i32(self.color_reference.unwrap_or(0));
        }
        if let Some(p) = self.params2 {
            w.write_u32(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(tail: &[u32]) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_i32(-14);
        w.write_u32(0x2E);
        w.write_i32(0);
        for v in [10.0, -20.0, 5.5, 128.0, 0.0, 256.0, 0.0, 1.5, 2.0] {
            w.write_f32(v);
        }
        for t in tail {
            w.write_u32(*t);
        }
        w.into_bytes()
    }

    #[test]
    fn full_body() {
        let data = body(&[7, 0x99]);
        let loc = ObjectLocation::parse(&mut Cursor::new(&data)).unwrap();
        assert_eq!(loc.model_ref, -14);
        assert_eq!(loc.position, [10.0, -20.0, 5.5]);
        assert_eq!(loc.rotation_degrees(), [90.0, 0.0, 180.0]);
        assert_eq!(loc.effective_scale(), [1.5, 1.5, 2.0]);
        assert_eq!(loc.color_reference, Some(7));
        assert_eq!(loc.params2, Some(0x99));
    }

    #[test]
    fn short_body_has_no_tail() {
        let data = body(&[]);
        let mut c = Cursor::new(&data);
        let loc = ObjectLocation::parse(&mut c).unwrap();
        assert!(c.is_empty());
        assert_eq!(loc.color_reference, None);
        assert_eq!(loc.params2, None);

        let mut w = Writer::new();
        loc.write(&mut w);
        assert_eq!(w.into_bytes(), data);
    }
}
