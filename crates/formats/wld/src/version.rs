/// WLD format version from the file header.
///
/// Known versions:
/// - v1 (`0x00015500`): classic zones; mesh UVs stored as `i16` pairs
/// - v2 (`0x1000C800`): later zones; mesh UVs stored as `f32` pairs
///
/// The low bit of the raw header word is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum WldVersion {
    V1,
    V2,
}

impl WldVersion {
    pub const RAW_V1: u32 = 0x0001_5500;
    pub const RAW_V2: u32 = 0x1000_C800;

    /// Mask applied to the header word before comparing.
    pub const MASK: u32 = 0xFFFF_FFFE;

    /// Classify a raw header version word.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw & Self::MASK {
            Self::RAW_V1 => Some(Self::V1),
            Self::RAW_V2 => Some(Self::V2),
            _ => None,
        }
    }

    /// Canonical header word for this version.
    pub fn raw(self) -> u32 {
        match self {
            Self::V1 => Self::RAW_V1,
            Self::V2 => Self::RAW_V2,
        }
    }

    /// Whether mesh texture coordinates are stored as `f32` pairs (with V negated)
    /// rather than `i16` pairs in 1/256 units.
    pub fn has_float_uvs(self) -> bool {
        matches!(self, Self::V2)
    }
}

impl std::fmt::Display for WldVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}
