//! Typed decoders for the fragment kinds the material and placeable graphs
//! need.
//!
//! Every other type code is kept as [`FragmentBody::Unknown`] so fragment ids
//! stay dense and references keep resolving.

pub mod bitmap_info;
pub mod bitmap_info_reference;
pub mod bitmap_names;
pub mod mesh;
pub mod mesh_reference;
pub mod model_reference;
pub mod object_location;
pub mod texture_list;
pub mod texture_reference;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::reader::FragmentEntry;
use crate::version::WldVersion;

pub use bitmap_info::BitmapInfo;
pub use bitmap_info_reference::BitmapInfoReference;
pub use bitmap_names::BitmapNames;
pub use mesh::{Mesh, PolyGroup, PolygonRun};
pub use mesh_reference::MeshReference;
pub use model_reference::ModelReference;
pub use object_location::ObjectLocation;
pub use texture_list::TextureList;
pub use texture_reference::TextureReference;

/// The decoded fragment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum FragmentKind {
    BitmapNames,
    BitmapInfo,
    BitmapInfoReference,
    ModelReference,
    ObjectLocation,
    MeshReference,
    TextureReference,
    TextureList,
    Mesh,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 9] = [
        Self::BitmapNames,
        Self::BitmapInfo,
        Self::BitmapInfoReference,
        Self::ModelReference,
        Self::ObjectLocation,
        Self::MeshReference,
        Self::TextureReference,
        Self::TextureList,
        Self::Mesh,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x03 => Some(Self::BitmapNames),
            0x04 => Some(Self::BitmapInfo),
            0x05 => Some(Self::BitmapInfoReference),
            0x14 => Some(Self::ModelReference),
            0x15 => Some(Self::ObjectLocation),
            0x2D => Some(Self::MeshReference),
            0x30 => Some(Self::TextureReference),
            0x31 => Some(Self::TextureList),
            0x36 => Some(Self::Mesh),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::BitmapNames => 0x03,
            Self::BitmapInfo => 0x04,
            Self::BitmapInfoReference => 0x05,
            Self::ModelReference => 0x14,
            Self::ObjectLocation => 0x15,
            Self::MeshReference => 0x2D,
            Self::TextureReference => 0x30,
            Self::TextureList => 0x31,
            Self::Mesh => 0x36,
        }
    }
}

/// Human-readable name of a fragment type code, decoded or not.
pub fn type_name(code: u32) -> &'static str {
    match code {
        0x03 => "bitmap names",
        0x04 => "bitmap info",
        0x05 => "bitmap info reference",
        0x06 => "2d object",
        0x07 => "2d object reference",
        0x08 => "camera",
        0x09 => "camera reference",
        0x10 => "skeleton track set",
        0x11 => "skeleton track set reference",
        0x12 => "skeleton piece track",
        0x13 => "skeleton piece track reference",
        0x14 => "model reference",
        0x15 => "object location",
        0x16 => "zone unknown",
        0x17 => "polygon animation",
        0x18 => "polygon animation reference",
        0x1B => "light source",
        0x1C => "light source reference",
        0x21 => "bsp tree",
        0x22 => "bsp region",
        0x28 => "light info",
        0x29 => "region flag",
        0x2A => "ambient light",
        0x2C => "alternate mesh",
        0x2D => "mesh reference",
        0x2F => "mesh animated vertices reference",
        0x30 => "texture reference",
        0x31 => "texture list",
        0x32 => "vertex color",
        0x33 => "vertex color reference",
        0x35 => "first fragment",
        0x36 => "mesh",
        0x37 => "mesh animated vertices",
        _ => "unknown",
    }
}

/// Decoded fragment payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentBody {
    BitmapNames(BitmapNames),
    BitmapInfo(BitmapInfo),
    BitmapInfoReference(BitmapInfoReference),
    ModelReference(ModelReference),
    ObjectLocation(ObjectLocation),
    MeshReference(MeshReference),
    TextureReference(TextureReference),
    TextureList(TextureList),
    Mesh(Box<Mesh>),
    /// A type code with no decoder. Kept for id continuity.
    Unknown,
}

/// One fragment of a WLD document.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Position in the file, 0-based.
    pub id: usize,
    pub type_code: u32,
    pub name_ref: i32,
    /// Absolute offset of the fragment header.
    pub offset: usize,
    /// Declared length from the fragment header.
    pub length: i32,
    pub body: FragmentBody,
}

impl Fragment {
    pub fn kind(&self) -> Option<FragmentKind> {
        FragmentKind::from_code(self.type_code)
    }

    /// The positive reference that addresses this fragment.
    pub fn reference(&self) -> i32 {
        self.id as i32 + 1
    }

    pub fn type_name(&self) -> &'static str {
        type_name(self.type_code)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.body, FragmentBody::Unknown)
    }

    pub fn as_bitmap_names(&self) -> Option<&BitmapNames> {
        match &self.body {
            FragmentBody::BitmapNames(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_bitmap_info(&self) -> Option<&BitmapInfo> {
        match &self.body {
            FragmentBody::BitmapInfo(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_bitmap_info_reference(&self) -> Option<&BitmapInfoReference> {
        match &self.body {
            FragmentBody::BitmapInfoReference(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_model_reference(&self) -> Option<&ModelReference> {
        match &self.body {
            FragmentBody::ModelReference(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object_location(&self) -> Option<&ObjectLocation> {
        match &self.body {
            FragmentBody::ObjectLocation(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_mesh_reference(&self) -> Option<&MeshReference> {
        match &self.body {
            FragmentBody::MeshReference(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_texture_reference(&self) -> Option<&TextureReference> {
        match &self.body {
            FragmentBody::TextureReference(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_texture_list(&self) -> Option<&TextureList> {
        match &self.body {
            FragmentBody::TextureList(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.body {
            FragmentBody::Mesh(f) => Some(&**f),
            _ => None,
        }
    }
}

/// Decode the body of `entry`.
///
/// The cursor is bounded at the fragment's end, so a decoder that overruns
/// its own fragment fails instead of reading the next one.
pub fn decode_body(entry: &FragmentEntry, data: &[u8], version: WldVersion) -> Result<FragmentBody> {
    let Some(kind) = FragmentKind::from_code(entry.type_code) else {
        return Ok(FragmentBody::Unknown);
    };
    let end = entry.end().min(data.len());
    let mut c = Cursor::at_offset(&data[..end], entry.body_offset());

    let body = match kind {
        FragmentKind::BitmapNames => BitmapNames::parse(&mut c).map(FragmentBody::BitmapNames),
        FragmentKind::BitmapInfo => BitmapInfo::parse(&mut c).map(FragmentBody::BitmapInfo),
        FragmentKind::BitmapInfoReference => {
            BitmapInfoReference::parse(&mut c).map(FragmentBody::BitmapInfoReference)
        }
        FragmentKind::ModelReference => ModelReference::parse(&mut c).map(FragmentBody::ModelReference),
        FragmentKind::ObjectLocation => ObjectLocation::parse(&mut c).map(FragmentBody::ObjectLocation),
        FragmentKind::MeshReference => MeshReference::parse(&mut c).map(FragmentBody::MeshReference),
        FragmentKind::TextureReference => {
            TextureReference::parse(&mut c).map(FragmentBody::TextureReference)
        }
        FragmentKind::TextureList => TextureList::parse(&mut c).map(FragmentBody::TextureList),
        FragmentKind::Mesh => Mesh::parse(&mut c, version).map(|m| FragmentBody::Mesh(Box::new(m))),
    };

    body.map_err(|e| Error::TruncatedFragment {
        id: entry.id,
        type_code: entry.type_code,
        offset: entry.offset,
        source: Box::new(e),
    })
}
