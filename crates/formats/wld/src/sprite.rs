//! Assembles per-slot sprites from a document's material chains.
//!
//! A mesh's polygon runs select a slot in a texture list. Each slot holds a
//! reference to a texture reference (0x30) fragment, which normally leads
//! through a bitmap info reference (0x05) and a bitmap info (0x04) to one
//! bitmap names (0x03) fragment per animation frame:
//!
//! ```text
//! 0x31 slot -> 0x30 -> 0x05 -> 0x04 -> [0x03, 0x03, ...] -> texture files
//! ```
//!
//! Some materials point the 0x30 straight at a 0x03. Others point at
//! something unrelated (zone boundary walls); those get a placeholder frame.

use std::collections::BTreeMap;

use s3d::Archive;
use tracing::{debug, warn};

use crate::config::DecodeOptions;
use crate::fragments::{BitmapNames, Fragment, FragmentBody, TextureList, TextureReference};
use crate::texture::{self, TextureFile};
use crate::wld::WldDocument;

/// How the frames of a sprite were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SpriteSource {
    /// Through a bitmap info reference and bitmap info.
    Chain,
    /// The material points straight at bitmap names.
    Direct,
    /// The material points at neither; the frame is the placeholder texture.
    Placeholder,
}

/// Blending derived from a material's `params1`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub enum Transparency {
    Opaque,
    /// Water and similar surfaces.
    SemiTransparent { alpha: f32 },
    /// Drawn fully transparent.
    Invisible,
}

impl Transparency {
    pub const SEMI_TRANSPARENT_ALPHA: f32 = 0.4;

    pub fn from_params1(params1: u32) -> Self {
        use crate::fragments::texture_reference::{SEMI_TRANSPARENT, VISIBLE};
        if params1 & VISIBLE == 0 {
            Self::Invisible
        } else if params1 & SEMI_TRANSPARENT != 0 {
            Self::SemiTransparent {
                alpha: Self::SEMI_TRANSPARENT_ALPHA,
            }
        } else {
            Self::Opaque
        }
    }

    pub fn alpha(self) -> f32 {
        match self {
            Self::Opaque => 1.0,
            Self::SemiTransparent { alpha } => alpha,
            Self::Invisible => 0.0,
        }
    }

    pub fn is_transparent(self) -> bool {
        !matches!(self, Self::Opaque)
    }
}

/// A resolved texture assignment, possibly animated.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Sprite {
    /// Slot index in the texture list.
    pub slot: usize,
    pub name: String,
    /// Texture keys in animation order (see [`texture::texture_key`]).
    pub frames: Vec<String>,
    /// Delay between frames, when the bitmap info carries one.
    pub anim_delay: Option<u32>,
    pub source: SpriteSource,
    pub transparency: Transparency,
}

impl Sprite {
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }
}

/// Why a slot has no sprite.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize)]
pub enum SpriteError {
    #[error("slot {slot}: reference {reference} does not resolve to any fragment")]
    UnresolvedReference { slot: usize, reference: i32 },

    #[error("slot {slot}: reference {reference} is a {found} fragment, expected {expected}")]
    UnexpectedFragment {
        slot: usize,
        reference: i32,
        expected: &'static str,
        found: &'static str,
    },

    #[error("slot {slot}: texture file {file} not found in archive")]
    TextureFileMissing { slot: usize, file: String },
}

pub type SlotResolution = Result<Sprite, SpriteError>;

/// Sprites for every slot of one texture list.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SpriteTable {
    /// Fragment id of the texture list.
    pub list_id: usize,
    pub slots: Vec<SlotResolution>,
}

impl SpriteTable {
    /// The sprite for a slot, if it resolved.
    pub fn get(&self, slot: usize) -> Option<&Sprite> {
        self.slots.get(slot)?.as_ref().ok()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn sprites(&self) -> impl Iterator<Item = &Sprite> {
        self.slots.iter().filter_map(|s| s.as_ref().ok())
    }

    pub fn errors(&self) -> impl Iterator<Item = &SpriteError> {
        self.slots.iter().filter_map(|s| s.as_ref().err())
    }
}

/// Walks a document's material chains into a [`SpriteTable`].
pub struct AssetGraphBuilder<'a> {
    doc: &'a WldDocument,
    archive: Option<&'a Archive>,
    options: DecodeOptions,
}

impl<'a> AssetGraphBuilder<'a> {
    pub fn new(doc: &'a WldDocument) -> Self {
        Self {
            doc,
            archive: None,
            options: DecodeOptions::default(),
        }
    }

    /// Attach the archive the document came from, enabling texture checks.
    pub fn with_archive(mut self, archive: &'a Archive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_options(mut self, options: &DecodeOptions) -> Self {
        self.options = options.clone();
        self
    }

    /// Sprite table for the document's texture list.
    ///
    /// Zone files carry one texture list; when there are several, the last
    /// one is used. `None` when the document has none.
    pub fn build(&self) -> Option<SpriteTable> {
        let (fragment, list) = self.doc.texture_lists().last()?;
        Some(self.build_list(fragment.id, list))
    }

    /// Sprite table for a specific texture list fragment.
    pub fn build_for(&self, fragment: &Fragment) -> Option<SpriteTable> {
        let list = fragment.as_texture_list()?;
        Some(self.build_list(fragment.id, list))
    }

    fn build_list(&self, list_id: usize, list: &TextureList) -> SpriteTable {
        let slots: Vec<SlotResolution> = list
            .references
            .iter()
            .enumerate()
            .map(|(slot, &reference)| self.resolve_slot(slot, reference))
            .collect();

        let resolved = slots.iter().filter(|s| s.is_ok()).count();
        debug!(list_id, slots = slots.len(), resolved, "built sprite table");
        for err in slots.iter().filter_map(|s| s.as_ref().err()) {
            warn!("{err}");
        }
        SpriteTable { list_id, slots }
    }

    fn resolve_slot(&self, slot: usize, reference: i32) -> SlotResolution {
        let material_fragment = self.lookup(slot, reference)?;
        let material = expect_texture_reference(slot, reference, material_fragment)?;
        let material_name = self.doc.fragment_name(material_fragment);
        let transparency = Transparency::from_params1(material.params1);

        let target = self.lookup(slot, material.reference)?;
        let (name, frames, anim_delay, source) = match &target.body {
            FragmentBody::BitmapInfoReference(info_ref) => {
                let info_fragment = self.lookup(slot, info_ref.reference)?;
                let Some(info) = info_fragment.as_bitmap_info() else {
                    return Err(unexpected(slot, info_ref.reference, "bitmap info", info_fragment));
                };
                let mut frames = Vec::with_capacity(info.references.len());
                for &frame in &info.references {
                    let names_fragment = self.lookup(slot, frame)?;
                    let Some(names) = names_fragment.as_bitmap_names() else {
                        return Err(unexpected(slot, frame, "bitmap names", names_fragment));
                    };
                    frames.push(self.frame(slot, names)?);
                }
                (
                    self.doc.fragment_name(info_fragment),
                    frames,
                    info.frame_delay(),
                    SpriteSource::Chain,
                )
            }
            FragmentBody::BitmapNames(names) => (
                material_name,
                vec![self.frame(slot, names)?],
                None,
                SpriteSource::Direct,
            ),
            _ => {
                warn!(
                    slot,
                    material = %material_name,
                    target_type = format_args!("{:#04x}", target.type_code),
                    "material resolves to neither a bitmap chain nor bitmap names, using placeholder"
                );
                (
                    material_name,
                    vec![self.options.placeholder_texture.clone()],
                    None,
                    SpriteSource::Placeholder,
                )
            }
        };

        Ok(Sprite {
            slot,
            name,
            frames,
            anim_delay,
            source,
            transparency,
        })
    }

    fn lookup(&self, slot: usize, reference: i32) -> Result<&'a Fragment, SpriteError> {
        self.doc
            .get_fragment(reference)
            .ok_or(SpriteError::UnresolvedReference { slot, reference })
    }

    /// Texture key of the first file in `names`, checked against the archive.
    fn frame(&self, slot: usize, names: &BitmapNames) -> Result<String, SpriteError> {
        let raw = names.file_name().unwrap_or_default();
        let file = if self.options.strip_texture_parameters {
            let stripped = texture::strip_parameters(raw);
            if stripped.len() != raw.len() {
                warn!(name = raw, "parametrised texture name");
            }
            stripped
        } else {
            raw
        };

        if self.options.verify_texture_files {
            if let Some(archive) = self.archive {
                if !archive.contains(file) {
                    return Err(SpriteError::TextureFileMissing {
                        slot,
                        file: file.to_ascii_lowercase(),
                    });
                }
            }
        }
        Ok(texture::base_name(file))
    }

    /// Load every texture file named by any bitmap names fragment, keyed by
    /// texture key. Each file succeeds or fails on its own. Empty without an
    /// attached archive.
    pub fn textures(&self) -> BTreeMap<String, crate::Result<TextureFile>> {
        let mut out = BTreeMap::new();
        let Some(archive) = self.archive else {
            return out;
        };
        let names = self
            .doc
            .fragments()
            .iter()
            .filter_map(Fragment::as_bitmap_names)
            .flat_map(|f| f.names.iter())
            .filter(|n| !n.is_empty());
        for name in names {
            let key = texture::texture_key(name);
            if !out.contains_key(&key) {
                out.insert(key, texture::load_texture(archive, name));
            }
        }
        out
    }
}

fn expect_texture_reference(
    slot: usize,
    reference: i32,
    fragment: &Fragment,
) -> Result<&TextureReference, SpriteError> {
    fragment
        .as_texture_reference()
        .ok_or_else(|| unexpected(slot, reference, "texture reference", fragment))
}

fn unexpected(slot: usize, reference: i32, expected: &'static str, found: &Fragment) -> SpriteError {
    SpriteError::UnexpectedFragment {
        slot,
        reference,
        expected,
        found: found.type_name(),
    }
}
