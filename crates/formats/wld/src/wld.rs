use std::collections::BTreeMap;
use std::path::Path;

use s3d::Archive;
use tracing::{debug, trace, warn};

use crate::config::DecodeOptions;
use crate::error::{Error, Result};
use crate::fragments::{self, Fragment, FragmentKind, Mesh, ObjectLocation, TextureList};
use crate::namehash::NameTable;
use crate::reader::{FragmentIndex, WldHeader};
use crate::version::WldVersion;

/// A fully decoded WLD document.
///
/// Unlike the archive, which hands out raw bytes, a document is decoded
/// eagerly: every fragment body is parsed at load time, and the document
/// owns the resulting table. Fragments are addressed by 0-based id
/// internally and by signed references in the file (see
/// [`WldDocument::get_fragment`]).
#[derive(Debug, Clone)]
pub struct WldDocument {
    header: WldHeader,
    names: NameTable,
    fragments: Vec<Fragment>,
}

/// One row of a fragment listing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FragmentSummary {
    pub id: usize,
    pub type_code: u32,
    pub type_name: &'static str,
    pub name: String,
    pub offset: usize,
    pub length: i32,
}

impl WldDocument {
    /// Decode a WLD file with default options.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with(data, &DecodeOptions::default())
    }

    /// Decode a WLD file.
    ///
    /// Structural faults (bad magic, unknown version, truncated fragments)
    /// fail the whole load. A mesh whose polygon runs do not cover its
    /// triangles fails only with `strict_polygon_runs`; otherwise it is
    /// logged and kept.
    pub fn parse_with(data: &[u8], options: &DecodeOptions) -> Result<Self> {
        let header = WldHeader::parse(data)?;
        let names = NameTable::from_encoded(header.name_table(data)?);
        let index = FragmentIndex::parse(data, &header)?;
        debug!(
            version = %header.version,
            fragments = index.len(),
            name_table = names.len(),
            "decoding WLD"
        );

        let mut fragments = Vec::with_capacity(index.len());
        for entry in index.entries() {
            let body = fragments::decode_body(entry, data, header.version)?;
            let fragment = Fragment {
                id: entry.id,
                type_code: entry.type_code,
                name_ref: entry.name_ref,
                offset: entry.offset,
                length: entry.length,
                body,
            };
            if let Some(mesh) = fragment.as_mesh() {
                if let Err(e) = mesh.validate_runs(fragment.id) {
                    if options.strict_polygon_runs {
                        return Err(e);
                    }
                    warn!("{e}");
                }
            }
            fragments.push(fragment);
        }

        Ok(Self {
            header,
            names,
            fragments,
        })
    }

    /// Load and decode `name` from an archive.
    pub fn from_archive(archive: &Archive, name: &str) -> Result<Self> {
        Self::from_archive_with(archive, name, &DecodeOptions::default())
    }

    pub fn from_archive_with(archive: &Archive, name: &str, options: &DecodeOptions) -> Result<Self> {
        let data = archive.get_file(name).ok_or_else(|| Error::FileNotFound {
            name: name.to_string(),
        })?;
        Self::parse_with(data, options)
    }

    /// Open the archive at `path` and decode `name` from it.
    pub fn open(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let archive = Archive::open(path)?;
        Self::from_archive(&archive, name)
    }

    pub fn header(&self) -> &WldHeader {
        &self.header
    }

    pub fn version(&self) -> WldVersion {
        self.header.version
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    /// Resolve a name reference. `0` is the empty name.
    pub fn get_name(&self, name_ref: i32) -> Result<String> {
        self.names.lookup(name_ref)
    }

    /// Name of a fragment, or the empty string when its reference is bad.
    pub fn fragment_name(&self, fragment: &Fragment) -> String {
        self.names.lookup(fragment.name_ref).unwrap_or_default()
    }

    /// Resolve a fragment reference.
    ///
    /// A positive reference is a 1-based fragment index. Zero or a negative
    /// reference names a fragment: the first fragment whose `name_ref` equals
    /// `reference - 1` wins.
    pub fn get_fragment(&self, reference: i32) -> Option<&Fragment> {
        if reference > 0 {
            return self.fragments.get(reference as usize - 1);
        }
        let name_ref = reference.checked_sub(1)?;
        trace!(
            reference,
            name = %self.names.lookup(name_ref).unwrap_or_default(),
            "resolving fragment by name"
        );
        self.fragments.iter().find(|f| f.name_ref == name_ref)
    }

    /// Like [`get_fragment`](Self::get_fragment), failing with
    /// [`Error::UnresolvedReference`].
    pub fn resolve(&self, reference: i32) -> Result<&Fragment> {
        self.get_fragment(reference)
            .ok_or(Error::UnresolvedReference { reference })
    }

    /// All fragments in file order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Fragment by 0-based id.
    pub fn fragment(&self, id: usize) -> Option<&Fragment> {
        self.fragments.get(id)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Fragments of one decoded kind, in file order.
    pub fn fragments_of(&self, kind: FragmentKind) -> impl Iterator<Item = &Fragment> + '_ {
        let code = kind.code();
        self.fragments.iter().filter(move |f| f.type_code == code)
    }

    /// First fragment whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<&Fragment> {
        self.fragments
            .iter()
            .find(|f| f.name_ref != 0 && self.names.lookup(f.name_ref).is_ok_and(|n| n == name))
    }

    /// Number of fragments per type code.
    pub fn type_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for f in &self.fragments {
            *counts.entry(f.type_code).or_insert(0) += 1;
        }
        counts
    }

    /// Every mesh with its fragment.
    pub fn meshes(&self) -> impl Iterator<Item = (&Fragment, &Mesh)> + '_ {
        self.fragments.iter().filter_map(|f| f.as_mesh().map(|m| (f, m)))
    }

    /// Every texture list with its fragment.
    pub fn texture_lists(&self) -> impl Iterator<Item = (&Fragment, &TextureList)> + '_ {
        self.fragments
            .iter()
            .filter_map(|f| f.as_texture_list().map(|l| (f, l)))
    }

    /// Every object location with its fragment.
    pub fn object_locations(&self) -> impl Iterator<Item = (&Fragment, &ObjectLocation)> + '_ {
        self.fragments
            .iter()
            .filter_map(|f| f.as_object_location().map(|l| (f, l)))
    }

    /// One summary row per fragment.
    pub fn summaries(&self) -> Vec<FragmentSummary> {
        self.fragments
            .iter()
            .map(|f| FragmentSummary {
                id: f.id,
                type_code: f.type_code,
                type_name: f.type_name(),
                name: self.fragment_name(f),
                offset: f.offset,
                length: f.length,
            })
            .collect()
    }
}
