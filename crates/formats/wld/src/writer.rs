//! Assembles WLD files from fragments.

use crate::cursor::Writer;
use crate::fragments::{
    BitmapInfo, BitmapInfoReference, BitmapNames, Mesh, MeshReference, ModelReference, ObjectLocation, TextureList,
    TextureReference,
};
use crate::namehash::NameTableBuilder;
use crate::reader::WLD_MAGIC;
use crate::version::WldVersion;

/// Builds a WLD file fragment by fragment.
///
/// Fragments are numbered in the order they are added; each `fragment`
/// call returns the positive reference other fragments use to point at it.
#[derive(Debug)]
pub struct WldWriter {
    version: WldVersion,
    names: NameTableBuilder,
    fragments: Writer,
    count: u32,
}

impl WldWriter {
    pub fn new(version: WldVersion) -> Self {
        Self {
            version,
            names: NameTableBuilder::new(),
            fragments: Writer::new(),
            count: 0,
        }
    }

    pub fn version(&self) -> WldVersion {
        self.version
    }

    /// Intern a name and return its (negative) name reference.
    pub fn name(&mut self, name: &str) -> i32 {
        self.names.add(name)
    }

    /// Append a raw fragment and return its 1-based reference.
    pub fn fragment(&mut self, type_code: u32, name_ref: i32, body: &[u8]) -> i32 {
        self.fragments.write_i32(body.len() as i32 + 4);
        self.fragments.write_u32(type_code);
        self.fragments.write_i32(name_ref);
        self.fragments.write_bytes(body);
        self.count += 1;
        self.count as i32
    }

    pub fn bitmap_names(&mut self, name_ref: i32, files: &[&str]) -> i32 {
        let mut w = Writer::new();
        BitmapNames {
            names: files.iter().map(|f| f.to_string()).collect(),
        }
        .write(&mut w);
        self.fragment(0x03, name_ref, &w.into_bytes())
    }

    pub fn bitmap_info(&mut self, name_ref: i32, info: &BitmapInfo) -> i32 {
        let mut w = Writer::new();
        info.write(&mut w);
        self.fragment(0x04, name_ref, &w.into_bytes())
    }

    pub fn bitmap_info_reference(&mut self, name_ref: i32, reference: &BitmapInfoReference) -> i32 {
        let mut w = Writer::new();
        reference.write(&mut w);
        self.fragment(0x05, name_ref, &w.into_bytes())
    }

    pub fn texture_reference(&mut self, name_ref: i32, texture: &TextureReference) -> i32 {
        let mut w = Writer::new();
        texture.write(&mut w);
        self.fragment(0x30, name_ref, &w.into_bytes())
    }

    pub fn texture_list(&mut self, name_ref: i32, list: &TextureList) -> i32 {
        let mut w = Writer::new();
        list.write(&mut w);
        self.fragment(0x31, name_ref, &w.into_bytes())
    }

    pub fn mesh(&mut self, name_ref: i32, mesh: &Mesh) -> i32 {
        let mut w = Writer::new();
        mesh.write(&mut w, self.version);
        self.fragment(0x36, name_ref, &w.into_bytes())
    }

    pub fn model_reference(&mut self, name_ref: i32, model: &ModelReference) -> i32 {
        let mut w = Writer::new();
        model.write(&mut w);
        self.fragment(0x14, name_ref, &w.into_bytes())
    }

    pub fn object_location(&mut self, name_ref: i32, location: &ObjectLocation) -> i32 {
        let mut w = Writer::new();
        location.write(&mut w);
        self.fragment(0x15, name_ref, &w.into_bytes())
    }

    pub fn mesh_reference(&mut self, name_ref: i32, reference: &MeshReference) -> i32 {
        let mut w = Writer::new();
        reference.write(&mut w);
        self.fragment(0x2D, name_ref, &w.into_bytes())
    }

    /// Number of fragments added so far.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Header, encoded name table, then the fragments.
    pub fn finish(self) -> Vec<u8> {
        let names = self.names.finish();
        let fragments = self.fragments.into_bytes();

        let mut w = Writer::with_capacity(28 + names.len() + fragments.len());
        w.write_u32(WLD_MAGIC);
        w.write_u32(self.version.raw());
        w.write_u32(self.count);
        w.write_u32(0);
        w.write_u32(0);
        w.write_u32(names.len() as u32);
        w.write_u32(0);
        w.write_bytes(&names);
        w.write_bytes(&fragments);
        w.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{FragmentIndex, WldHeader, HEADER_SIZE};

    #[test]
    fn references_count_from_one() {
        let mut w = WldWriter::new(WldVersion::V1);
        assert_eq!(w.fragment(0x35, 0, &[]), 1);
        assert_eq!(w.fragment(0x22, 0, &[0; 4]), 2);
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn header_and_lengths() {
        let mut w = WldWriter::new(WldVersion::V2);
        let name = w.name("X");
        w.fragment(0x22, name, &[1, 2, 3]);
        let data = w.finish();

        let header = WldHeader::parse(&data).unwrap();
        assert_eq!(header.version, WldVersion::V2);
        assert_eq!(header.max_fragment, 1);
        // leading sentinel + "X\0"
        assert_eq!(header.name_hash_len, 3);

        let index = FragmentIndex::parse(&data, &header).unwrap();
        let entry = index.get(0).unwrap();
        assert_eq!(entry.offset, HEADER_SIZE + 3);
        assert_eq!(entry.length, 7);
        assert_eq!(entry.name_ref, -1);
        assert_eq!(entry.end(), data.len());
    }
}
