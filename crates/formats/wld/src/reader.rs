use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::version::WldVersion;

/// Magic word at the start of every WLD file.
pub const WLD_MAGIC: u32 = 0x5450_3D02;

/// Size of the file header (7 × u32).
pub const HEADER_SIZE: usize = 28;

/// Size of the generic fragment header: length, type, name reference.
pub const FRAGMENT_HEADER_SIZE: usize = 12;

/// Parsed WLD file header.
#[derive(Debug, Clone, Copy)]
pub struct WldHeader {
    /// Version word exactly as stored (low bit included).
    pub raw_version: u32,
    pub version: WldVersion,
    /// Number of fragments that follow the name table.
    pub max_fragment: u32,
    /// Length of the encoded name table in bytes.
    pub name_hash_len: u32,
    /// The three header words whose meaning is not needed for decoding.
    pub reserved: [u32; 3],
}

impl WldHeader {
    /// Parse and validate the 28-byte header.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(data);
        let magic = c.read_u32()?;
        if magic != WLD_MAGIC {
            return Err(Error::BadMagic {
                expected: WLD_MAGIC,
                found: magic,
            });
        }
        let raw_version = c.read_u32()?;
        let version = WldVersion::from_raw(raw_version).ok_or(Error::UnsupportedVersion {
            version: raw_version,
        })?;
        let max_fragment = c.read_u32()?;
        let reserved0 = c.read_u32()?;
        let reserved1 = c.read_u32()?;
        let name_hash_len = c.read_u32()?;
        let reserved2 = c.read_u32()?;

        Ok(Self {
            raw_version,
            version,
            max_fragment,
            name_hash_len,
            reserved: [reserved0, reserved1, reserved2],
        })
    }

    /// Absolute offset of the encoded name table.
    pub fn name_table_offset(&self) -> usize {
        HEADER_SIZE
    }

    /// Absolute offset of the first fragment header.
    pub fn fragments_offset(&self) -> usize {
        HEADER_SIZE + self.name_hash_len as usize
    }

    /// The encoded name table bytes.
    pub fn name_table<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        let mut c = Cursor::at_offset(data, self.name_table_offset());
        c.read_bytes(self.name_hash_len as usize)
    }
}

/// Location and generic header of one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentEntry {
    /// Position in the file (0-based); references address it as `id + 1`.
    pub id: usize,
    /// Absolute offset of the fragment header.
    pub offset: usize,
    /// Declared length. Counts the name field, not the length or type fields.
    pub length: i32,
    pub type_code: u32,
    pub name_ref: i32,
}

impl FragmentEntry {
    /// Absolute offset where the type-specific body begins.
    pub fn body_offset(&self) -> usize {
        self.offset + FRAGMENT_HEADER_SIZE
    }

    /// Body length: the declared length minus the name field.
    pub fn body_len(&self) -> usize {
        (self.length - 4) as usize
    }

    /// Absolute offset of the next fragment header.
    pub fn end(&self) -> usize {
        self.body_offset() + self.body_len()
    }
}

/// Index of every fragment in a WLD file.
///
/// This is Layer 1: it walks the generic headers and fragment boundaries
/// without decoding any fragment body.
#[derive(Debug, Clone)]
pub struct FragmentIndex {
    entries: Vec<FragmentEntry>,
}

impl FragmentIndex {
    /// Walk exactly `header.max_fragment` fragments.
    ///
    /// Any header or body that runs past the end of `data` fails the whole
    /// walk, since every later offset would be wrong.
    pub fn parse(data: &[u8], header: &WldHeader) -> Result<Self> {
        let count = header.max_fragment as usize;
        let mut entries = Vec::with_capacity(count.min(data.len() / FRAGMENT_HEADER_SIZE));
        let mut offset = header.fragments_offset();

        for id in 0..count {
            let mut c = Cursor::at_offset(data, offset);
            let (length, type_code, name_ref) = read_generic_header(&mut c).map_err(|e| {
                Error::TruncatedFragment {
                    id,
                    type_code: 0,
                    offset,
                    source: Box::new(e),
                }
            })?;

            if length < 4 {
                return Err(Error::InvalidFragmentLength { id, offset, length });
            }

            let entry = FragmentEntry {
                id,
                offset,
                length,
                type_code,
                name_ref,
            };
            c.skip(entry.body_len()).map_err(|e| Error::TruncatedFragment {
                id,
                type_code,
                offset,
                source: Box::new(e),
            })?;

            entries.push(entry);
            offset = entry.end();
        }

        Ok(Self { entries })
    }

    /// All fragments in file order.
    pub fn entries(&self) -> &[FragmentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by 0-based id.
    pub fn get(&self, id: usize) -> Option<&FragmentEntry> {
        self.entries.get(id)
    }
}

fn read_generic_header(c: &mut Cursor<'_>) -> Result<(i32, u32, i32)> {
    let length = c.read_i32()?;
    let type_code = c.read_u32()?;
    let name_ref = c.read_i32()?;
    Ok((length, type_code, name_ref))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Writer;

    fn header_bytes(version: u32, max_fragment: u32, name_hash_len: u32) -> Writer {
        let mut w = Writer::new();
        w.write_u32(WLD_MAGIC);
        w.write_u32(version);
        w.write_u32(max_fragment);
        w.write_u32(0);
        w.write_u32(0);
        w.write_u32(name_hash_len);
        w.write_u32(0);
        w
    }

    fn fragment(w: &mut Writer, type_code: u32, name_ref: i32, body: &[u8]) {
        w.write_i32(body.len() as i32 + 4);
        w.write_u32(type_code);
        w.write_i32(name_ref);
        w.write_bytes(body);
    }

    #[test]
    fn header_fields() {
        let mut w = header_bytes(0x1000_C801, 7, 3);
        w.write_bytes(&[1, 2, 3]);
        let data = w.into_bytes();
        let header = WldHeader::parse(&data).unwrap();
        assert_eq!(header.version, WldVersion::V2);
        assert_eq!(header.raw_version, 0x1000_C801);
        assert_eq!(header.max_fragment, 7);
        assert_eq!(header.fragments_offset(), 31);
        assert_eq!(header.name_table(&data).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn bad_magic() {
        let mut data = header_bytes(WldVersion::RAW_V1, 0, 0).into_bytes();
        data[0] = 0;
        assert!(matches!(WldHeader::parse(&data), Err(Error::BadMagic { .. })));
    }

    #[test]
    fn unsupported_version() {
        let data = header_bytes(0x0002_0000, 0, 0).into_bytes();
        assert!(matches!(
            WldHeader::parse(&data),
            Err(Error::UnsupportedVersion { version: 0x0002_0000 })
        ));
    }

    #[test]
    fn index_walks_declared_lengths() {
        let mut w = header_bytes(WldVersion::RAW_V1, 3, 0);
        fragment(&mut w, 0x35, 0, &[]);
        fragment(&mut w, 0x03, -1, &[0; 10]);
        fragment(&mut w, 0x22, -5, &[0; 3]);
        let data = w.into_bytes();

        let header = WldHeader::parse(&data).unwrap();
        let index = FragmentIndex::parse(&data, &header).unwrap();
        let ids: Vec<usize> = index.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, [0, 1, 2]);
        let offsets: Vec<usize> = index.entries().iter().map(|e| e.offset).collect();
        assert_eq!(offsets, [28, 40, 62]);
        assert_eq!(index.get(2).unwrap().end(), data.len());
        assert_eq!(index.get(1).unwrap().name_ref, -1);
    }

    #[test]
    fn short_body_is_truncated_fragment() {
        let mut w = header_bytes(WldVersion::RAW_V1, 1, 0);
        w.write_i32(100);
        w.write_u32(0x36);
        w.write_i32(0);
        w.write_bytes(&[0; 8]);
        let data = w.into_bytes();

        let header = WldHeader::parse(&data).unwrap();
        match FragmentIndex::parse(&data, &header) {
            Err(Error::TruncatedFragment { id, type_code, .. }) => {
                assert_eq!((id, type_code), (0, 0x36));
            }
            other => panic!("expected TruncatedFragment, got {other:?}"),
        }
    }

    #[test]
    fn missing_fragment_is_truncated() {
        let mut w = header_bytes(WldVersion::RAW_V1, 2, 0);
        fragment(&mut w, 0x35, 0, &[]);
        let data = w.into_bytes();

        let header = WldHeader::parse(&data).unwrap();
        assert!(matches!(
            FragmentIndex::parse(&data, &header),
            Err(Error::TruncatedFragment { id: 1, .. })
        ));
    }

    #[test]
    fn length_below_name_field_is_rejected() {
        let mut w = header_bytes(WldVersion::RAW_V1, 1, 0);
        w.write_i32(2);
        w.write_u32(0x03);
        w.write_i32(0);
        let data = w.into_bytes();

        let header = WldHeader::parse(&data).unwrap();
        assert!(matches!(
            FragmentIndex::parse(&data, &header),
            Err(Error::InvalidFragmentLength { length: 2, .. })
        ));
    }
}
