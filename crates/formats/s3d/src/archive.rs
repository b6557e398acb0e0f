use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;

use crate::error::{Error, Result};
use crate::{FILENAME_DIRECTORY_CRC, PFS_MAGIC};

/// Size of one directory record: crc, data offset, inflated size.
const DIRECTORY_RECORD_SIZE: usize = 12;

/// Largest inflated-to-archive size ratio allocated before inflating.
const MAX_PREALLOC_RATIO: usize = 4;

/// A single decompressed file stored in the archive.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Lower-cased file name, extension preserved.
    pub name: String,
    /// Name CRC as stored in the directory.
    pub crc: u32,
    /// Absolute offset of the first compressed block.
    pub offset: usize,
    /// Decompressed contents.
    pub data: Vec<u8>,
}

impl Entry {
    /// Decompressed size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Raw directory record before the name directory has been applied.
#[derive(Debug, Clone, Copy)]
struct DirectoryRecord {
    crc: u32,
    offset: usize,
    size: usize,
}

/// A fully decompressed S3D archive.
///
/// All entries are inflated eagerly on load; lookups are case-insensitive.
pub struct Archive {
    /// Entries in data-offset order.
    entries: Vec<Entry>,
    /// Lower-cased name → index into `entries`.
    index: HashMap<String, usize>,
}

impl Archive {
    /// Read and decompress an archive from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), size = data.len(), "opening archive");
        Self::parse(&data)
    }

    /// Parse an archive from its raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let directory_offset = read_u32(data, 0)? as usize;
        let magic = read_magic(data, 4)?;
        if magic != PFS_MAGIC {
            return Err(Error::InvalidMagic {
                expected: PFS_MAGIC,
                found: magic,
            });
        }

        let records = read_directory(data, directory_offset)?;

        let mut names = None;
        let mut files = Vec::with_capacity(records.len());
        for record in records {
            let contents = inflate(data, record.offset, record.size)?;
            if record.crc == FILENAME_DIRECTORY_CRC {
                names = Some(parse_name_directory(&contents, record.offset)?);
            } else {
                files.push((record, contents));
            }
        }

        let names = names.ok_or_else(|| {
            Error::corrupt(directory_offset, "archive has no filename directory")
        })?;
        if names.len() != files.len() {
            return Err(Error::corrupt(
                directory_offset,
                format!(
                    "filename directory lists {} names for {} entries",
                    names.len(),
                    files.len()
                ),
            ));
        }

        // Names are stored in the order the file data appears.
        files.sort_by_key(|(record, _)| record.offset);

        let mut entries = Vec::with_capacity(files.len());
        let mut index = HashMap::with_capacity(files.len());
        for ((record, contents), name) in files.into_iter().zip(names) {
            if index.insert(name.clone(), entries.len()).is_some() {
                tracing::warn!(name = %name, "duplicate archive entry name, keeping the later one");
            }
            entries.push(Entry {
                name,
                crc: record.crc,
                offset: record.offset,
                data: contents,
            });
        }

        tracing::debug!(entries = entries.len(), "archive loaded");
        Ok(Self { entries, index })
    }

    /// Contents of the named file, or `None` if the archive has no such entry.
    ///
    /// The lookup ignores ASCII case.
    pub fn get_file(&self, name: &str) -> Option<&[u8]> {
        self.entry(name).map(|e| e.data.as_slice())
    }

    /// Entry metadata and contents by case-insensitive name.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        let idx = *self.index.get(&name.to_ascii_lowercase())?;
        self.entries.get(idx)
    }

    /// Whether an entry with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    /// All entries in data-offset order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entry names in data-offset order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of files (the filename directory is not counted).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("entries", &self.entries.len())
            .finish()
    }
}

fn read_directory(data: &[u8], offset: usize) -> Result<Vec<DirectoryRecord>> {
    let count = read_u32(data, offset)? as usize;
    let end = count
        .checked_mul(DIRECTORY_RECORD_SIZE)
        .and_then(|n| n.checked_add(offset + 4))
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            Error::corrupt(offset, format!("directory of {count} records runs past end of data"))
        })?;

    let mut records = Vec::with_capacity(count);
    let mut pos = offset + 4;
    while pos < end {
        records.push(DirectoryRecord {
            crc: read_u32(data, pos)?,
            offset: read_u32(data, pos + 4)? as usize,
            size: read_u32(data, pos + 8)? as usize,
        });
        pos += DIRECTORY_RECORD_SIZE;
    }
    Ok(records)
}

/// Inflate the block run starting at `offset` until `size` bytes are produced.
fn inflate(data: &[u8], offset: usize, size: usize) -> Result<Vec<u8>> {
    // `size` comes from the directory; cap the up-front allocation by the input
    let mut out = Vec::with_capacity(size.min(data.len().saturating_mul(MAX_PREALLOC_RATIO)));
    let mut pos = offset;
    while out.len() < size {
        let deflated = read_u32(data, pos)? as usize;
        let inflated = read_u32(data, pos + 4)? as usize;
        let start = pos + 8;
        let block = start
            .checked_add(deflated)
            .and_then(|end| data.get(start..end))
            .ok_or_else(|| {
                Error::corrupt(pos, format!("block of {deflated} bytes runs past end of data"))
            })?;

        let before = out.len();
        ZlibDecoder::new(block)
            .read_to_end(&mut out)
            .map_err(|source| Error::Decompress { offset: pos, source })?;
        let produced = out.len() - before;
        if produced != inflated {
            return Err(Error::corrupt(
                pos,
                format!("block inflated to {produced} bytes, header says {inflated}"),
            ));
        }
        pos = start + deflated;
    }

    if out.len() != size {
        return Err(Error::SizeMismatch {
            offset,
            expected: size,
            actual: out.len(),
        });
    }
    Ok(out)
}

/// Parse the filename directory: u32 count, then u32 length + NUL-terminated bytes.
fn parse_name_directory(contents: &[u8], offset: usize) -> Result<Vec<String>> {
    let count = read_u32(contents, 0)? as usize;
    let mut names = Vec::with_capacity(count.min(contents.len() / 4));
    let mut pos = 4;
    for _ in 0..count {
        let len = read_u32(contents, pos)? as usize;
        pos += 4;
        let raw = pos
            .checked_add(len)
            .and_then(|end| contents.get(pos..end))
            .ok_or_else(|| Error::corrupt(offset, "filename directory is truncated"))?;
        pos += len;

        let raw = match raw.iter().position(|&b| b == 0) {
            Some(nul) => &raw[..nul],
            None => raw,
        };
        names.push(String::from_utf8_lossy(raw).to_ascii_lowercase());
    }
    Ok(names)
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let bytes = offset
        .checked_add(4)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| Error::corrupt(offset, "unexpected end of data"))?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_magic(data: &[u8], offset: usize) -> Result<[u8; 4]> {
    Ok(read_u32(data, offset)?.to_le_bytes())
}
