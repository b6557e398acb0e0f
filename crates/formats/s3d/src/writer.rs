use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::crc::pfs_crc;
use crate::error::Result;
use crate::{FILENAME_DIRECTORY_CRC, FOOTER_MAGIC, PFS_MAGIC, PFS_VERSION};

/// Uncompressed size of each block written to the archive.
const BLOCK_SIZE: usize = 8 * 1024;

/// Builds an S3D archive in memory.
///
/// Files are laid out in insertion order, followed by the filename
/// directory, the entry directory (sorted by CRC) and a `STEVE` footer.
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    files: Vec<(String, Vec<u8>)>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a file. The name is stored lower-cased.
    pub fn add(&mut self, name: &str, data: impl Into<Vec<u8>>) -> &mut Self {
        self.files.push((name.to_ascii_lowercase(), data.into()));
        self
    }

    /// Assemble the archive bytes.
    pub fn finish(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(&0u32.to_le_bytes()); // directory offset, patched below
        out.extend_from_slice(&PFS_MAGIC);
        out.extend_from_slice(&PFS_VERSION.to_le_bytes());

        // (crc, offset, inflated size)
        let mut records = Vec::with_capacity(self.files.len() + 1);
        for (name, data) in &self.files {
            let offset = out.len();
            write_blocks(&mut out, data)?;
            records.push((pfs_crc(name), offset as u32, data.len() as u32));
        }

        let names = name_directory(self.files.iter().map(|(name, _)| name.as_str()));
        let offset = out.len();
        write_blocks(&mut out, &names)?;
        records.push((FILENAME_DIRECTORY_CRC, offset as u32, names.len() as u32));

        records.sort_by_key(|&(crc, _, _)| crc);

        let directory_offset = out.len() as u32;
        out[0..4].copy_from_slice(&directory_offset.to_le_bytes());
        out.extend_from_slice(&(records.len() as u32).to_le_bytes());
        for (crc, offset, size) in records {
            out.extend_from_slice(&crc.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
        }

        out.extend_from_slice(&FOOTER_MAGIC);
        out.extend_from_slice(&0u32.to_le_bytes());
        Ok(out)
    }
}

/// Compress `data` as a run of `{deflated_len, inflated_len, zlib bytes}` blocks.
fn write_blocks(out: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    for chunk in data.chunks(BLOCK_SIZE) {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(chunk)?;
        let compressed = encoder.finish()?;
        out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&compressed);
    }
    Ok(())
}

/// Filename directory: u32 count, then u32 length + NUL-terminated name.
fn name_directory<'a>(names: impl ExactSizeIterator<Item = &'a str>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(names.len() as u32).to_le_bytes());
    for name in names {
        buf.extend_from_slice(&(name.len() as u32 + 1).to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
    }
    buf
}
