//! Texture file names and texture file loading.

use std::borrow::Cow;

use s3d::Archive;
use tracing::debug;

use crate::error::{Error, Result};

/// Pixel data offset of an 8-bit BMP with a full 256-entry palette.
pub const FULL_PALETTE_OFFSET: usize = 1078;

const BMP_HEADER_SIZE: usize = 54;

/// Drop a `"1, 4, 0, "`-style parameter prefix from a bitmap file name.
pub fn strip_parameters(name: &str) -> &str {
    match name.rfind(',') {
        Some(i) => name[i + 1..].trim(),
        None => name,
    }
}

/// Lower-case a file name and cut it at the first `.`.
pub fn base_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    match lower.find('.') {
        Some(i) => lower[..i].to_string(),
        None => lower,
    }
}

/// Key a texture is known by: parameters stripped, lower-cased, no extension.
///
/// `"TEX1.BMP"` and `"1, 4, 0, TEX1.BMP"` both map to `"tex1"`.
pub fn texture_key(name: &str) -> String {
    base_name(strip_parameters(name))
}

/// Image container of a texture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum TextureFormat {
    Bmp,
    Dds,
    Unknown,
}

impl TextureFormat {
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.get(..2) {
            Some(b"BM") => Self::Bmp,
            Some(b"DD") => Self::Dds,
            _ => Self::Unknown,
        }
    }
}

/// A texture file read from an archive.
#[derive(Debug, Clone)]
pub struct TextureFile {
    /// See [`texture_key`].
    pub key: String,
    pub format: TextureFormat,
    /// File contents. BMPs are palette-normalised.
    pub data: Vec<u8>,
}

/// Rebuild an 8-bit BMP whose palette is shorter than 256 entries.
///
/// The palette is zero-padded so the pixel data starts at
/// [`FULL_PALETTE_OFFSET`], the file size and data offset are patched, and
/// `biClrUsed`/`biClrImportant` are set to 256. Anything else is returned
/// unchanged.
pub fn normalize_bmp<'a>(name: &str, bytes: &'a [u8]) -> Result<Cow<'a, [u8]>> {
    let malformed = |message: String| Error::MalformedBitmap {
        name: name.to_string(),
        message,
    };
    if bytes.len() < BMP_HEADER_SIZE {
        return Err(malformed(format!("{} bytes is shorter than the BMP header", bytes.len())));
    }

    let size = le_u32(bytes, 2) as usize;
    let offset = le_u32(bytes, 10) as usize;
    let bit_count = u16::from_le_bytes([bytes[28], bytes[29]]);
    if bit_count != 8 || offset >= FULL_PALETTE_OFFSET {
        return Ok(Cow::Borrowed(bytes));
    }
    if offset < BMP_HEADER_SIZE || offset > bytes.len() {
        return Err(malformed(format!("pixel data offset {offset} is out of range")));
    }

    let end = if (offset..=bytes.len()).contains(&size) {
        size
    } else {
        bytes.len()
    };
    let padding = FULL_PALETTE_OFFSET - offset;
    debug!(name, palette_entries = (offset - BMP_HEADER_SIZE) / 4, "padding short BMP palette");

    let mut out = Vec::with_capacity(end + padding);
    out.extend_from_slice(&bytes[..BMP_HEADER_SIZE]);
    out.extend_from_slice(&bytes[BMP_HEADER_SIZE..offset]);
    out.resize(FULL_PALETTE_OFFSET, 0);
    out.extend_from_slice(&bytes[offset..end]);

    let new_size = out.len() as u32;
    out[2..6].copy_from_slice(&new_size.to_le_bytes());
    out[10..14].copy_from_slice(&(FULL_PALETTE_OFFSET as u32).to_le_bytes());
    out[46..50].copy_from_slice(&256u32.to_le_bytes()); // biClrUsed
    out[50..54].copy_from_slice(&256u32.to_le_bytes()); // biClrImportant
    Ok(Cow::Owned(out))
}

/// Read a texture file from `archive`.
///
/// `name` may carry a parameter prefix; the lookup ignores case.
pub fn load_texture(archive: &Archive, name: &str) -> Result<TextureFile> {
    let file = strip_parameters(name);
    let bytes = archive.get_file(file).ok_or_else(|| Error::TextureFileMissing {
        name: file.to_ascii_lowercase(),
    })?;
    let format = TextureFormat::detect(bytes);
    let data = match format {
        TextureFormat::Bmp => normalize_bmp(file, bytes)?.into_owned(),
        _ => bytes.to_vec(),
    };
    Ok(TextureFile {
        key: texture_key(file),
        format,
        data,
    })
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
