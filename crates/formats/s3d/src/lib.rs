//! Reader/writer for the S3D archive container (a "PFS" block archive).
//!
//! An archive is a flat directory of named files. Each file is stored as a
//! run of zlib-compressed blocks; a special directory entry holds the file
//! names. [`Archive`] decompresses everything eagerly and hands out
//! immutable byte slices by case-insensitive name.

pub mod archive;
pub mod crc;
pub mod error;
pub mod writer;

pub use archive::{Archive, Entry};
pub use crc::pfs_crc;
pub use error::{Error, Result};
pub use writer::ArchiveWriter;

/// Magic bytes following the directory offset in the archive header.
pub const PFS_MAGIC: [u8; 4] = *b"PFS ";

/// Container version written by [`ArchiveWriter`].
pub const PFS_VERSION: u32 = 0x0002_0000;

/// CRC value that marks the filename directory entry.
pub const FILENAME_DIRECTORY_CRC: u32 = 0x6158_0AC9;

/// Optional footer tag following the directory.
pub const FOOTER_MAGIC: [u8; 5] = *b"STEVE";
