use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid WLD magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("unsupported WLD version {version:#010x}")]
    UnsupportedVersion { version: u32 },

    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("fragment {id} (type {type_code:#04x}) at offset {offset:#x} is truncated: {source}")]
    TruncatedFragment {
        id: usize,
        type_code: u32,
        offset: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("fragment {id} at offset {offset:#x} declares invalid length {length}")]
    InvalidFragmentLength { id: usize, offset: usize, length: i32 },

    #[error("invalid name offset {name_ref} (name table is {len} bytes)")]
    InvalidNameOffset { name_ref: i32, len: usize },

    #[error("fragment reference {reference} does not resolve to any fragment")]
    UnresolvedReference { reference: i32 },

    #[error("mesh fragment {id}: polygon runs cover {covered} triangles, mesh has {decoded}")]
    PolygonRunMismatch { id: usize, covered: usize, decoded: usize },

    #[error("file {name} not found in archive")]
    FileNotFound { name: String },

    #[error("texture file {name} not found in archive")]
    TextureFileMissing { name: String },

    #[error("malformed bitmap {name}: {message}")]
    MalformedBitmap { name: String, message: String },

    #[error("archive error: {0}")]
    Archive(#[from] s3d::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
