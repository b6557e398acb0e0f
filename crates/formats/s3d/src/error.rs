use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid archive magic: expected {expected:?}, found {found:?}")]
    InvalidMagic { expected: [u8; 4], found: [u8; 4] },

    #[error("corrupt archive at offset {offset:#x}: {reason}")]
    Corrupt { offset: usize, reason: String },

    #[error("failed to inflate block at offset {offset:#x}: {source}")]
    Decompress {
        offset: usize,
        source: std::io::Error,
    },

    #[error("entry at offset {offset:#x} inflated to {actual} bytes, directory says {expected}")]
    SizeMismatch {
        offset: usize,
        expected: usize,
        actual: usize,
    },
}

impl Error {
    pub(crate) fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
