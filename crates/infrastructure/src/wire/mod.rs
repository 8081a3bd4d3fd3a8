//! Bounds-checked reading of network byte buffers.

pub mod cursor;
pub mod name;

pub use cursor::WireCursor;
pub use name::{decompress, MAX_NAME_LEN};

use dclocate_domain::DomainError;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("read of {wanted} bytes at offset {offset} runs past end of buffer")]
    Truncated { offset: usize, wanted: usize },

    #[error("compression pointer at offset {offset} targets {target}, outside the buffer")]
    BadPointer { offset: usize, target: usize },

    #[error("too many compression pointers")]
    PointerLoop,

    #[error("name exceeds 255 octets")]
    NameTooLong,

    #[error("unsupported label type 0x{0:02x}")]
    BadLabelType(u8),

    #[error("allocation failed")]
    Allocation,
}

impl From<WireError> for DomainError {
    fn from(err: WireError) -> Self {
        DomainError::MalformedDnsMessage(err.to_string())
    }
}
