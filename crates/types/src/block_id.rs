//! Candidate block identifiers.

use std::fmt;
use thiserror::Error;

/// Number of bytes in a [`BlockId`].
pub const BLOCK_ID_LEN: usize = 32;

/// Errors from constructing a [`BlockId`].
#[derive(Debug, Error, PartialEq)]
pub enum BlockIdError {
    #[error("invalid block id length: expected {BLOCK_ID_LEN} bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// A 32-byte opaque block identifier.
///
/// Equality and hashing are byte-wise; the engine never interprets the
/// contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId([u8; BLOCK_ID_LEN]);

impl BlockId {
    /// Create a block id from raw bytes.
    pub const fn new(bytes: [u8; BLOCK_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Create a block id from a byte slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BlockIdError> {
        let arr: [u8; BLOCK_ID_LEN] = bytes
            .try_into()
            .map_err(|_| BlockIdError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Parse a block id from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, BlockIdError> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    /// Raw bytes of the id.
    pub fn as_bytes(&self) -> &[u8; BLOCK_ID_LEN] {
        &self.0
    }

    /// Hex encoding of the id.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Truncated for log readability; Display gives the full id.
        write!(f, "BlockId({}…)", hex::encode(&self.0[..4]))
    }
}

impl From<[u8; BLOCK_ID_LEN]> for BlockId {
    fn from(bytes: [u8; BLOCK_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for BlockId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
