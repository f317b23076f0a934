//! Peer identifiers.

use std::fmt;
use std::sync::Arc;

/// An opaque peer identifier.
///
/// The engine treats peers as strings; the transport layer decides what they
/// mean (a libp2p peer id, a socket address, a test label). Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(Arc<str>);

impl PeerId {
    /// Create a peer id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().into())
    }

    /// The peer id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
