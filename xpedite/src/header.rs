//! The header at the start of every encoded unit and every sample stream.
//!
//! A header is four postcard fields: the `XPD` magic, the [`FormatVariant`], and a major and minor
//! format version. Readers take the header off the front of a buffer with [`FormatHeader::split`],
//! which hands back the payload only if the reader understands it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAGIC: [u8; 3] = *b"XPD";

/// What follows the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum FormatVariant {
    /// An encoded code unit.
    Unit,
    /// A stream of recorded samples.
    Samples,
}

impl fmt::Display for FormatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unit => "xpd-u",
            Self::Samples => "xpd-s",
        })
    }
}

/// Variant and version of an encoded payload.
///
/// A minor version bump only appends to the format, so a reader accepts any minor version up to
/// its own. A major version bump breaks every older reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FormatHeader {
    magic: [u8; 3],
    pub variant: FormatVariant,
    pub major: u16,
    pub minor: u16,
}

impl FormatHeader {
    pub const fn new(variant: FormatVariant, major: u16, minor: u16) -> Self {
        Self {
            magic: MAGIC,
            variant,
            major,
            minor,
        }
    }

    /// Whether a reader expecting `self` understands a payload written under `found`.
    pub fn can_read(&self, found: &FormatHeader) -> bool {
        self.variant == found.variant && self.major == found.major && found.minor <= self.minor
    }

    /// The encoded header.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_stdvec(self)
    }

    /// Take a header off the front of `raw` and return the payload that follows it.
    ///
    /// Fails unless the header is well formed and readable as `self`.
    pub fn split<'a>(&self, raw: &'a [u8]) -> Result<&'a [u8], HeaderError> {
        let (found, payload): (FormatHeader, _) =
            postcard::take_from_bytes(raw).map_err(HeaderError::Malformed)?;
        if found.magic != MAGIC {
            return Err(HeaderError::NotXpedite);
        }
        if !self.can_read(&found) {
            return Err(HeaderError::Incompatible {
                expected: *self,
                found,
            });
        }

        Ok(payload)
    }
}

impl fmt::Display for FormatHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.variant, self.major, self.minor)
    }
}

/// Error taking a [`FormatHeader`] off the front of a buffer.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("malformed format header: {0}")]
    Malformed(postcard::Error),
    #[error("data does not start with an xpedite format header")]
    NotXpedite,
    #[error("cannot read {found} data, expected {expected}")]
    Incompatible {
        expected: FormatHeader,
        found: FormatHeader,
    },
}
