//! Sample stream format.
//!
//! A stream is a [`FormatHeader`] followed by postcard-encoded [`Record`]s
//! until the end of the file.

use serde::{Deserialize, Serialize};
use xpedite::{CallsiteId, FormatHeader, FormatVariant};

use crate::AbsTimestamp;

mod read;
mod write;

pub use read::{ReadStreamError, from_path};
pub use write::StreamWriter;

const HEADER: FormatHeader = FormatHeader::new(FormatVariant::Samples, 0, 1);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Meta {
    pub timestamp: AbsTimestamp,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: AbsTimestamp::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    pub meta: Meta,
    pub data: RecordData,
}

impl Record {
    pub fn new(meta: Meta, data: RecordData) -> Self {
        Self { meta, data }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum RecordData {
    /// These call sites were activated.
    Activated { call_sites: Vec<CallsiteId> },
    /// A call site was crossed.
    Sample { call_site: CallsiteId },
}
