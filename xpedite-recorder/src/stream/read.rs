use std::{fs, io, path::Path};

use thiserror::Error;
use xpedite::HeaderError;

use crate::stream::{HEADER, Record};

/// Read every record from the sample stream at `path`.
pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<Record>, ReadStreamError> {
    let buffer = fs::read(path).map_err(ReadStreamError::ReadFileFailed)?;

    let mut bytes = HEADER.split(&buffer)?;

    let mut records = Vec::new();
    for idx in 0.. {
        if bytes.is_empty() {
            break;
        }

        let (record, rem_bytes): (Record, _) = postcard::take_from_bytes(bytes)
            .map_err(|error| ReadStreamError::RecordInvalid { idx, error })?;
        bytes = rem_bytes;
        records.push(record);
    }

    Ok(records)
}

/// An error when reading a sample stream.
#[derive(Debug, Error)]
pub enum ReadStreamError {
    #[error("failed to read sample stream: {0}")]
    ReadFileFailed(io::Error),
    #[error("sample stream header: {0}")]
    Header(#[from] HeaderError),
    #[error("record with index `{idx}` is invalid: {error}")]
    RecordInvalid { idx: usize, error: postcard::Error },
}
