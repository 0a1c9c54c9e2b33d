//! Raw byte form of a [`Unit`].
//!
//! An encoded unit is a [`FormatHeader`] followed by the postcard-encoded unit itself.

use thiserror::Error;

use crate::{
    header::{FormatHeader, FormatVariant, HeaderError},
    unit::Unit,
};

/// The header written at the start of every encoded unit.
pub const HEADER: FormatHeader = FormatHeader::new(FormatVariant::Unit, 0, 1);

/// Encode `unit` behind the current header.
pub fn encode(unit: &Unit) -> Result<Vec<u8>, WriteUnitError> {
    let mut buffer = HEADER.to_bytes()?;
    buffer.extend(postcard::to_stdvec(unit)?);
    Ok(buffer)
}

/// Decode a unit from its raw bytes.
pub fn decode(raw: &[u8]) -> Result<Unit, ReadUnitError> {
    let payload = HEADER.split(raw)?;
    let (unit, trailing): (Unit, _) =
        postcard::take_from_bytes(payload).map_err(ReadUnitError::UnitInvalid)?;
    if !trailing.is_empty() {
        return Err(ReadUnitError::TrailingBytes(trailing.len()));
    }

    Ok(unit)
}

/// An error decoding a unit from raw bytes.
#[derive(Debug, Error)]
pub enum ReadUnitError {
    #[error("unit header: {0}")]
    Header(#[from] HeaderError),
    /// The unit body is not a valid postcard encoded unit.
    #[error("unit is invalid: {0}")]
    UnitInvalid(postcard::Error),
    #[error("{0} unexpected bytes after unit")]
    TrailingBytes(usize),
}

/// An error encoding a unit.
#[derive(Debug, Error)]
#[error("failed to encode unit: {0}")]
pub struct WriteUnitError(#[from] postcard::Error);
