//! Reference recording engine.
//!
//! Writes every recorded call site crossing to a sample stream file, timestamped when the record
//! entry point is reached. The stream is read back with [`stream::from_path`].

mod common;
mod engine;
pub mod stream;

pub use common::AbsTimestamp;
pub use engine::{SAMPLES_PATH_ENV, StreamEngine, StreamEngineLoader};
