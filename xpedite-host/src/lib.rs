//! Reference code-loading substrate for xpedite.
//!
//! [`Host`] plays the part of a runtime's code loader: it keeps encoded units, runs registered
//! transformers whenever a unit is loaded or retransformed, and executes unit methods with an
//! interpreter whose record entry point forwards call site Ids to a recording engine.

mod host;
pub mod interp;

pub use host::{Host, InvokeError, LoadError};
pub use interp::{Completion, ExecError};
