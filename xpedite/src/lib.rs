//! Probe activation for low-overhead profiling.
//!
//! A [`Probe`] names one or two locations in a method. Constructing it mints a [`CallsiteId`] for
//! each location. Activation writes one app-info record per call site, registers a [`Rewriter`]
//! with the code-loading substrate, and from then on every crossing of a rewritten location calls
//! the recording engine with that location's Id.

mod activate;
pub mod appinfo;
pub mod bridge;
mod callsite;
mod config;
mod header;
mod probe;
pub mod rewrite;
pub mod substrate;
pub mod trampoline;
pub mod unit;

pub use activate::{Activation, ActivationError, activate_probes};
pub use bridge::{Bridge, BridgeCell, BridgeError, EngineLoader, RecordingEngine};
pub use callsite::{CallSite, CallsiteId, CallsiteRegistry, LocationMarker};
pub use config::{APPINFO_PATH_ENV, Config};
pub use header::{FormatHeader, FormatVariant, HeaderError};
pub use probe::{AnchoredProbe, Probe, ProbeDescriptor, ScopedProbe};
pub use rewrite::{Rewriter, UnitRewrite};
