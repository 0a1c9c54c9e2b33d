//! Handle to the recording engine.
//!
//! The engine persists recorded events and symbolizes nothing; all it needs is a call site Id per
//! event. Trampolines reach it through [`Bridge::record_event`]. The handle is created once per
//! process by [`BridgeCell::get_or_load`] and shared from then on.

use std::{
    fmt, io,
    sync::{Arc, Mutex, OnceLock},
};

use thiserror::Error;

use crate::{callsite::CallsiteId, probe::ProbeDescriptor};

/// The recording engine's side of the boundary.
pub trait RecordingEngine: Send + Sync {
    /// Record that the call site `id` was crossed. Called from trampolines, so must be cheap.
    fn record_event(&self, id: CallsiteId);

    /// The call sites of `probes` are now live.
    fn activate_probes(&self, probes: &[ProbeDescriptor]);

    /// Persist anything buffered so far.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Resolves and loads a recording engine.
pub trait EngineLoader {
    fn load(&self) -> Result<Arc<dyn RecordingEngine>, BridgeError>;
}

impl<F> EngineLoader for F
where
    F: Fn() -> Result<Arc<dyn RecordingEngine>, BridgeError>,
{
    fn load(&self) -> Result<Arc<dyn RecordingEngine>, BridgeError> {
        self()
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine could not be found or loaded. Profiling can't proceed.
    #[error("recording engine unavailable: {reason}")]
    Unavailable { reason: String },
}

/// A loaded recording engine.
#[derive(Clone)]
pub struct Bridge {
    engine: Arc<dyn RecordingEngine>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge").finish_non_exhaustive()
    }
}

impl Bridge {
    pub fn new(engine: Arc<dyn RecordingEngine>) -> Self {
        Self { engine }
    }

    #[inline]
    pub fn record_event(&self, id: CallsiteId) {
        self.engine.record_event(id);
    }

    pub fn flush(&self) -> io::Result<()> {
        self.engine.flush()
    }

    pub fn engine(&self) -> &Arc<dyn RecordingEngine> {
        &self.engine
    }
}

/// Lazily initialized [`Bridge`].
///
/// Only one thread ever runs the loader. Threads that arrive while it runs wait on the init lock
/// and then take the published handle. A failed load publishes nothing, so the next caller tries
/// again.
#[derive(Debug, Default)]
pub struct BridgeCell {
    bridge: OnceLock<Bridge>,
    init: Mutex<()>,
}

impl BridgeCell {
    pub const fn new() -> Self {
        Self {
            bridge: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// The process-wide bridge cell.
    pub fn process() -> &'static BridgeCell {
        static PROCESS: BridgeCell = BridgeCell::new();
        &PROCESS
    }

    /// The bridge, if it has been loaded.
    pub fn get(&self) -> Option<&Bridge> {
        self.bridge.get()
    }

    /// The bridge, loading the engine with `loader` if this is the first call.
    pub fn get_or_load(&self, loader: &dyn EngineLoader) -> Result<&Bridge, BridgeError> {
        if let Some(bridge) = self.bridge.get() {
            return Ok(bridge);
        }

        let _guard = self.init.lock().expect("bridge init lock poisoned");
        if let Some(bridge) = self.bridge.get() {
            return Ok(bridge);
        }

        let engine = loader.load()?;
        Ok(self.bridge.get_or_init(|| Bridge::new(engine)))
    }
}
