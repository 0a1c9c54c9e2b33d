use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tracing::error;
use xpedite::{BridgeError, CallsiteId, EngineLoader, ProbeDescriptor, RecordingEngine};

use crate::stream::{Meta, Record, RecordData, StreamWriter};

/// Environment variable naming the sample stream file.
pub const SAMPLES_PATH_ENV: &str = "XPEDITE_SAMPLES_PATH";

const DEFAULT_SAMPLES_PATH: &str = "xpedite-samples.xpd";

/// A [`RecordingEngine`] writing a sample stream file.
#[derive(Debug)]
pub struct StreamEngine {
    writer: Mutex<StreamWriter<fs::File>>,
}

impl StreamEngine {
    /// Create the sample stream at `path`, replacing any existing file.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = fs::File::create(path)?;
        let writer = StreamWriter::try_new(file).map_err(io::Error::other)?;
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    pub fn record_count(&self) -> usize {
        self.writer
            .lock()
            .expect("stream writer poisoned")
            .record_count()
    }

    fn write(&self, data: RecordData) {
        let record = Record::new(Meta::now(), data);
        let mut writer = self.writer.lock().expect("stream writer poisoned");
        if let Err(err) = writer.write_record(&record) {
            error!(%err, "failed to write sample record");
        }
    }
}

impl RecordingEngine for StreamEngine {
    fn record_event(&self, id: CallsiteId) {
        self.write(RecordData::Sample { call_site: id });
    }

    fn activate_probes(&self, probes: &[ProbeDescriptor]) {
        let call_sites = probes
            .iter()
            .flat_map(|probe| probe.call_sites.iter().map(|(id, _marker)| *id))
            .collect();
        self.write(RecordData::Activated { call_sites });
    }

    fn flush(&self) -> io::Result<()> {
        self.writer.lock().expect("stream writer poisoned").flush()
    }
}

/// Loads a [`StreamEngine`] for the bridge.
#[derive(Debug, Clone)]
pub struct StreamEngineLoader {
    path: PathBuf,
}

impl StreamEngineLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Samples path from the environment, or `xpedite-samples.xpd` in the working directory.
    pub fn from_env() -> Self {
        let path = env::var_os(SAMPLES_PATH_ENV)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SAMPLES_PATH));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EngineLoader for StreamEngineLoader {
    fn load(&self) -> Result<Arc<dyn RecordingEngine>, BridgeError> {
        let engine = StreamEngine::create(&self.path).map_err(|err| BridgeError::Unavailable {
            reason: format!("cannot create `{}`: {err}", self.path.display()),
        })?;
        Ok(Arc::new(engine))
    }
}
