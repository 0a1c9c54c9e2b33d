use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, RwLock},
};

use thiserror::Error;
use tracing::debug;
use xpedite::{
    RecordingEngine,
    rewrite::RewriteError,
    substrate::{CodeLoader, RetransformError, Transformer},
    unit::{self, ReadUnitError},
};

use crate::interp::{Completion, ExecError, Machine};

/// An in-process code-loading substrate.
///
/// Units are stored as raw bytes, both as loaded and as transformed. Every load and every
/// retransformation runs the registered transformers in registration order over the bytes the unit
/// was loaded with, each transformer seeing the previous one's output. Transformers
/// run without any host lock held, so units loaded on different threads are transformed in
/// parallel.
#[derive(Default)]
pub struct Host {
    units: RwLock<BTreeMap<String, LoadedUnit>>,
    transformers: RwLock<Vec<Arc<dyn Transformer>>>,
    unmodifiable: RwLock<BTreeSet<String>>,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse retransformation of `unit_name` from now on.
    pub fn mark_unmodifiable(&self, unit_name: impl Into<String>) {
        self.unmodifiable
            .write()
            .expect("unmodifiable set poisoned")
            .insert(unit_name.into());
    }

    /// Load (or reload) a unit, presenting it to every registered transformer first.
    ///
    /// If a transformer fails, the unit is not loaded and any previously loaded version stays.
    pub fn load(&self, unit_name: &str, raw: Vec<u8>) -> Result<(), LoadError> {
        let original: Arc<[u8]> = raw.into();
        let current = self.transform(unit_name, &original)?;
        self.units.write().expect("units poisoned").insert(
            unit_name.to_owned(),
            LoadedUnit {
                original,
                current: current.into(),
            },
        );
        Ok(())
    }

    /// The currently loaded bytes of `unit_name`, after transformation.
    pub fn raw(&self, unit_name: &str) -> Option<Arc<[u8]>> {
        self.units
            .read()
            .expect("units poisoned")
            .get(unit_name)
            .map(|unit| Arc::clone(&unit.current))
    }

    fn original(&self, unit_name: &str) -> Option<Arc<[u8]>> {
        self.units
            .read()
            .expect("units poisoned")
            .get(unit_name)
            .map(|unit| Arc::clone(&unit.original))
    }

    /// Run `method` of the loaded unit `unit_name` with `arg`.
    pub fn invoke(
        &self,
        unit_name: &str,
        method: &str,
        arg: i64,
        engine: &dyn RecordingEngine,
    ) -> Result<Completion, InvokeError> {
        let raw = self
            .raw(unit_name)
            .ok_or_else(|| InvokeError::NotLoaded(unit_name.to_owned()))?;
        let unit = unit::decode(&raw)?;
        Ok(Machine::new(&unit, engine).invoke(method, arg)?)
    }

    fn transform(&self, unit_name: &str, original: &[u8]) -> Result<Vec<u8>, RewriteError> {
        let transformers = self
            .transformers
            .read()
            .expect("transformers poisoned")
            .clone();

        let mut raw = original.to_vec();
        for transformer in transformers {
            if let Some(transformed) = transformer.transform(unit_name, &raw)? {
                raw = transformed;
            }
        }

        Ok(raw)
    }
}

impl CodeLoader for Host {
    fn add_transformer(&self, transformer: Arc<dyn Transformer>) {
        self.transformers
            .write()
            .expect("transformers poisoned")
            .push(transformer);
    }

    fn remove_transformer(&self, transformer: &Arc<dyn Transformer>) {
        self.transformers
            .write()
            .expect("transformers poisoned")
            .retain(|registered| !Arc::ptr_eq(registered, transformer));
    }

    fn loaded_units(&self) -> Vec<String> {
        self.units
            .read()
            .expect("units poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Run every registered transformer again over the bytes the unit was loaded with.
    fn retransform(&self, unit_name: &str) -> Result<(), RetransformError> {
        if self
            .unmodifiable
            .read()
            .expect("unmodifiable set poisoned")
            .contains(unit_name)
        {
            return Err(RetransformError::Unmodifiable(unit_name.to_owned()));
        }

        let original = self
            .original(unit_name)
            .ok_or_else(|| RetransformError::NotLoaded(unit_name.to_owned()))?;
        let current = self.transform(unit_name, &original)?;

        let mut units = self.units.write().expect("units poisoned");
        match units.get_mut(unit_name) {
            // A load that finished while transforming already ran every transformer.
            Some(unit) if Arc::ptr_eq(&unit.original, &original) => {
                unit.current = current.into();
                debug!(unit = unit_name, "retransformed");
            }
            Some(_) => debug!(unit = unit_name, "unit reloaded during retransform, keeping reload"),
            None => return Err(RetransformError::NotLoaded(unit_name.to_owned())),
        }
        Ok(())
    }
}

struct LoadedUnit {
    original: Arc<[u8]>,
    current: Arc<[u8]>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unit rejected: {0}")]
    Rejected(#[from] RewriteError),
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("unit `{0}` is not loaded")]
    NotLoaded(String),
    #[error(transparent)]
    Decode(#[from] ReadUnitError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}
