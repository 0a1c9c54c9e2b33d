//! The boundary with whatever loads code into the running process.
//!
//! A substrate presents each unit it loads to every registered [`Transformer`] and can present
//! already loaded units again on request. The [`Rewriter`] is the transformer this crate
//! registers.

use std::sync::Arc;

use thiserror::Error;

use crate::rewrite::{RewriteError, Rewriter, UnitRewrite};

/// A callback that may replace a unit's raw bytes as it is loaded.
pub trait Transformer: Send + Sync {
    /// Returns `Ok(None)` to keep `raw` unchanged, `Ok(Some(bytes))` to load `bytes` instead.
    ///
    /// An error means the unit must not be loaded at all.
    fn transform(&self, unit_name: &str, raw: &[u8]) -> Result<Option<Vec<u8>>, RewriteError>;
}

impl Transformer for Rewriter {
    fn transform(&self, unit_name: &str, raw: &[u8]) -> Result<Option<Vec<u8>>, RewriteError> {
        match self.rewrite(unit_name, raw)? {
            UnitRewrite::Unmodified => Ok(None),
            UnitRewrite::Rewritten(rewritten) => Ok(Some(rewritten.raw)),
        }
    }
}

/// A code-loading substrate.
pub trait CodeLoader {
    /// Register `transformer` for every unit loaded or retransformed from now on.
    fn add_transformer(&self, transformer: Arc<dyn Transformer>);

    /// Stop presenting units to `transformer`. Units it already rewrote keep their bytes until
    /// they are retransformed.
    fn remove_transformer(&self, transformer: &Arc<dyn Transformer>);

    /// Names of all units currently loaded.
    fn loaded_units(&self) -> Vec<String>;

    /// Present the loaded unit `unit_name` to the registered transformers again.
    fn retransform(&self, unit_name: &str) -> Result<(), RetransformError>;
}

#[derive(Debug, Error)]
pub enum RetransformError {
    /// The substrate can't patch this unit any more.
    #[error("unit `{0}` cannot be modified")]
    Unmodifiable(String),
    /// The unit isn't loaded.
    #[error("unit `{0}` is not loaded")]
    NotLoaded(String),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}
