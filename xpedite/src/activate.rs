use std::{io, sync::Arc};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    appinfo,
    bridge::{Bridge, BridgeCell, BridgeError, EngineLoader},
    config::Config,
    probe::{Probe, ProbeDescriptor},
    rewrite::{RewriteError, Rewriter},
    substrate::{CodeLoader, RetransformError, Transformer},
};

/// Summary of a successful activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activation {
    pub probes: usize,
    pub call_sites: usize,
    /// Loaded units presented to the rewriter again.
    pub retransformed: usize,
    /// Loaded units the substrate could not patch. Their probes never fire.
    pub unmodifiable: Vec<String>,
}

/// Activation failed and the probes must be treated as inactive.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("failed to write app-info records: {0}")]
    Metadata(#[source] io::Error),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Load the process-wide bridge with `loader` if needed, then activate `probes` through it.
///
/// This is the single call an embedding application makes at startup.
pub fn activate_probes(
    probes: &[Probe],
    substrate: &dyn CodeLoader,
    loader: &dyn EngineLoader,
    config: &Config,
) -> Result<Activation, ActivationError> {
    BridgeCell::process()
        .get_or_load(loader)?
        .activate_probes(probes, substrate, config)
}

impl Bridge {
    /// Activate `probes` in a process whose code is loaded by `substrate`.
    ///
    /// App-info records are appended first; if they can't be written nothing else happens. The
    /// rewriter is then registered with the substrate and every loaded unit is presented to it
    /// again. Units the substrate can't patch are skipped. Finally the engine is told which call
    /// sites are live.
    ///
    /// If a loaded unit can't be rewritten, the rewriter is removed again and the units it already
    /// patched are retransformed without it before the error is returned. The app-info records
    /// stay, still marked disabled.
    ///
    /// Activating the same probes twice registers a second rewriter, so units rewritten by both
    /// carry two trampolines per call site.
    pub fn activate_probes(
        &self,
        probes: &[Probe],
        substrate: &dyn CodeLoader,
        config: &Config,
    ) -> Result<Activation, ActivationError> {
        appinfo::append_records(&config.appinfo_path, probes).map_err(ActivationError::Metadata)?;

        let rewriter: Arc<dyn Transformer> = Arc::new(Rewriter::new(probes.to_vec()));
        substrate.add_transformer(Arc::clone(&rewriter));

        let mut activation = Activation {
            probes: probes.len(),
            call_sites: probes.iter().map(|probe| probe.call_sites().len()).sum(),
            ..Default::default()
        };
        let mut retransformed = Vec::new();
        for unit_name in substrate.loaded_units() {
            match substrate.retransform(&unit_name) {
                Ok(()) => retransformed.push(unit_name),
                Err(RetransformError::Unmodifiable(_)) => {
                    debug!(unit = %unit_name, "unit cannot be modified, skipping");
                    activation.unmodifiable.push(unit_name);
                }
                Err(RetransformError::NotLoaded(_)) => {
                    debug!(unit = %unit_name, "unit unloaded during activation, skipping");
                }
                Err(RetransformError::Rewrite(err)) => {
                    roll_back(substrate, &rewriter, &retransformed);
                    return Err(err.into());
                }
            }
        }
        activation.retransformed = retransformed.len();

        let descriptors = probes.iter().map(ProbeDescriptor::from).collect::<Vec<_>>();
        self.engine().activate_probes(&descriptors);

        info!(
            probes = activation.probes,
            call_sites = activation.call_sites,
            retransformed = activation.retransformed,
            unmodifiable = activation.unmodifiable.len(),
            "probes activated"
        );
        Ok(activation)
    }
}

/// Remove `rewriter` and restore the units it was already applied to.
fn roll_back(substrate: &dyn CodeLoader, rewriter: &Arc<dyn Transformer>, patched: &[String]) {
    substrate.remove_transformer(rewriter);
    for unit_name in patched {
        if let Err(err) = substrate.retransform(unit_name) {
            error!(unit = %unit_name, %err, "failed to restore unit after failed activation");
        }
    }
}
