//! Insertion of trampolines into units of code.
//!
//! The [`Rewriter`] is a pure pass: raw unit in, raw unit (or an explicit failure) out. It holds no
//! cross-unit state, so separate units can be rewritten on separate threads at the same time. A
//! unit's decoded representation is owned by the call that decoded it and dropped on every exit
//! path.
//!
//! Failures are split by scope. A call site whose method or line can't be found is skipped and
//! reported in [`RewrittenUnit::sites`]; the other call sites of the unit are still processed. A
//! unit that can't be decoded or re-encoded is a [`RewriteError`], and no bytes are returned for
//! it at all.

use std::{mem, sync::Arc};

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    callsite::{CallSite, CallsiteId, LocationMarker},
    probe::Probe,
    trampoline::build_trampoline,
    unit::{self, Instr, Method, Op, ReadUnitError, Unit, WriteUnitError},
};

/// Rewrites units targeted by a fixed set of probes.
#[derive(Debug, Clone)]
pub struct Rewriter {
    probes: Arc<[Probe]>,
}

impl Rewriter {
    pub fn new(probes: impl Into<Arc<[Probe]>>) -> Self {
        Self {
            probes: probes.into(),
        }
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    /// Whether any probe targets the unit named `unit_name`.
    pub fn targets(&self, unit_name: &str) -> bool {
        self.probes
            .iter()
            .any(|probe| probe.class_name() == unit_name)
    }

    /// Rewrite the unit named `unit_name`, whose raw bytes are `raw`.
    ///
    /// Units no probe targets are not decoded and come back as [`UnitRewrite::Unmodified`]. The
    /// same is true when every matching call site had to be skipped.
    pub fn rewrite(&self, unit_name: &str, raw: &[u8]) -> Result<UnitRewrite, RewriteError> {
        if !self.targets(unit_name) {
            return Ok(UnitRewrite::Unmodified);
        }

        let mut unit = unit::decode(raw).map_err(|source| {
            error!(unit = unit_name, %source, "cannot resolve unit for rewriting");
            RewriteError::Resolution {
                unit: unit_name.to_owned(),
                source,
            }
        })?;
        if unit.name != unit_name {
            error!(
                unit = unit_name,
                decoded = %unit.name,
                "decoded unit name does not match"
            );
            return Err(RewriteError::NameMismatch {
                unit: unit_name.to_owned(),
                decoded: unit.name,
            });
        }

        let sites = self
            .probes
            .iter()
            .filter(|probe| probe.class_name() == unit_name)
            .flat_map(Probe::call_sites)
            .map(|call_site| SiteReport {
                call_site: call_site.id(),
                outcome: instrument(&mut unit, call_site),
            })
            .collect::<Vec<_>>();

        if !sites.iter().any(|site| site.outcome == SiteOutcome::Inserted) {
            debug!(unit = unit_name, "no call sites inserted, unit unchanged");
            return Ok(UnitRewrite::Unmodified);
        }

        let raw = unit::encode(&unit).map_err(|source| {
            error!(unit = unit_name, %source, "cannot encode rewritten unit");
            RewriteError::Encode {
                unit: unit_name.to_owned(),
                source,
            }
        })?;

        Ok(UnitRewrite::Rewritten(RewrittenUnit { raw, sites }))
    }
}

fn instrument(unit: &mut Unit, call_site: &CallSite) -> SiteOutcome {
    let Some(method) = unit.method_mut(call_site.method_name()) else {
        let reason = SkipReason::MethodNotFound {
            method: call_site.method_name().to_owned(),
        };
        warn!(
            unit = %unit.name,
            call_site = %call_site.id(),
            %reason,
            "skipping call site"
        );
        return SiteOutcome::Skipped(reason);
    };

    match insert(method, call_site) {
        Ok(()) => SiteOutcome::Inserted,
        Err(reason) => {
            warn!(
                unit = %unit.name,
                call_site = %call_site.id(),
                %reason,
                "skipping call site"
            );
            SiteOutcome::Skipped(reason)
        }
    }
}

fn insert(method: &mut Method, call_site: &CallSite) -> Result<(), SkipReason> {
    let trampoline = build_trampoline(call_site.id());
    match call_site.marker() {
        LocationMarker::Begin => method.body.insert(0, trampoline),
        LocationMarker::End => {
            let body = mem::take(&mut method.body);
            method.body.push(Instr::synthetic(Op::Finally {
                body,
                handler: vec![trampoline],
            }));
        }
        LocationMarker::Line(line) => {
            if !insert_before_line(&mut method.body, line, trampoline) {
                return Err(SkipReason::LineNotInstrumentable {
                    method: method.name.clone(),
                    line,
                });
            }
        }
    }

    Ok(())
}

/// Insert `trampoline` before the first instruction tagged with `line`, searching depth first.
///
/// Returns `false` if no instruction carries that line.
fn insert_before_line(block: &mut Vec<Instr>, line: u32, trampoline: Instr) -> bool {
    let mut trampoline = Some(trampoline);
    insert_before_line_inner(block, line, &mut trampoline)
}

fn insert_before_line_inner(
    block: &mut Vec<Instr>,
    line: u32,
    trampoline: &mut Option<Instr>,
) -> bool {
    for idx in 0..block.len() {
        if block[idx].line == Some(line) {
            if let Some(trampoline) = trampoline.take() {
                block.insert(idx, trampoline);
            }
            return true;
        }
        for nested in block[idx].op.blocks_mut() {
            if insert_before_line_inner(nested, line, trampoline) {
                return true;
            }
        }
    }

    false
}

/// The result of presenting a unit to the [`Rewriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitRewrite {
    /// The original bytes should be used unchanged.
    Unmodified,
    /// At least one trampoline was inserted.
    Rewritten(RewrittenUnit),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenUnit {
    /// The encoded, rewritten unit.
    pub raw: Vec<u8>,
    /// One report per matching call site, in probe order.
    pub sites: Vec<SiteReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    pub call_site: CallsiteId,
    pub outcome: SiteOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteOutcome {
    Inserted,
    Skipped(SkipReason),
}

/// Why a single call site was not inserted. Never fatal for the unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("method `{method}` not found")]
    MethodNotFound { method: String },
    #[error("line {line} of method `{method}` has no instrumentable instruction")]
    LineNotInstrumentable { method: String, line: u32 },
}

/// A unit-scoped failure. The unit must not be loaded.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("cannot resolve unit `{unit}`: {source}")]
    Resolution {
        unit: String,
        source: ReadUnitError,
    },
    #[error("unit `{unit}` decoded as `{decoded}`")]
    NameMismatch { unit: String, decoded: String },
    #[error("cannot encode rewritten unit `{unit}`: {source}")]
    Encode {
        unit: String,
        source: WriteUnitError,
    },
}

impl RewriteError {
    /// The name of the unit that failed.
    pub fn unit(&self) -> &str {
        match self {
            Self::Resolution { unit, .. }
            | Self::NameMismatch { unit, .. }
            | Self::Encode { unit, .. } => unit,
        }
    }
}
