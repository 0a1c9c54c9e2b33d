//! Probes are declarative requests to observe one or two locations in a method.

use std::sync::Arc;

use crate::callsite::{CallSite, CallsiteRegistry, LocationMarker};

/// A request to record crossings of locations in one method.
///
/// Probes own their call sites and are immutable once constructed. Constructing a probe mints
/// its call site Ids, so construction order decides Id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// One call site at an explicit source line.
    Anchored(AnchoredProbe),
    /// Two call sites bracketing a method, begin then end.
    Scoped(ScopedProbe),
}

impl Probe {
    /// Create an anchored probe at `line` of `class_name::method_name`.
    pub fn anchored(
        registry: &CallsiteRegistry,
        class_name: &str,
        method_name: &str,
        line: u32,
    ) -> Self {
        Self::Anchored(AnchoredProbe::new(
            registry,
            class_name,
            method_name,
            line,
        ))
    }

    /// Create a scoped probe around `class_name::method_name`.
    pub fn scoped(registry: &CallsiteRegistry, class_name: &str, method_name: &str) -> Self {
        Self::Scoped(ScopedProbe::new(registry, class_name, method_name))
    }

    pub fn class_name(&self) -> &str {
        match self {
            Self::Anchored(probe) => &probe.class_name,
            Self::Scoped(probe) => &probe.class_name,
        }
    }

    pub fn method_name(&self) -> &str {
        match self {
            Self::Anchored(probe) => &probe.method_name,
            Self::Scoped(probe) => &probe.method_name,
        }
    }

    /// Call sites in construction order, begin before end for scoped probes.
    pub fn call_sites(&self) -> &[CallSite] {
        match self {
            Self::Anchored(probe) => std::slice::from_ref(&probe.call_site),
            Self::Scoped(probe) => &probe.call_sites,
        }
    }

    /// The source file the probe's class is declared in.
    pub fn file_path(&self) -> String {
        format!("{}.java", self.class_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredProbe {
    class_name: Arc<str>,
    method_name: Arc<str>,
    call_site: CallSite,
}

impl AnchoredProbe {
    fn new(registry: &CallsiteRegistry, class_name: &str, method_name: &str, line: u32) -> Self {
        let class_name: Arc<str> = class_name.into();
        let method_name: Arc<str> = method_name.into();
        let call_site = CallSite::new(
            registry,
            Arc::clone(&class_name),
            Arc::clone(&method_name),
            LocationMarker::Line(line),
        );
        Self {
            class_name,
            method_name,
            call_site,
        }
    }

    pub fn line(&self) -> u32 {
        self.call_site.marker().reported_line()
    }

    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedProbe {
    class_name: Arc<str>,
    method_name: Arc<str>,
    call_sites: [CallSite; 2],
}

impl ScopedProbe {
    fn new(registry: &CallsiteRegistry, class_name: &str, method_name: &str) -> Self {
        let class_name: Arc<str> = class_name.into();
        let method_name: Arc<str> = method_name.into();
        // Begin is minted first so its Id is always the smaller of the pair.
        let begin = CallSite::new(
            registry,
            Arc::clone(&class_name),
            Arc::clone(&method_name),
            LocationMarker::Begin,
        );
        let end = CallSite::new(
            registry,
            Arc::clone(&class_name),
            Arc::clone(&method_name),
            LocationMarker::End,
        );
        Self {
            class_name,
            method_name,
            call_sites: [begin, end],
        }
    }

    pub fn begin(&self) -> &CallSite {
        &self.call_sites[0]
    }

    pub fn end(&self) -> &CallSite {
        &self.call_sites[1]
    }
}

/// Wire description of a probe handed to the recording engine on activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeDescriptor {
    pub class_name: String,
    pub method_name: String,
    pub call_sites: Vec<(crate::CallsiteId, LocationMarker)>,
}

impl From<&Probe> for ProbeDescriptor {
    fn from(probe: &Probe) -> Self {
        Self {
            class_name: probe.class_name().to_owned(),
            method_name: probe.method_name().to_owned(),
            call_sites: probe
                .call_sites()
                .iter()
                .map(|call_site| (call_site.id(), call_site.marker()))
                .collect(),
        }
    }
}
