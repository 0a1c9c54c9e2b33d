//! A call site is one concrete instrumented location in application code.
//!
//! Call sites are created when probes are constructed and live for the rest of the process. Each
//! one is identified by a [`CallsiteId`] minted by a [`CallsiteRegistry`]; that identifier is the
//! only thing a trampoline passes to the recording engine when the location is crossed.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use serde::{Deserialize, Serialize};

/// The call site Id defines a unique call site.
///
/// Ids start at 1 and increase with every call site a registry creates. They cross the native
/// boundary as a 32-bit signed integer.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub struct CallsiteId(u32);

impl From<u32> for CallsiteId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl CallsiteId {
    /// The `u32` representation of the call site Id.
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// The Id as passed to the record entry point.
    pub fn as_i32(&self) -> i32 {
        // Registries never mint beyond `i32::MAX`.
        self.0 as i32
    }
}

impl fmt::Display for CallsiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where in a method a call site sits.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Deserialize, Serialize)]
pub enum LocationMarker {
    /// First operation of the method body.
    Begin,
    /// Every exit path of the method, including unwinding.
    End,
    /// Immediately before the instruction for this source line.
    Line(u32),
}

impl LocationMarker {
    /// The source line to report for this marker. Begin and end are reported as line `0`.
    pub fn reported_line(&self) -> u32 {
        match self {
            Self::Line(line) => *line,
            Self::Begin | Self::End => 0,
        }
    }
}

impl fmt::Display for LocationMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => write!(f, "begin"),
            Self::End => write!(f, "end"),
            Self::Line(line) => write!(f, "{line}"),
        }
    }
}

/// An instrumented location in an application.
///
/// Class and method names are shared with the owning probe and its other call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    id: CallsiteId,
    name: String,
    class_name: Arc<str>,
    method_name: Arc<str>,
    marker: LocationMarker,
}

impl CallSite {
    pub(crate) fn new(
        registry: &CallsiteRegistry,
        class_name: Arc<str>,
        method_name: Arc<str>,
        marker: LocationMarker,
    ) -> Self {
        let name = match marker {
            LocationMarker::Begin => format!("{class_name}.{method_name}Begin"),
            LocationMarker::End => format!("{class_name}.{method_name}End"),
            LocationMarker::Line(line) => format!("{class_name}.{method_name}:{line}"),
        };
        Self {
            id: registry.next_id(),
            name,
            class_name,
            method_name,
            marker,
        }
    }

    pub fn id(&self) -> CallsiteId {
        self.id
    }

    /// Name written to app-info: `<class>.<method>Begin`, `<class>.<method>End` or
    /// `<class>.<method>:<line>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn marker(&self) -> LocationMarker {
        self.marker
    }
}

/// Source of call site Ids.
///
/// The registry is the only thing that mints [`CallsiteId`]s. Ids are unique and strictly
/// increasing for the lifetime of the registry, including under concurrent use; across threads
/// the order reflects which `fetch` won, not wall-clock order.
///
/// Probes built for activation in a running process normally draw from [`process`], but any
/// registry may be passed to probe constructors explicitly.
///
/// [`process`]: CallsiteRegistry::process
#[derive(Debug)]
pub struct CallsiteRegistry {
    next: AtomicU32,
}

impl Default for CallsiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CallsiteRegistry {
    /// Create a registry whose first Id is 1.
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// The process-wide registry.
    pub fn process() -> &'static CallsiteRegistry {
        static PROCESS: CallsiteRegistry = CallsiteRegistry::new();
        &PROCESS
    }

    /// Mint the next call site Id.
    ///
    /// # Panics
    ///
    /// Panics once Ids are exhausted (beyond `i32::MAX`); Ids never wrap.
    pub fn next_id(&self) -> CallsiteId {
        let id = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                (next <= i32::MAX as u32).then_some(next + 1)
            })
            .expect("call site Ids exhausted");
        CallsiteId(id)
    }
}
