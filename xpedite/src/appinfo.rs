//! App-info records describing call sites for the analysis engine.
//!
//! Each call site is written as one line of `|` separated `key=value` fields:
//!
//! ```text
//! Id=0x1 | Probe=0x1 | CallSite=0x1 | RecorderReturnSite=0x1 | Status=disabled | Name=App.doCompute:12 | File=App.java | Line=12 | Function=doCompute | Attributes=None
//! ```
//!
//! The analysis engine parses the hexadecimal Id and matches it against the Ids passed to the
//! record entry point.

use std::{
    fmt,
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
    sync::Mutex,
};

use crate::{
    callsite::{CallSite, LocationMarker},
    probe::Probe,
};

/// Default name of the app-info file, relative to the working directory.
pub const APPINFO_FILE_NAME: &str = "xpedite-appinfo.txt";

/// Transaction role of a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attributes {
    None,
    CanBeginTxn,
    CanEndTxn,
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "None",
            Self::CanBeginTxn => "canBeginTxn",
            Self::CanEndTxn => "canEndTxn",
        })
    }
}

/// One app-info line.
#[derive(Debug, Clone)]
pub struct AppInfoRecord<'a> {
    call_site: &'a CallSite,
    file: String,
    attributes: Attributes,
}

impl<'a> AppInfoRecord<'a> {
    pub fn new(probe: &Probe, call_site: &'a CallSite) -> Self {
        let attributes = match (probe, call_site.marker()) {
            (Probe::Anchored(_), _) => Attributes::None,
            (Probe::Scoped(_), LocationMarker::End) => Attributes::CanEndTxn,
            (Probe::Scoped(_), _) => Attributes::CanBeginTxn,
        };
        Self {
            call_site,
            file: probe.file_path(),
            attributes,
        }
    }

    pub fn attributes(&self) -> Attributes {
        self.attributes
    }
}

impl fmt::Display for AppInfoRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.call_site.id().as_u32();
        write!(
            f,
            "Id={id:#x} | Probe={id:#x} | CallSite={id:#x} | RecorderReturnSite={id:#x} \
            | Status=disabled | Name={name} | File={file} | Line={line} | Function={function} \
            | Attributes={attributes}",
            name = self.call_site.name(),
            file = self.file,
            line = self.call_site.marker().reported_line(),
            function = self.call_site.method_name(),
            attributes = self.attributes,
        )
    }
}

/// Records for every call site of `probes`, in declaration order.
pub fn records(probes: &[Probe]) -> impl Iterator<Item = AppInfoRecord<'_>> {
    probes.iter().flat_map(|probe| {
        probe
            .call_sites()
            .iter()
            .map(move |call_site| AppInfoRecord::new(probe, call_site))
    })
}

/// Append one line per call site of `probes` to the app-info file at `path`.
///
/// The whole batch is rendered first and written with a single write while holding a process-wide
/// lock, so batches from concurrent activations never interleave.
pub fn append_records(path: &Path, probes: &[Probe]) -> io::Result<()> {
    static APPEND_LOCK: Mutex<()> = Mutex::new(());

    let mut batch = String::new();
    for record in records(probes) {
        batch.push_str(&record.to_string());
        batch.push('\n');
    }

    let _guard = APPEND_LOCK.lock().expect("app-info lock poisoned");
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(batch.as_bytes())?;
    file.flush()
}
