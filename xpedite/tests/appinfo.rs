use std::{
    fs,
    sync::{Arc, Barrier},
    thread,
};

use tempfile::tempdir;
use xpedite::{
    CallsiteRegistry, Probe,
    appinfo::{self, AppInfoRecord, Attributes},
};

fn demo_probes(registry: &CallsiteRegistry) -> Vec<Probe> {
    vec![
        Probe::anchored(registry, "App", "doCompute", 12),
        Probe::scoped(registry, "App", "doCompute"),
        Probe::scoped(registry, "App", "doIo"),
    ]
}

#[test]
fn anchored_record() {
    let registry = CallsiteRegistry::new();
    let probe = Probe::anchored(&registry, "App", "doCompute", 12);

    let record = AppInfoRecord::new(&probe, &probe.call_sites()[0]);

    assert_eq!(record.attributes(), Attributes::None);
    assert_eq!(
        record.to_string(),
        "Id=0x1 | Probe=0x1 | CallSite=0x1 | RecorderReturnSite=0x1 | Status=disabled \
        | Name=App.doCompute:12 | File=App.java | Line=12 | Function=doCompute \
        | Attributes=None"
    );
}

#[test]
fn scoped_records() {
    let registry = CallsiteRegistry::new();
    let probes = vec![Probe::scoped(&registry, "App", "doCompute")];

    let lines = appinfo::records(&probes)
        .map(|record| record.to_string())
        .collect::<Vec<_>>();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Id=0x1 |"));
    assert!(lines[0].contains("| Name=App.doComputeBegin |"));
    assert!(lines[0].contains("| Line=0 |"));
    assert!(lines[0].contains("| Function=doCompute |"));
    assert!(lines[0].ends_with("| Attributes=canBeginTxn"));
    assert!(lines[1].starts_with("Id=0x2 |"));
    assert!(lines[1].contains("| Name=App.doComputeEnd |"));
    assert!(lines[1].contains("| Line=0 |"));
    assert!(lines[1].contains("| Function=doCompute |"));
    assert!(lines[1].ends_with("| Attributes=canEndTxn"));
}

#[test]
fn ids_are_hexadecimal() {
    let registry = CallsiteRegistry::new();
    for _ in 0..25 {
        registry.next_id();
    }
    let probe = Probe::anchored(&registry, "App", "run", 3);

    let record = AppInfoRecord::new(&probe, &probe.call_sites()[0]).to_string();

    assert!(record.starts_with("Id=0x1a | Probe=0x1a | CallSite=0x1a | RecorderReturnSite=0x1a |"));
}

#[test]
fn append_writes_one_line_per_call_site() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(appinfo::APPINFO_FILE_NAME);
    let registry = CallsiteRegistry::new();
    let probes = demo_probes(&registry);

    appinfo::append_records(&path, &probes).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines = contents.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 5);
    for (idx, line) in lines.iter().enumerate() {
        assert!(line.starts_with(&format!("Id={:#x} |", idx + 1)));
    }
    assert!(lines[0].ends_with("Attributes=None"));
    assert!(lines[1].ends_with("Attributes=canBeginTxn"));
    assert!(lines[2].ends_with("Attributes=canEndTxn"));
    assert!(lines[3].contains("Function=doIo"));
    assert!(lines[4].ends_with("Attributes=canEndTxn"));
}

#[test]
fn append_keeps_existing_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(appinfo::APPINFO_FILE_NAME);
    let registry = CallsiteRegistry::new();

    let first = vec![Probe::anchored(&registry, "App", "doCompute", 12)];
    let second = vec![Probe::scoped(&registry, "App", "doIo")];
    appinfo::append_records(&path, &first).unwrap();
    appinfo::append_records(&path, &second).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let ids = contents
        .lines()
        .map(|line| line.split(" | ").next().unwrap().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["Id=0x1", "Id=0x2", "Id=0x3"]);
}

#[test]
fn concurrent_appends_do_not_interleave() {
    const THREADS: usize = 8;
    const PROBES_PER_BATCH: usize = 16;
    const LINES_PER_BATCH: usize = PROBES_PER_BATCH * 2;

    let dir = tempdir().unwrap();
    let path = dir.path().join(appinfo::APPINFO_FILE_NAME);
    let registry = CallsiteRegistry::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    thread::scope(|scope| {
        for batch in 0..THREADS {
            let (path, registry, barrier) = (&path, &registry, Arc::clone(&barrier));
            scope.spawn(move || {
                let class = format!("Batch{batch}");
                let probes = (0..PROBES_PER_BATCH)
                    .map(|idx| Probe::scoped(registry, &class, &format!("method{idx}")))
                    .collect::<Vec<_>>();
                barrier.wait();
                appinfo::append_records(path, &probes).unwrap();
            });
        }
    });

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.ends_with('\n'));
    let lines = contents.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), THREADS * LINES_PER_BATCH);
    for line in &lines {
        let fields = line.split(" | ").collect::<Vec<_>>();
        assert_eq!(fields.len(), 10, "{line}");
        assert!(fields[0].starts_with("Id=0x"), "{line}");
        assert!(fields[9].starts_with("Attributes=can"), "{line}");
    }

    let file_of = |line: &str| {
        line.split(" | ")
            .find_map(|field| field.strip_prefix("File="))
            .unwrap()
            .to_owned()
    };
    let mut seen = Vec::new();
    for batch in lines.chunks(LINES_PER_BATCH) {
        let file = file_of(batch[0]);
        assert!(batch.iter().all(|line| file_of(line) == file), "{batch:?}");
        seen.push(file);
    }
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), THREADS);
}

#[test]
fn append_fails_when_file_cannot_be_opened() {
    let dir = tempdir().unwrap();
    let registry = CallsiteRegistry::new();
    let probes = demo_probes(&registry);

    // A directory can't be opened for appending.
    let result = appinfo::append_records(dir.path(), &probes);

    assert!(result.is_err());
}
