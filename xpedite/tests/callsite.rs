use std::{collections::BTreeSet, sync::Arc, thread};

use xpedite::{CallsiteId, CallsiteRegistry, LocationMarker, Probe};

#[test]
fn registry_starts_at_one() {
    let registry = CallsiteRegistry::new();

    assert_eq!(registry.next_id(), CallsiteId::from(1));
    assert_eq!(registry.next_id(), CallsiteId::from(2));
    assert_eq!(registry.next_id(), CallsiteId::from(3));
}

#[test]
fn process_registry_is_monotonic() {
    let first = CallsiteRegistry::process().next_id();
    let second = CallsiteRegistry::process().next_id();

    assert!(first >= CallsiteId::from(1));
    assert!(second > first);
}

#[test]
fn concurrent_ids_are_unique() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 1_000;
    let registry = Arc::new(CallsiteRegistry::new());

    let handles = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|_| registry.next_id())
                    .collect::<Vec<_>>()
            })
        })
        .collect::<Vec<_>>();

    let mut all = BTreeSet::new();
    for handle in handles {
        let ids = handle.join().unwrap();
        // Each thread sees its own Ids strictly increasing.
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        all.extend(ids);
    }

    assert_eq!(all.len(), THREADS * PER_THREAD);
    assert_eq!(all.first(), Some(&CallsiteId::from(1)));
    assert_eq!(
        all.last(),
        Some(&CallsiteId::from((THREADS * PER_THREAD) as u32))
    );
}

#[test]
fn call_site_names() {
    let registry = CallsiteRegistry::new();
    let anchored = Probe::anchored(&registry, "com/xpedite/demo/App", "doCompute", 12);
    let scoped = Probe::scoped(&registry, "com/xpedite/demo/App", "doIo");

    assert_eq!(
        anchored.call_sites()[0].name(),
        "com/xpedite/demo/App.doCompute:12"
    );
    assert_eq!(
        scoped.call_sites()[0].name(),
        "com/xpedite/demo/App.doIoBegin"
    );
    assert_eq!(
        scoped.call_sites()[1].name(),
        "com/xpedite/demo/App.doIoEnd"
    );
}

#[test]
fn reported_line_for_markers() {
    assert_eq!(LocationMarker::Begin.reported_line(), 0);
    assert_eq!(LocationMarker::End.reported_line(), 0);
    assert_eq!(LocationMarker::Line(42).reported_line(), 42);
}
