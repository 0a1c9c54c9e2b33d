use xpedite::{
    BridgeError, CallsiteId, CallsiteRegistry, EngineLoader, HeaderError, Probe, ProbeDescriptor,
    RecordingEngine,
    unit::{self, Unit},
};
use xpedite_recorder::{
    StreamEngine, StreamEngineLoader,
    stream::{self, ReadStreamError, RecordData},
};

#[test]
fn samples_are_read_back_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("samples.xpd");
    let engine = StreamEngine::create(&path).unwrap();
    let registry = CallsiteRegistry::new();
    let probe = Probe::scoped(&registry, "com/xpedite/demo/App", "doIo");

    engine.activate_probes(&[ProbeDescriptor::from(&probe)]);
    for id in [1, 2, 1, 2] {
        engine.record_event(CallsiteId::from(id));
    }
    engine.flush().unwrap();

    assert_eq!(engine.record_count(), 5);
    let records = stream::from_path(&path).unwrap();
    let data = records.iter().map(|record| &record.data).collect::<Vec<_>>();
    assert_eq!(
        data[0],
        &RecordData::Activated {
            call_sites: vec![CallsiteId::from(1), CallsiteId::from(2)],
        }
    );
    let samples = data[1..]
        .iter()
        .map(|data| match data {
            RecordData::Sample { call_site } => call_site.as_u32(),
            other => panic!("unexpected record: {other:?}"),
        })
        .collect::<Vec<_>>();
    assert_eq!(samples, vec![1, 2, 1, 2]);

    let timestamps = records
        .iter()
        .map(|record| record.meta.timestamp.as_duration_since_epoch())
        .collect::<Vec<_>>();
    assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn empty_stream_has_no_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("samples.xpd");
    let engine = StreamEngine::create(&path).unwrap();
    engine.flush().unwrap();

    let records = stream::from_path(&path).unwrap();

    assert!(records.is_empty());
}

#[test]
fn truncated_record_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("samples.xpd");
    let engine = StreamEngine::create(&path).unwrap();
    engine.record_event(CallsiteId::from(1));
    engine.record_event(CallsiteId::from(2));
    engine.flush().unwrap();

    let mut raw = std::fs::read(&path).unwrap();
    raw.pop();
    std::fs::write(&path, raw).unwrap();

    let error = stream::from_path(&path).unwrap_err();

    assert!(matches!(error, ReadStreamError::RecordInvalid { idx: 1, .. }));
}

#[test]
fn encoded_unit_is_not_a_sample_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unit.xpd");
    std::fs::write(&path, unit::encode(&Unit::new("App")).unwrap()).unwrap();

    let error = stream::from_path(&path).unwrap_err();

    assert!(matches!(
        error,
        ReadStreamError::Header(HeaderError::Incompatible { .. })
    ));
}

#[test]
fn loader_creates_the_samples_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("samples.xpd");
    let loader = StreamEngineLoader::new(&path);

    let engine = loader.load().unwrap();
    engine.record_event(CallsiteId::from(3));
    engine.flush().unwrap();

    let records = stream::from_path(&path).unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn loader_reports_unavailable_engine() {
    let dir = tempfile::tempdir().unwrap();
    let loader = StreamEngineLoader::new(dir.path().join("missing").join("samples.xpd"));

    let error = loader.load().err().unwrap();

    assert!(matches!(error, BridgeError::Unavailable { .. }));
}
