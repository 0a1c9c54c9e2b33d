use xpedite::{FormatHeader, FormatVariant, HeaderError};

#[test]
fn split_returns_payload() {
    let header = FormatHeader::new(FormatVariant::Unit, 0, 1);
    let mut raw = header.to_bytes().unwrap();
    raw.extend([1, 2, 3]);

    let payload = header.split(&raw).unwrap();

    assert_eq!(payload, &[1, 2, 3]);
}

#[test]
fn older_minor_is_readable() {
    let reader = FormatHeader::new(FormatVariant::Samples, 1, 3);
    let raw = FormatHeader::new(FormatVariant::Samples, 1, 2)
        .to_bytes()
        .unwrap();

    assert!(reader.split(&raw).unwrap().is_empty());
}

#[test]
fn newer_minor_is_rejected() {
    let reader = FormatHeader::new(FormatVariant::Unit, 0, 1);
    let written = FormatHeader::new(FormatVariant::Unit, 0, 2);

    let error = reader.split(&written.to_bytes().unwrap()).unwrap_err();

    assert!(matches!(
        error,
        HeaderError::Incompatible { found, .. } if found == written
    ));
}

#[test]
fn compatibility() {
    let reader = FormatHeader::new(FormatVariant::Unit, 1, 3);

    assert!(reader.can_read(&FormatHeader::new(FormatVariant::Unit, 1, 0)));
    assert!(reader.can_read(&reader));
    assert!(!reader.can_read(&FormatHeader::new(FormatVariant::Unit, 1, 4)));
    assert!(!reader.can_read(&FormatHeader::new(FormatVariant::Unit, 2, 0)));
    assert!(!reader.can_read(&FormatHeader::new(FormatVariant::Unit, 0, 3)));
    assert!(!reader.can_read(&FormatHeader::new(FormatVariant::Samples, 1, 3)));
}

#[test]
fn missing_magic_is_rejected() {
    let reader = FormatHeader::new(FormatVariant::Unit, 0, 1);
    // Same field layout as a header, different magic.
    let raw = postcard::to_stdvec(&(*b"ELF", FormatVariant::Unit, 0_u16, 1_u16)).unwrap();

    let error = reader.split(&raw).unwrap_err();

    assert!(matches!(error, HeaderError::NotXpedite));
}

#[test]
fn short_buffer_is_malformed() {
    let reader = FormatHeader::new(FormatVariant::Unit, 0, 1);

    let error = reader.split(b"XP").unwrap_err();

    assert!(matches!(error, HeaderError::Malformed(_)));
}

#[test]
fn display() {
    assert_eq!(
        FormatHeader::new(FormatVariant::Samples, 0, 1).to_string(),
        "xpd-s/0.1"
    );
}
