use msz_core::{Assumption, Provenance};

#[test]
fn markers_are_bit_exact() {
    assert_eq!(Provenance::Cited.marker().as_bytes(), "📚".as_bytes());
    assert_eq!(Provenance::Derived.marker().as_bytes(), "🧮".as_bytes());
    assert_eq!(
        Provenance::Estimated.marker().as_bytes(),
        &[0xE2, 0x9A, 0xA0, 0xEF, 0xB8, 0x8F]
    );
}

#[test]
fn parses_markers_and_labels() {
    for tag in Provenance::ALL {
        assert_eq!(tag.marker().parse::<Provenance>().unwrap(), tag);
        assert_eq!(tag.label().parse::<Provenance>().unwrap(), tag);
    }
    let err = "guess".parse::<Provenance>().unwrap_err();
    assert_eq!(err.info().code, "unknown-provenance");
}

#[test]
fn serializes_as_label_and_reads_markers() {
    let assumption = Assumption::new("ka_count", "KA institutions", 5000.0)
        .with_provenance(Provenance::Cited);
    let json = serde_json::to_value(&assumption).unwrap();
    assert_eq!(json["provenance"], "cited");

    let raw = r#"{"key":"wtp_ratio","name":"WTP","numeric_value":0.1,"provenance":"🧮"}"#;
    let decoded: Assumption = serde_json::from_str(raw).unwrap();
    assert_eq!(decoded.provenance, Provenance::Derived);
    assert_eq!(decoded.display_value, "");
}

#[test]
fn default_tag_is_estimated() {
    assert_eq!(Provenance::default(), Provenance::Estimated);
    assert_eq!(Provenance::Estimated.to_string(), "⚠️");
}
