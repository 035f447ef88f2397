use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VoxflowError::bad_input("x")
            .to_string()
            .contains("bad input:")
    );
    assert!(
        VoxflowError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        VoxflowError::numeric_domain("x")
            .to_string()
            .contains("numeric domain error:")
    );
    assert!(
        VoxflowError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert_eq!(VoxflowError::Aborted.to_string(), "aborted");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VoxflowError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn producer_failed_nests_and_exposes_root_cause() {
    let err = VoxflowError::Aborted
        .producer_failed("source", 0)
        .producer_failed("smooth", 1);
    assert_eq!(err.kind(), ErrorKind::ProducerFailed);
    assert_eq!(err.root_cause().kind(), ErrorKind::Aborted);

    let msg = err.to_string();
    assert!(msg.contains("'smooth'"));
    assert!(msg.contains("port 1"));
}

#[test]
fn index_out_of_range_reports_len() {
    let err = VoxflowError::IndexOutOfRange { index: 7, len: 3 };
    assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
    assert!(err.to_string().contains("len 3"));
}
