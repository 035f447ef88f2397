use super::*;

#[test]
fn memory_sink_records_and_filters_by_severity() {
    let sink = MemorySink::new();
    sink.emit(&Diagnostic {
        severity: Severity::Info,
        source: "a".to_owned(),
        message: "hello".to_owned(),
    });
    sink.emit(&Diagnostic {
        severity: Severity::Error,
        source: "b".to_owned(),
        message: "boom".to_owned(),
    });
    assert_eq!(sink.events().len(), 2);
    assert_eq!(sink.count_at_least(Severity::Warning), 1);
    assert_eq!(sink.events()[1].source, "b");
}

#[test]
fn severity_orders_info_warning_error() {
    assert!(Severity::Info < Severity::Warning);
    assert!(Severity::Warning < Severity::Error);
}

#[test]
fn tracing_sink_accepts_every_severity() {
    for severity in [Severity::Info, Severity::Warning, Severity::Error] {
        TracingSink.emit(&Diagnostic {
            severity,
            source: "test".to_owned(),
            message: "msg".to_owned(),
        });
    }
}
