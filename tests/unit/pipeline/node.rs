use super::*;

use crate::dataset::{DataKind, ImageData};
use crate::foundation::core::Extent;
use crate::pipeline::algorithm::set_output;
use crate::pipeline::keys::WHOLE_EXTENT;

struct Source {
    level: i64,
}

impl Algorithm for Source {
    fn name(&self) -> &str {
        "source"
    }

    fn request_information(
        &mut self,
        _inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        outputs[0].set(&WHOLE_EXTENT, Extent::new(0, 3, 0, 3, 0, 0));
        Ok(())
    }

    fn request_data(
        &mut self,
        _inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        set_output(outputs, 0, ImageData::new(Extent::new(0, 3, 0, 3, 0, 0)))
    }

    fn fingerprint(&self) -> Option<Fingerprint> {
        let mut h = StableHasher::new();
        h.write_i64(self.level);
        Some(h.finish())
    }
}

struct Filter {
    repeatable: bool,
}

impl Algorithm for Filter {
    fn name(&self) -> &str {
        "filter"
    }

    fn input_ports(&self) -> Vec<InputPortSpec> {
        let spec = InputPortSpec::new("input", &[DataKind::Image]);
        vec![if self.repeatable { spec.repeatable() } else { spec }]
    }

    fn request_data(
        &mut self,
        _inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        set_output(outputs, 0, ImageData::new(Extent::EMPTY))
    }
}

struct PolySink;

impl Algorithm for PolySink {
    fn name(&self) -> &str {
        "poly_sink"
    }

    fn input_ports(&self) -> Vec<InputPortSpec> {
        vec![InputPortSpec::new("input", &[DataKind::Poly])]
    }

    fn request_data(
        &mut self,
        _inputs: &[Vec<Information>],
        _outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        Ok(())
    }
}

fn filter() -> Arc<Node> {
    Node::new(Filter { repeatable: false })
}

#[test]
fn ports_come_from_the_algorithm() {
    let n = filter();
    assert_eq!(n.name(), "filter");
    assert_eq!(n.input_specs().len(), 1);
    assert_eq!(n.output_specs()[0].kind, DataKind::Image);
    assert!(Node::new(Source { level: 0 }).input_specs().is_empty());
}

#[test]
fn connections_register_consumers() {
    let src = Node::new(Source { level: 0 });
    let f = filter();
    f.set_input_connection(0, &src, 0).unwrap();
    assert_eq!(f.number_of_input_connections(0), 1);
    assert!(Arc::ptr_eq(&f.input_algorithm(0, 0).unwrap(), &src));
    assert_eq!(src.consumers(0).len(), 1);
    assert_eq!(src.consumer_count(0), 1);

    assert!(f.remove_input_connection(0, &src, 0));
    assert!(!f.remove_input_connection(0, &src, 0));
    assert_eq!(src.consumer_count(0), 0);
}

#[test]
fn dropped_consumers_are_not_counted() {
    let src = Node::new(Source { level: 0 });
    {
        let f = filter();
        f.set_input_connection(0, &src, 0).unwrap();
        assert_eq!(src.consumer_count(0), 1);
    }
    assert_eq!(src.consumer_count(0), 0);
}

#[test]
fn single_ports_reject_a_second_connection() {
    let a = Node::new(Source { level: 0 });
    let b = Node::new(Source { level: 1 });
    let f = filter();
    f.add_input_connection(0, &a, 0).unwrap();
    assert!(matches!(
        f.add_input_connection(0, &b, 0),
        Err(VoxflowError::BadInput(_))
    ));

    let many = Node::new(Filter { repeatable: true });
    many.add_input_connection(0, &a, 0).unwrap();
    many.add_input_connection(0, &b, 0).unwrap();
    assert_eq!(many.number_of_input_connections(0), 2);
    many.remove_all_input_connections(0);
    assert_eq!(many.number_of_input_connections(0), 0);
}

#[test]
fn kind_mismatch_is_rejected() {
    let src = Node::new(Source { level: 0 });
    let sink = Node::new(PolySink);
    assert!(matches!(
        sink.set_input_connection(0, &src, 0),
        Err(VoxflowError::PortTypeMismatch(_))
    ));
    assert!(matches!(
        sink.set_input_connection(3, &src, 0),
        Err(VoxflowError::BadInput(_))
    ));
}

#[test]
fn loops_are_rejected() {
    let a = filter();
    let b = filter();
    b.set_input_connection(0, &a, 0).unwrap();
    assert!(matches!(
        a.set_input_connection(0, &b, 0),
        Err(VoxflowError::CycleDetected(_))
    ));
    assert!(matches!(
        a.set_input_connection(0, &a, 0),
        Err(VoxflowError::CycleDetected(_))
    ));
    assert!(b.depends_on(&a));
    assert!(!a.depends_on(&b));
}

#[test]
fn configure_marks_modified_and_checks_type() {
    let src = Node::new(Source { level: 0 });
    let before = src.mtime();
    src.configure::<Source, _>(|s| s.level = 7).unwrap();
    assert!(src.mtime() > before);
    assert_eq!(src.inspect::<Source, _>(|s| s.level).unwrap(), 7);
    assert!(matches!(
        src.configure::<Filter, _>(|_| ()),
        Err(VoxflowError::Validation(_))
    ));
}

#[test]
fn pipeline_mtime_tracks_upstream_changes() {
    let src = Node::new(Source { level: 0 });
    let f = filter();
    f.set_input_connection(0, &src, 0).unwrap();
    let before = f.pipeline_mtime();
    src.modified();
    assert!(f.pipeline_mtime() > before);
}

#[test]
fn fingerprint_needs_every_stage() {
    let src = Node::new(Source { level: 1 });
    let other = Node::new(Source { level: 2 });
    assert!(src.pipeline_fingerprint().is_some());
    assert_ne!(src.pipeline_fingerprint(), other.pipeline_fingerprint());

    let f = filter();
    f.set_input_connection(0, &src, 0).unwrap();
    assert_eq!(f.pipeline_fingerprint(), None);
}

#[test]
fn port_state_follows_lifecycle() {
    let src = Node::new(Source { level: 0 });
    assert_eq!(src.port_state(0), PortState::Unconnected);
    let f = filter();
    f.set_input_connection(0, &src, 0).unwrap();
    assert_eq!(src.port_state(0), PortState::Connected);
    src.update_information().unwrap();
    assert_eq!(src.port_state(0), PortState::Informed);
    src.update().unwrap();
    assert_eq!(src.port_state(0), PortState::Executed);
    src.modified();
    assert_eq!(src.port_state(0), PortState::Stale);
}
