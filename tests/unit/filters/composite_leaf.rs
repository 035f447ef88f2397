use super::*;

use crate::dataset::{CompositeDataSet, ImageData};
use crate::filters::TrivialProducer;
use crate::foundation::core::Extent;
use crate::pipeline::{ExecutiveOpts, Node};

fn leaf(n: i32) -> Arc<DataObject> {
    Arc::new(ImageData::new(Extent::new(0, n, 0, 0, 0, 0)).into())
}

fn grow_by_one() -> CompositeLeafFilter {
    CompositeLeafFilter::new(|d| {
        let ext = d.extent().unwrap_or(Extent::EMPTY);
        Ok(ImageData::new(Extent::new(0, ext.0[1] + 1, 0, 0, 0, 0)).into())
    })
}

#[test]
fn maps_every_present_leaf() {
    let mut inner = CompositeDataSet::new();
    inner.push_leaf(Some(leaf(2)), Information::new());
    let mut tree = CompositeDataSet::new();
    tree.push_leaf(Some(leaf(1)), Information::new());
    tree.push_leaf(None, Information::new());
    tree.push_tree(inner, Information::new());

    let src = Node::with_opts(TrivialProducer::new(tree), ExecutiveOpts::in_memory());
    let f = Node::with_opts(grow_by_one(), ExecutiveOpts::in_memory());
    f.set_input_connection(0, &src, 0).unwrap();
    let out = f.update().unwrap();
    let out = out.as_composite().unwrap();
    let leaves = out.leaves();
    assert_eq!(leaves.len(), 3);
    assert_eq!(leaves[0].data.unwrap().number_of_points(), 3);
    assert!(leaves[1].data.is_none());
    assert_eq!(leaves[2].data.unwrap().number_of_points(), 4);
}

#[test]
fn unchanged_leaves_are_reused() {
    let a = leaf(1);
    let b = leaf(2);
    let mut tree = CompositeDataSet::new();
    tree.push_leaf(Some(Arc::clone(&a)), Information::new());
    tree.push_leaf(Some(Arc::clone(&b)), Information::new());

    let src = Node::with_opts(TrivialProducer::new(tree), ExecutiveOpts::in_memory());
    let f = Node::with_opts(grow_by_one(), ExecutiveOpts::in_memory());
    f.set_input_connection(0, &src, 0).unwrap();
    f.update().unwrap();
    assert_eq!(f.inspect::<CompositeLeafFilter, _>(|c| c.evaluations()).unwrap(), 2);

    let mut changed = CompositeDataSet::new();
    changed.push_leaf(Some(Arc::clone(&a)), Information::new());
    changed.push_leaf(Some(leaf(5)), Information::new());
    src.configure::<TrivialProducer, _>(|p| p.set_data(changed))
        .unwrap()
        .unwrap();
    f.update().unwrap();
    let (evaluations, cached) = f
        .inspect::<CompositeLeafFilter, _>(|c| (c.evaluations(), c.cache().len()))
        .unwrap();
    assert_eq!(evaluations, 3);
    assert_eq!(cached, 2);
}

#[test]
fn non_composite_input_is_rejected() {
    let mut f = grow_by_one();
    let mut info = Information::new();
    info.set(&crate::pipeline::keys::DATA_OBJECT, leaf(1));
    let mut outputs = vec![Information::new()];
    assert!(matches!(
        f.request_data(&[vec![info]], &mut outputs),
        Err(VoxflowError::BadInput(_))
    ));
}
