use super::*;

use crate::array::AosArray;
use crate::dataset::{ImageData, PolyData};
use crate::foundation::core::Extent;
use crate::pipeline::{ExecutiveOpts, Node, UpdateRequest};

fn image() -> ImageData {
    let ext = Extent::new(0, 3, 0, 3, 0, 0);
    let mut img = ImageData::new(ext);
    let values: Vec<f32> = (0..16).map(|v| v as f32).collect();
    img.set_scalars(Arc::new(AosArray::from_vec(1, values).unwrap().named("s")))
        .unwrap();
    img
}

#[test]
fn publishes_image_information() {
    let node = Node::with_opts(TrivialProducer::new(image()), ExecutiveOpts::in_memory());
    let info = node.update_information().unwrap();
    assert_eq!(info[0].get(&WHOLE_EXTENT), Some(Extent::new(0, 3, 0, 3, 0, 0)));
    assert_eq!(info[0].get(&SCALAR_RANGE), Some([0.0, 15.0]));
    assert_eq!(info[0].get(&CAN_PRODUCE_SUB_EXTENT), Some(true));
}

#[test]
fn whole_request_shares_the_object() {
    let producer = TrivialProducer::new(image());
    let wrapped = Arc::clone(producer.data());
    let node = Node::with_opts(producer, ExecutiveOpts::in_memory());
    let out = node.update().unwrap();
    assert!(Arc::ptr_eq(&out, &wrapped));
}

#[test]
fn sub_extent_is_cropped() {
    let node = Node::with_opts(TrivialProducer::new(image()), ExecutiveOpts::in_memory());
    let sub = Extent::new(1, 2, 2, 3, 0, 0);
    let out = node.update_port(0, &UpdateRequest::extent(sub)).unwrap();
    let img = out.as_image().unwrap();
    assert_eq!(img.extent(), sub);
    assert_eq!(img.scalars().unwrap().component(0, 0), 9.0);
}

#[test]
fn replacing_data_reexecutes() {
    let node = Node::with_opts(TrivialProducer::new(image()), ExecutiveOpts::in_memory());
    node.update().unwrap();
    node.configure::<TrivialProducer, _>(|p| p.set_data(ImageData::new(Extent::new(0, 1, 0, 0, 0, 0))))
        .unwrap()
        .unwrap();
    let out = node.update().unwrap();
    assert_eq!(out.extent(), Some(Extent::new(0, 1, 0, 0, 0, 0)));
    assert_eq!(node.executive().request_data_count(), 2);
}

#[test]
fn kind_is_fixed() {
    let mut p = TrivialProducer::new(PolyData::new(AosArray::new(3)).unwrap());
    assert_eq!(p.kind(), DataKind::Poly);
    assert!(matches!(
        p.set_data(image()),
        Err(VoxflowError::Validation(_))
    ));
}
