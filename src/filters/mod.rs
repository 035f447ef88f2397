//! Built-in algorithms.

/// Synthetic image source.
pub mod analytic_source;
/// Box filter over image scalars.
pub mod box_smooth;
/// Per-leaf processing of composite data.
pub mod composite_leaf;
/// Identity filter.
pub mod pass_through;
/// Wraps an existing data object.
pub mod trivial_producer;

pub use analytic_source::AnalyticImageSource;
pub use box_smooth::ImageBoxSmooth;
pub use composite_leaf::{CompositeLeafFilter, LeafOp};
pub use pass_through::PassThrough;
pub use trivial_producer::TrivialProducer;
