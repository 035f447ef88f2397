//! Typed arrays in array-of-structures and structure-of-arrays layouts.

/// Interleaved storage.
pub mod aos;
/// Object-safe array interface.
pub mod data_array;
pub mod persist;
/// Cached range computation.
pub mod range;
/// Element types.
pub mod scalar;
/// Per-component storage.
pub mod soa;

pub use aos::AosArray;
pub use data_array::{DataArray, Layout, TupleBody};
pub use range::EMPTY_RANGE;
pub use scalar::{Scalar, ScalarType};
pub use soa::SoaArray;
