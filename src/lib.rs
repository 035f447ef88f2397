//! voxflow is a demand-driven visualization pipeline with a fixed-point volume ray caster.
//!
//! The crate is organised in layers:
//!
//! - [`array`] and [`dataset`]: typed arrays and the dataset variants built on them
//! - [`smp`]: `parallel_for`/`parallel_reduce` over a pluggable backend
//! - [`pipeline`]: algorithms connected through ports, updated on demand with caching and
//!   streaming
//! - [`volume`] and [`display`]: ray casting of image data and presentation of the result
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod array;
pub mod dataset;
pub mod display;
pub mod filters;
pub mod foundation;
pub mod pipeline;
pub mod smp;
pub mod volume;

pub use crate::foundation::abort::AbortFlag;
pub use crate::foundation::config::RuntimeConfig;
pub use crate::foundation::core::{Extent, TimeStamp};
pub use crate::foundation::diagnostics::{Diagnostic, DiagnosticSink, MemorySink, Severity};
pub use crate::foundation::error::{ErrorKind, VoxflowError, VoxflowResult};
pub use crate::foundation::math::{FP_SCALE, FP_SHIFT};

pub use crate::array::{AosArray, DataArray, ScalarType, SoaArray};
pub use crate::dataset::{CompositeDataSet, DataKind, DataObject, ImageData};
pub use crate::pipeline::{Algorithm, Executive, ExecutiveOpts, Information, Node, UpdateRequest};
pub use crate::smp::{BackendKind, SmpContext, SmpOpts};
pub use crate::volume::{
    BlendMode, Camera, FixedPointRayCastMapper, RayCastImage, RayCastOpts, VolumeProperty,
};
