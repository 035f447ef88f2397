//! Fixed-point volume ray casting over image data.

/// View parameters and ray generation.
pub mod camera;
/// Ray-cast output image.
pub mod image;
pub mod kernels;
pub mod mapper;
/// Volume appearance.
pub mod property;
pub mod sampler;
pub mod shading;
pub mod tables;
pub mod transfer;

pub use camera::{Camera, Ray, Vec3, ViewBasis};
pub use image::RayCastImage;
pub use kernels::{CompositeAccumulator, EARLY_OUT, Kernel, MaxAccumulator};
pub use mapper::{FixedPointRayCastMapper, MAX_IMAGE_SAMPLE_DISTANCE, RayCastOpts, RayCastStats};
pub use property::{BlendMode, Interpolation, VolumeProperty};
pub use sampler::SampledVolume;
pub use shading::{COSINE_TABLE_SIZE, ShadingTable};
pub use tables::{GRADIENT_TABLE_SIZE, MAX_TABLE_WIDTH, RayCastTables, smallest_feature_size, table_width};
pub use transfer::{ColorTransferFunction, PiecewiseFunction};
