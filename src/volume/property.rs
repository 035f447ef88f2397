use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::volume::transfer::{ColorTransferFunction, PiecewiseFunction};

/// Sample reconstruction.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Nearest voxel; ties pick the lower index.
    Nearest,
    /// Trilinear.
    #[default]
    Linear,
}

/// How samples along a ray are combined.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Front-to-back alpha compositing.
    #[default]
    Composite,
    /// Maximum scalar along the ray.
    MaximumIntensity,
}

/// Appearance of a volume.
#[derive(Clone, Debug)]
pub struct VolumeProperty {
    /// Scalar → RGB.
    pub color: ColorTransferFunction,
    /// Scalar → opacity per unit distance.
    pub scalar_opacity: PiecewiseFunction,
    /// Gradient magnitude → opacity multiplier.
    pub gradient_opacity: Option<PiecewiseFunction>,
    /// Apply Phong shading.
    pub shade: bool,
    /// Ambient coefficient.
    pub ambient: f64,
    /// Diffuse coefficient.
    pub diffuse: f64,
    /// Specular coefficient.
    pub specular: f64,
    /// Specular exponent.
    pub specular_power: f64,
    /// Sample reconstruction.
    pub interpolation: Interpolation,
    /// Distance over which `scalar_opacity` is defined.
    pub scalar_opacity_unit_distance: f64,
}

impl Default for VolumeProperty {
    fn default() -> Self {
        Self {
            color: ColorTransferFunction::linear(0.0, [0.0; 3], 255.0, [1.0; 3]),
            scalar_opacity: PiecewiseFunction::linear(0.0, 0.0, 255.0, 1.0),
            gradient_opacity: None,
            shade: false,
            ambient: 0.1,
            diffuse: 0.7,
            specular: 0.2,
            specular_power: 10.0,
            interpolation: Interpolation::Linear,
            scalar_opacity_unit_distance: 1.0,
        }
    }
}

impl VolumeProperty {
    /// Grey ramp over `[lo, hi]` with opacity rising linearly from 0 to 1.
    pub fn ramp(lo: f64, hi: f64) -> Self {
        Self {
            color: ColorTransferFunction::linear(lo, [1.0; 3], hi, [1.0; 3]),
            scalar_opacity: PiecewiseFunction::linear(lo, 0.0, hi, 1.0),
            ..Self::default()
        }
    }

    /// Latest stamp of the transfer functions.
    pub fn function_mtime(&self) -> u64 {
        let g = self.gradient_opacity.as_ref().map_or(0, PiecewiseFunction::mtime);
        self.color.mtime().max(self.scalar_opacity.mtime()).max(g)
    }

    /// Reject coefficients that would make the tables meaningless.
    pub fn validate(&self) -> VoxflowResult<()> {
        if !(self.scalar_opacity_unit_distance.is_finite() && self.scalar_opacity_unit_distance > 0.0) {
            return Err(VoxflowError::validation(format!(
                "scalar opacity unit distance must be positive, got {}",
                self.scalar_opacity_unit_distance
            )));
        }
        for (name, v) in [
            ("ambient", self.ambient),
            ("diffuse", self.diffuse),
            ("specular", self.specular),
            ("specular_power", self.specular_power),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(VoxflowError::validation(format!(
                    "{name} must be a non-negative number, got {v}"
                )));
            }
        }
        Ok(())
    }
}
