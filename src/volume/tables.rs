//! Lookup tables in 15-bit fixed point.
//!
//! The color table stores premultiplied RGB plus the sample-distance corrected opacity for
//! `width` evenly spaced scalars over the current range. The gradient table maps gradient
//! magnitudes in `[0, range / 4]` onto 256 opacity multipliers.

use crate::foundation::core::next_stamp;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::foundation::math::{FP_SCALE, fp_from_unit};
use crate::volume::property::{BlendMode, VolumeProperty};
use crate::volume::transfer::smallest_gap;

/// Largest color/opacity table.
pub const MAX_TABLE_WIDTH: usize = 1 << 15;
/// Entries of the gradient opacity table.
pub const GRADIENT_TABLE_SIZE: usize = 256;

/// Smallest control-point gap of the color and scalar opacity functions, at most
/// `range / 256`.
pub fn smallest_feature_size(prop: &VolumeProperty, range: (f64, f64)) -> f64 {
    let bound = (range.1 - range.0) / 256.0;
    let xs = prop
        .color
        .points()
        .iter()
        .map(|p| p.0)
        .chain(prop.scalar_opacity.points().iter().map(|p| p.0));
    match smallest_gap(xs) {
        Some(g) if g < bound => g,
        _ => bound,
    }
}

/// `ceil(range / feature)` clamped to `[1, MAX_TABLE_WIDTH]`.
pub fn table_width(range: (f64, f64), feature: f64) -> usize {
    let span = range.1 - range.0;
    if !(span > 0.0 && feature > 0.0) {
        return 1;
    }
    let w = (span / feature).ceil();
    if w >= MAX_TABLE_WIDTH as f64 {
        MAX_TABLE_WIDTH
    } else {
        (w as usize).max(1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TableKey {
    functions: u64,
    lo: u64,
    hi: u64,
    sample_distance: u64,
    unit_distance: u64,
    blend: BlendMode,
    gradient: bool,
}

/// Color, opacity and gradient-opacity tables for one render configuration.
#[derive(Clone, Debug, Default)]
pub struct RayCastTables {
    key: Option<TableKey>,
    lo: f64,
    hi: f64,
    color: Vec<[u16; 4]>,
    gradient: Vec<u16>,
    gradient_scale: f64,
    stamp: u64,
}

impl RayCastTables {
    /// Empty tables; the first [`RayCastTables::update`] builds them.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild when any input changed. Returns whether a rebuild happened.
    ///
    /// Opacity is corrected for the sample spacing (`1 - (1 - a)^(d / unit)`) in composite
    /// mode only; a maximum-intensity ray takes a single sample.
    pub fn update(
        &mut self,
        prop: &VolumeProperty,
        range: (f64, f64),
        sample_distance: f64,
        blend: BlendMode,
    ) -> VoxflowResult<bool> {
        let (lo, hi) = range;
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(VoxflowError::numeric_domain(format!(
                "scalar range ({lo}, {hi}) cannot index lookup tables"
            )));
        }
        if !(sample_distance.is_finite() && sample_distance > 0.0) {
            return Err(VoxflowError::validation(format!(
                "sample distance must be positive, got {sample_distance}"
            )));
        }
        prop.validate()?;

        let key = TableKey {
            functions: prop.function_mtime(),
            lo: lo.to_bits(),
            hi: hi.to_bits(),
            sample_distance: sample_distance.to_bits(),
            unit_distance: prop.scalar_opacity_unit_distance.to_bits(),
            blend,
            gradient: prop.gradient_opacity.is_some(),
        };
        if self.key == Some(key) {
            return Ok(false);
        }

        let width = table_width(range, smallest_feature_size(prop, range));
        let mut color = Vec::new();
        color
            .try_reserve_exact(width)
            .map_err(|_| VoxflowError::out_of_memory(format!("color table of {width} entries")))?;
        let exponent = sample_distance / prop.scalar_opacity_unit_distance;
        for i in 0..width {
            let x = if width == 1 {
                lo
            } else {
                lo + (hi - lo) * i as f64 / (width - 1) as f64
            };
            let a = prop.scalar_opacity.value(x).clamp(0.0, 1.0);
            let a = match blend {
                BlendMode::Composite => 1.0 - (1.0 - a).powf(exponent),
                BlendMode::MaximumIntensity => a,
            };
            let rgb = prop.color.value(x);
            color.push([
                fp_from_unit(rgb[0].clamp(0.0, 1.0) * a),
                fp_from_unit(rgb[1].clamp(0.0, 1.0) * a),
                fp_from_unit(rgb[2].clamp(0.0, 1.0) * a),
                fp_from_unit(a),
            ]);
        }

        let quarter = 0.25 * (hi - lo);
        let gradient = match &prop.gradient_opacity {
            Some(f) => (0..GRADIENT_TABLE_SIZE)
                .map(|i| {
                    let g = quarter * i as f64 / (GRADIENT_TABLE_SIZE - 1) as f64;
                    fp_from_unit(f.value(g))
                })
                .collect(),
            None => Vec::new(),
        };

        self.key = Some(key);
        self.lo = lo;
        self.hi = hi;
        self.color = color;
        self.gradient = gradient;
        self.gradient_scale = if quarter > 0.0 {
            (GRADIENT_TABLE_SIZE - 1) as f64 / quarter
        } else {
            0.0
        };
        self.stamp = next_stamp();
        tracing::debug!(width, lo, hi, "rebuilt ray cast tables");
        Ok(true)
    }

    /// Color/opacity table width (0 before the first build).
    pub fn width(&self) -> usize {
        self.color.len()
    }

    /// Stamp of the last rebuild.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    /// Scalar range the tables were built for.
    pub fn range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Table index of scalar `s`: `clamp((s - lo)(W - 1) / (hi - lo), 0, W - 1)`.
    /// `None` for NaN.
    pub fn index(&self, s: f64) -> Option<usize> {
        if s.is_nan() || self.color.is_empty() {
            return None;
        }
        let last = self.color.len() - 1;
        if self.hi <= self.lo || last == 0 {
            return Some(0);
        }
        let t = ((s - self.lo) * last as f64 / (self.hi - self.lo)).floor();
        Some((t.max(0.0) as i64).min(last as i64) as usize)
    }

    /// Premultiplied RGB and opacity at table index `i`.
    pub fn entry(&self, i: usize) -> [u16; 4] {
        self.color[i]
    }

    /// Table entry for scalar `s`; NaN maps to transparent.
    pub fn lookup(&self, s: f64) -> [u16; 4] {
        self.index(s).map_or([0; 4], |i| self.color[i])
    }

    /// `true` when a gradient opacity table is present.
    pub fn has_gradient_opacity(&self) -> bool {
        !self.gradient.is_empty()
    }

    /// Gradient opacity multiplier for magnitude `g` (full opacity without a table).
    pub fn gradient_factor(&self, g: f64) -> u16 {
        if self.gradient.is_empty() {
            return FP_SCALE as u16;
        }
        if g.is_nan() {
            return 0;
        }
        let i = (g * self.gradient_scale).round().clamp(0.0, (GRADIENT_TABLE_SIZE - 1) as f64);
        self.gradient[i as usize]
    }

    /// Raw gradient table.
    pub fn gradient_table(&self) -> &[u16] {
        &self.gradient
    }
}

#[cfg(test)]
#[path = "../../tests/unit/volume/tables.rs"]
mod tests;
