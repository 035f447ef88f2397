//! Piecewise-linear transfer functions.

use crate::foundation::core::TimeStamp;

/// Scalar → value map through sorted control points, clamped outside the node range.
#[derive(Clone, Debug, Default)]
pub struct PiecewiseFunction {
    points: Vec<(f64, f64)>,
    mtime: TimeStamp,
}

impl PiecewiseFunction {
    /// No control points (evaluates to `0`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Straight line from `(x0, y0)` to `(x1, y1)`.
    pub fn linear(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let mut f = Self::new();
        f.add_point(x0, y0);
        f.add_point(x1, y1);
        f
    }

    /// Insert a control point; an existing point at `x` is replaced. Non-finite `x` is
    /// ignored.
    pub fn add_point(&mut self, x: f64, y: f64) {
        if !x.is_finite() {
            return;
        }
        match self.points.binary_search_by(|p| p.0.total_cmp(&x)) {
            Ok(i) => self.points[i].1 = y,
            Err(i) => self.points.insert(i, (x, y)),
        }
        self.mtime.modified();
    }

    /// Remove the control point at `x`; returns whether one existed.
    pub fn remove_point(&mut self, x: f64) -> bool {
        match self.points.binary_search_by(|p| p.0.total_cmp(&x)) {
            Ok(i) => {
                self.points.remove(i);
                self.mtime.modified();
                true
            }
            Err(_) => false,
        }
    }

    /// Drop every control point.
    pub fn clear(&mut self) {
        self.points.clear();
        self.mtime.modified();
    }

    /// Control points in ascending `x`.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` without control points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluate at `x`.
    pub fn value(&self, x: f64) -> f64 {
        evaluate(&self.points, x, 0.0, |a, b, t| a + (b - a) * t)
    }

    /// `(first x, last x)`, if any point exists.
    pub fn range(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.0, self.points.last()?.0))
    }

    /// Modified stamp.
    pub fn mtime(&self) -> u64 {
        self.mtime.get()
    }
}

/// Scalar → RGB map through sorted control points, clamped outside the node range.
#[derive(Clone, Debug, Default)]
pub struct ColorTransferFunction {
    points: Vec<(f64, [f64; 3])>,
    mtime: TimeStamp,
}

impl ColorTransferFunction {
    /// No control points (evaluates to black).
    pub fn new() -> Self {
        Self::default()
    }

    /// Ramp from `c0` at `x0` to `c1` at `x1`.
    pub fn linear(x0: f64, c0: [f64; 3], x1: f64, c1: [f64; 3]) -> Self {
        let mut f = Self::new();
        f.add_rgb_point(x0, c0);
        f.add_rgb_point(x1, c1);
        f
    }

    /// Insert a control point; an existing point at `x` is replaced.
    pub fn add_rgb_point(&mut self, x: f64, rgb: [f64; 3]) {
        if !x.is_finite() {
            return;
        }
        match self.points.binary_search_by(|p| p.0.total_cmp(&x)) {
            Ok(i) => self.points[i].1 = rgb,
            Err(i) => self.points.insert(i, (x, rgb)),
        }
        self.mtime.modified();
    }

    /// Drop every control point.
    pub fn clear(&mut self) {
        self.points.clear();
        self.mtime.modified();
    }

    /// Control points in ascending `x`.
    pub fn points(&self) -> &[(f64, [f64; 3])] {
        &self.points
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` without control points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluate at `x`.
    pub fn value(&self, x: f64) -> [f64; 3] {
        evaluate(&self.points, x, [0.0; 3], |a, b, t| {
            [0, 1, 2].map(|c| a[c] + (b[c] - a[c]) * t)
        })
    }

    /// `(first x, last x)`, if any point exists.
    pub fn range(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.0, self.points.last()?.0))
    }

    /// Modified stamp.
    pub fn mtime(&self) -> u64 {
        self.mtime.get()
    }
}

fn evaluate<V: Copy>(points: &[(f64, V)], x: f64, empty: V, lerp: impl Fn(V, V, f64) -> V) -> V {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return empty;
    };
    if x.is_nan() || x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    let hi = points.partition_point(|p| p.0 <= x);
    let (x0, v0) = points[hi - 1];
    let (x1, v1) = points[hi];
    lerp(v0, v1, (x - x0) / (x1 - x0))
}

/// Smallest gap between adjacent control points, if there are at least two.
pub(crate) fn smallest_gap(xs: impl Iterator<Item = f64>) -> Option<f64> {
    let mut xs: Vec<f64> = xs.collect();
    xs.sort_by(f64::total_cmp);
    xs.windows(2)
        .map(|w| w[1] - w[0])
        .filter(|g| *g > 0.0)
        .min_by(f64::total_cmp)
}

#[cfg(test)]
#[path = "../../tests/unit/volume/transfer.rs"]
mod tests;
