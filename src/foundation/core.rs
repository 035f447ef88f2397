use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::error::{VoxflowError, VoxflowResult};

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Draw the next value of the process-wide modified counter.
///
/// Values are strictly increasing across all objects, so "newer than" comparisons between
/// stamps of different objects are meaningful.
pub fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

/// Per-object modified stamp used for cache invalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeStamp(u64);

impl TimeStamp {
    /// A freshly drawn stamp.
    pub fn now() -> Self {
        Self(next_stamp())
    }

    /// The zero stamp; older than every drawn stamp.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Mark the owner as modified.
    pub fn modified(&mut self) {
        self.0 = next_stamp();
    }

    /// Raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for TimeStamp {
    fn default() -> Self {
        Self::now()
    }
}

/// Inclusive index bounds per axis of a structured grid: `[x0, x1, y0, y1, z0, z1]`.
///
/// An axis with `hi < lo` makes the whole extent empty.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Extent(pub [i32; 6]);

impl Extent {
    /// Canonical empty extent.
    pub const EMPTY: Extent = Extent([0, -1, 0, -1, 0, -1]);

    /// Build an extent from its six bounds.
    pub const fn new(x0: i32, x1: i32, y0: i32, y1: i32, z0: i32, z1: i32) -> Self {
        Self([x0, x1, y0, y1, z0, z1])
    }

    /// Parse an extent stored as six integers (as carried by information objects).
    pub fn from_slice(v: &[i64]) -> VoxflowResult<Self> {
        if v.len() != 6 {
            return Err(VoxflowError::bad_input(format!(
                "extent must have 6 values, got {}",
                v.len()
            )));
        }
        let mut out = [0i32; 6];
        for (o, &x) in out.iter_mut().zip(v) {
            *o = i32::try_from(x)
                .map_err(|_| VoxflowError::bad_input(format!("extent value {x} overflows i32")))?;
        }
        Ok(Self(out))
    }

    /// Six bounds widened to `i64`.
    pub fn to_vec(self) -> Vec<i64> {
        self.0.iter().map(|&v| i64::from(v)).collect()
    }

    /// `(lo, hi)` of axis `a` (0 = x, 1 = y, 2 = z).
    pub fn axis(self, a: usize) -> (i32, i32) {
        (self.0[2 * a], self.0[2 * a + 1])
    }

    /// `true` when any axis range is empty.
    pub fn is_empty(self) -> bool {
        (0..3).any(|a| {
            let (lo, hi) = self.axis(a);
            hi < lo
        })
    }

    /// Number of points along each axis (all zero when empty).
    pub fn dimensions(self) -> [usize; 3] {
        if self.is_empty() {
            return [0; 3];
        }
        let mut d = [0usize; 3];
        for (a, out) in d.iter_mut().enumerate() {
            let (lo, hi) = self.axis(a);
            *out = (i64::from(hi) - i64::from(lo) + 1) as usize;
        }
        d
    }

    /// Number of points covered.
    pub fn num_points(self) -> usize {
        self.dimensions().iter().product()
    }

    /// Number of cells covered; flat axes (one point thick) count as one cell layer.
    pub fn num_cells(self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.dimensions()
            .iter()
            .map(|&d| if d > 1 { d - 1 } else { 1 })
            .product()
    }

    /// Extent of the cells: non-flat axes lose their last point layer.
    pub fn cell_extent(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        let mut out = self.0;
        for a in 0..3 {
            if out[2 * a + 1] > out[2 * a] {
                out[2 * a + 1] -= 1;
            }
        }
        Self(out)
    }

    /// Number of axes with more than one point.
    pub fn data_dimension(self) -> usize {
        self.dimensions().iter().filter(|&&d| d > 1).count()
    }

    /// Expand every non-flat axis by `n` layers on both sides.
    ///
    /// Flat axes (`lo == hi`) stay flat so 2D images do not grow a third dimension.
    pub fn grow(self, n: i32) -> Self {
        if self.is_empty() || n == 0 {
            return self;
        }
        let mut out = self.0;
        for a in 0..3 {
            if out[2 * a] == out[2 * a + 1] {
                continue;
            }
            out[2 * a] = out[2 * a].saturating_sub(n);
            out[2 * a + 1] = out[2 * a + 1].saturating_add(n);
        }
        Self(out)
    }

    /// Expand by `n` layers, then clamp to `whole`.
    pub fn grow_within(self, n: i32, whole: Extent) -> Self {
        let grown = self.grow(n);
        let mut out = grown.0;
        for a in 0..3 {
            let (wlo, whi) = whole.axis(a);
            if self.0[2 * a] == self.0[2 * a + 1] {
                continue;
            }
            out[2 * a] = out[2 * a].max(wlo);
            out[2 * a + 1] = out[2 * a + 1].min(whi);
        }
        Self(out)
    }

    /// Intersection; the result may be empty.
    pub fn intersect(self, other: Extent) -> Self {
        let mut out = [0i32; 6];
        for a in 0..3 {
            out[2 * a] = self.0[2 * a].max(other.0[2 * a]);
            out[2 * a + 1] = self.0[2 * a + 1].min(other.0[2 * a + 1]);
        }
        Self(out)
    }

    /// Smallest extent containing both (empty operands are ignored).
    pub fn union(self, other: Extent) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let mut out = [0i32; 6];
        for a in 0..3 {
            out[2 * a] = self.0[2 * a].min(other.0[2 * a]);
            out[2 * a + 1] = self.0[2 * a + 1].max(other.0[2 * a + 1]);
        }
        Self(out)
    }

    /// `true` when `other` lies entirely inside `self`. Empty extents are contained by all.
    pub fn contains(self, other: Extent) -> bool {
        if other.is_empty() {
            return true;
        }
        (0..3).all(|a| {
            let (lo, hi) = self.axis(a);
            let (olo, ohi) = other.axis(a);
            lo <= olo && ohi <= hi
        })
    }

    /// `true` when structured index `(i, j, k)` lies inside.
    pub fn contains_point(self, ijk: [i32; 3]) -> bool {
        (0..3).all(|a| {
            let (lo, hi) = self.axis(a);
            lo <= ijk[a] && ijk[a] <= hi
        })
    }

    /// Flat point index of `(i, j, k)` relative to this extent (x varies fastest).
    pub fn point_index(self, ijk: [i32; 3]) -> usize {
        let d = self.dimensions();
        let i = (ijk[0] - self.0[0]) as usize;
        let j = (ijk[1] - self.0[2]) as usize;
        let k = (ijk[2] - self.0[4]) as usize;
        i + d[0] * (j + d[1] * k)
    }

    /// Inverse of [`Extent::point_index`].
    pub fn point_ijk(self, idx: usize) -> [i32; 3] {
        let d = self.dimensions();
        let i = idx % d[0];
        let j = (idx / d[0]) % d[1];
        let k = idx / (d[0] * d[1]);
        [
            self.0[0] + i as i32,
            self.0[2] + j as i32,
            self.0[4] + k as i32,
        ]
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let e = self.0;
        write!(
            f,
            "[{}..{}, {}..{}, {}..{}]",
            e[0], e[1], e[2], e[3], e[4], e[5]
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
