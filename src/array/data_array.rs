use std::any::Any;
use std::ops::Range;

use crate::array::scalar::ScalarType;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::smp::SmpContext;

/// Storage layout of a typed array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One buffer of `N * C` values, stride `C`.
    Aos,
    /// `C` buffers of `N` values each.
    Soa,
}

impl Layout {
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Aos => 0,
            Self::Soa => 1,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> VoxflowResult<Self> {
        match tag {
            0 => Ok(Self::Aos),
            1 => Ok(Self::Soa),
            t => Err(VoxflowError::serde(format!("unknown array layout tag {t}"))),
        }
    }
}

/// Parallel body over tuple sub-ranges: `(first_tuple, last_tuple_exclusive, thread_id)`.
pub type TupleBody<'a> = dyn Fn(usize, usize, usize) -> VoxflowResult<()> + Sync + 'a;

/// Layout- and type-erased view over a typed array.
///
/// Both [`AosArray`](crate::array::AosArray) and [`SoaArray`](crate::array::SoaArray)
/// implement it. Values cross this interface as `f64`; use
/// [`downcast_ref`](dyn DataArray::downcast_ref) to reach typed storage.
pub trait DataArray: Any + Send + Sync + std::fmt::Debug {
    /// Array name (key in a field-data collection).
    fn name(&self) -> &str;

    /// Rename the array.
    fn set_name(&mut self, name: &str);

    /// Element type.
    fn scalar_type(&self) -> ScalarType;

    /// Storage layout.
    fn layout(&self) -> Layout;

    /// Number of tuples `N`.
    fn number_of_tuples(&self) -> usize;

    /// Components per tuple `C`.
    fn number_of_components(&self) -> usize;

    /// `N * C`.
    fn number_of_values(&self) -> usize {
        self.number_of_tuples() * self.number_of_components()
    }

    /// Value at `(tuple, comp)` as `f64`.
    ///
    /// # Panics
    /// When the index is out of range.
    fn component(&self, tuple: usize, comp: usize) -> f64;

    /// Checked form of [`DataArray::component`].
    fn try_component(&self, tuple: usize, comp: usize) -> VoxflowResult<f64> {
        check_index(tuple, comp, self.number_of_tuples(), self.number_of_components())?;
        Ok(self.component(tuple, comp))
    }

    /// Store `value` at `(tuple, comp)`, converting to the element type.
    ///
    /// # Panics
    /// When the index is out of range.
    fn set_component(&mut self, tuple: usize, comp: usize, value: f64);

    /// Modified stamp; advanced by every write.
    fn mtime(&self) -> u64;

    /// Cached `(min, max)` of component `comp`, ignoring NaN.
    fn range(&self, comp: usize) -> (f64, f64);

    /// Cached `(min, max)` of component `comp`, ignoring NaN and ±∞.
    fn finite_range(&self, comp: usize) -> (f64, f64);

    /// Range of per-tuple Euclidean norms.
    fn magnitude_range(&self) -> (f64, f64);

    /// Run `body` over sub-ranges of `tuples` (all tuples when `None`).
    fn iterate(
        &self,
        ctx: &SmpContext,
        tuples: Option<Range<usize>>,
        grain: usize,
        body: &TupleBody<'_>,
    ) -> VoxflowResult<()> {
        let r = tuples.unwrap_or(0..self.number_of_tuples());
        if r.end > self.number_of_tuples() {
            return Err(VoxflowError::IndexOutOfRange {
                index: r.end,
                len: self.number_of_tuples(),
            });
        }
        ctx.parallel_for(r.start, r.end, grain, body)
    }

    /// New array of the same type, layout, name and component count holding the given
    /// tuples, in order.
    fn gather(&self, tuples: &[usize]) -> VoxflowResult<Box<dyn DataArray>>;

    /// Same type, layout, name and components, `tuples` zero-filled tuples.
    fn empty_like(&self, tuples: usize) -> VoxflowResult<Box<dyn DataArray>>;

    /// Deep copy.
    fn clone_array(&self) -> Box<dyn DataArray>;

    /// Copy tuples `(dst, src)` from `src` into `self`. Arrays of the same concrete type copy
    /// raw values; other pairs convert through `f64`.
    fn copy_tuples_from(&mut self, src: &dyn DataArray, pairs: &[(usize, usize)]) -> VoxflowResult<()>;

    /// Append the persisted form (see [`crate::array::persist`]) to `out`.
    fn write_to(&self, out: &mut Vec<u8>) -> VoxflowResult<()>;
}

impl dyn DataArray {
    /// Downcast to a concrete array type.
    pub fn downcast_ref<A: DataArray>(&self) -> Option<&A> {
        (self as &dyn Any).downcast_ref::<A>()
    }

    /// Mutable downcast to a concrete array type.
    pub fn downcast_mut<A: DataArray>(&mut self) -> Option<&mut A> {
        (self as &mut dyn Any).downcast_mut::<A>()
    }

    /// Tuple `t` widened to `f64`.
    pub fn tuple_f64(&self, t: usize) -> Vec<f64> {
        (0..self.number_of_components())
            .map(|c| self.component(t, c))
            .collect()
    }
}

pub(crate) fn check_index(tuple: usize, comp: usize, tuples: usize, comps: usize) -> VoxflowResult<()> {
    if tuple >= tuples {
        return Err(VoxflowError::IndexOutOfRange {
            index: tuple,
            len: tuples,
        });
    }
    if comp >= comps {
        return Err(VoxflowError::IndexOutOfRange {
            index: comp,
            len: comps,
        });
    }
    Ok(())
}

pub(crate) fn check_pairs(pairs: &[(usize, usize)], dst_len: usize, src_len: usize) -> VoxflowResult<()> {
    for &(d, s) in pairs {
        if d >= dst_len {
            return Err(VoxflowError::IndexOutOfRange {
                index: d,
                len: dst_len,
            });
        }
        if s >= src_len {
            return Err(VoxflowError::IndexOutOfRange {
                index: s,
                len: src_len,
            });
        }
    }
    Ok(())
}
