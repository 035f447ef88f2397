use crate::array::data_array::{DataArray, Layout, check_index, check_pairs};
use crate::array::range::{RangeCache, RangeMode, reduce_range};
use crate::array::scalar::{Scalar, ScalarType};
use crate::array::soa::SoaArray;
use crate::foundation::core::TimeStamp;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::smp;

/// Array-of-structures typed array: one contiguous buffer of `N * C` values.
#[derive(Debug, Clone)]
pub struct AosArray<T: Scalar> {
    name: String,
    components: usize,
    data: Vec<T>,
    mtime: TimeStamp,
    cache: RangeCache,
}

impl<T: Scalar> AosArray<T> {
    /// Empty array with `components` components per tuple; `0` is widened to one.
    pub fn new(components: usize) -> Self {
        Self {
            name: String::new(),
            components: components.max(1),
            data: Vec::new(),
            mtime: TimeStamp::now(),
            cache: RangeCache::default(),
        }
    }

    /// Builder-style rename.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Wrap an existing interleaved buffer.
    pub fn from_vec(components: usize, data: Vec<T>) -> VoxflowResult<Self> {
        if components == 0 || !data.len().is_multiple_of(components) {
            return Err(VoxflowError::bad_input(format!(
                "{} values do not form whole tuples of {components} components",
                data.len()
            )));
        }
        Ok(Self {
            components,
            data,
            ..Self::new(components)
        })
    }

    /// `tuples` default-valued tuples.
    pub fn zeros(tuples: usize, components: usize) -> VoxflowResult<Self> {
        let mut a = Self::new(components);
        a.resize(tuples)?;
        Ok(a)
    }

    /// Number of tuples.
    pub fn len(&self) -> usize {
        self.data.len() / self.components
    }

    /// `true` when there are no tuples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Components per tuple.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Set the tuple count. Contents are not preserved on shrink.
    pub fn resize(&mut self, tuples: usize) -> VoxflowResult<()> {
        let values = tuples.checked_mul(self.components).ok_or_else(|| {
            VoxflowError::out_of_memory(format!("{tuples} tuples overflow the address space"))
        })?;
        if values > self.data.len() {
            self.data
                .try_reserve_exact(values - self.data.len())
                .map_err(|e| VoxflowError::out_of_memory(format!("resize to {tuples} tuples: {e}")))?;
        }
        self.data.resize(values, T::default());
        self.modified();
        Ok(())
    }

    /// Set tuple and component counts together. Contents are not preserved.
    pub fn resize_with_components(&mut self, tuples: usize, components: usize) -> VoxflowResult<()> {
        let components = components.max(1);
        if components != self.components {
            self.data.clear();
            self.components = components;
        }
        self.resize(tuples)
    }

    /// Value at `(tuple, comp)`.
    #[inline]
    pub fn get(&self, tuple: usize, comp: usize) -> T {
        debug_assert!(tuple < self.len() && comp < self.components);
        self.data[tuple * self.components + comp]
    }

    /// Store `v` at `(tuple, comp)`.
    #[inline]
    pub fn set(&mut self, tuple: usize, comp: usize, v: T) {
        debug_assert!(tuple < self.len() && comp < self.components);
        self.data[tuple * self.components + comp] = v;
        self.modified();
    }

    /// Checked [`AosArray::get`].
    pub fn try_get(&self, tuple: usize, comp: usize) -> VoxflowResult<T> {
        check_index(tuple, comp, self.len(), self.components)?;
        Ok(self.get(tuple, comp))
    }

    /// Checked [`AosArray::set`].
    pub fn try_set(&mut self, tuple: usize, comp: usize, v: T) -> VoxflowResult<()> {
        check_index(tuple, comp, self.len(), self.components)?;
        self.set(tuple, comp, v);
        Ok(())
    }

    /// Components of tuple `t`.
    pub fn tuple(&self, t: usize) -> &[T] {
        &self.data[t * self.components..(t + 1) * self.components]
    }

    /// Overwrite tuple `t`.
    pub fn set_tuple(&mut self, t: usize, values: &[T]) -> VoxflowResult<()> {
        self.check_tuple_width(values)?;
        check_index(t, 0, self.len(), self.components)?;
        self.data[t * self.components..(t + 1) * self.components].copy_from_slice(values);
        self.modified();
        Ok(())
    }

    /// Append one tuple; returns its index. Capacity doubles when exhausted.
    pub fn append(&mut self, values: &[T]) -> VoxflowResult<usize> {
        self.check_tuple_width(values)?;
        if self.data.len() + self.components > self.data.capacity() {
            let extra = self.data.capacity().max(self.components);
            self.data
                .try_reserve_exact(extra)
                .map_err(|e| VoxflowError::out_of_memory(format!("append: {e}")))?;
        }
        self.data.extend_from_slice(values);
        self.modified();
        Ok(self.len() - 1)
    }

    /// Write tuple `t`, growing the array when `t` is past the end.
    pub fn insert_tuple(&mut self, t: usize, values: &[T]) -> VoxflowResult<()> {
        self.check_tuple_width(values)?;
        if t >= self.len() {
            let want = t + 1;
            let cap = self.capacity().max(1);
            if want > cap {
                self.reserve(want.max(cap * 2))?;
            }
            self.data.resize(want * self.components, T::default());
        }
        self.set_tuple(t, values)
    }

    /// Ensure capacity for at least `tuples` tuples.
    pub fn reserve(&mut self, tuples: usize) -> VoxflowResult<()> {
        let values = tuples.saturating_mul(self.components);
        if values > self.data.len() {
            self.data
                .try_reserve_exact(values - self.data.len())
                .map_err(|e| VoxflowError::out_of_memory(format!("reserve {tuples} tuples: {e}")))?;
        }
        Ok(())
    }

    /// Allocated capacity in tuples.
    pub fn capacity(&self) -> usize {
        self.data.capacity() / self.components
    }

    /// Drop every tuple (keeps capacity).
    pub fn clear(&mut self) {
        self.data.clear();
        self.modified();
    }

    /// Release spare capacity.
    pub fn squeeze(&mut self) {
        self.data.shrink_to_fit();
    }

    /// Assign `v` to every value, in parallel.
    pub fn fill(&mut self, v: T) {
        smp::global().fill(&mut self.data, v);
        self.modified();
    }

    /// Assign `v` to component `comp` of every tuple.
    pub fn fill_component(&mut self, comp: usize, v: T) -> VoxflowResult<()> {
        if comp >= self.components {
            return Err(VoxflowError::IndexOutOfRange {
                index: comp,
                len: self.components,
            });
        }
        let c = self.components;
        smp::global().parallel_for_slice_mut(&mut self.data, c * 1024, |off, chunk, _| {
            // `c * 1024` keeps chunk boundaries on tuple boundaries.
            debug_assert!(off.is_multiple_of(c));
            for t in chunk.chunks_mut(c) {
                t[comp] = v;
            }
            Ok(())
        })?;
        self.modified();
        Ok(())
    }

    /// Interleaved values.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable interleaved values; marks the array modified.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.modified();
        &mut self.data
    }

    /// Consume into the interleaved buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Explicit copy into structure-of-arrays layout.
    pub fn to_soa(&self) -> SoaArray<T> {
        let c = self.components;
        let buffers = (0..c)
            .map(|k| self.data.iter().skip(k).step_by(c).copied().collect())
            .collect();
        let mut soa = SoaArray::from_unchecked(buffers, self.len());
        soa.set_name(&self.name);
        soa
    }

    /// Advance the modified stamp.
    pub fn modified(&mut self) {
        self.mtime.modified();
    }

    fn check_tuple_width(&self, values: &[T]) -> VoxflowResult<()> {
        if values.len() != self.components {
            return Err(VoxflowError::bad_input(format!(
                "tuple has {} values, array has {} components",
                values.len(),
                self.components
            )));
        }
        Ok(())
    }

    fn component_range(&self, comp: usize, mode: RangeMode) -> (f64, f64) {
        let c = self.components;
        self.cache.component(self.mtime.get(), comp, mode, || {
            if comp >= c {
                return crate::array::range::EMPTY_RANGE;
            }
            let ctx = smp::global();
            reduce_range(&ctx, self.len(), mode, |t| self.data[t * c + comp].to_f64())
        })
    }
}

impl<T: Scalar> DataArray for AosArray<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    fn scalar_type(&self) -> ScalarType {
        T::TYPE
    }

    fn layout(&self) -> Layout {
        Layout::Aos
    }

    fn number_of_tuples(&self) -> usize {
        self.len()
    }

    fn number_of_components(&self) -> usize {
        self.components
    }

    fn component(&self, tuple: usize, comp: usize) -> f64 {
        self.get(tuple, comp).to_f64()
    }

    fn set_component(&mut self, tuple: usize, comp: usize, value: f64) {
        self.set(tuple, comp, T::from_f64(value));
    }

    fn mtime(&self) -> u64 {
        self.mtime.get()
    }

    fn range(&self, comp: usize) -> (f64, f64) {
        self.component_range(comp, RangeMode::Full)
    }

    fn finite_range(&self, comp: usize) -> (f64, f64) {
        self.component_range(comp, RangeMode::Finite)
    }

    fn magnitude_range(&self) -> (f64, f64) {
        let c = self.components;
        self.cache.magnitude(self.mtime.get(), || {
            let ctx = smp::global();
            reduce_range(&ctx, self.len(), RangeMode::Full, |t| {
                self.data[t * c..(t + 1) * c]
                    .iter()
                    .map(|v| v.to_f64() * v.to_f64())
                    .sum::<f64>()
                    .sqrt()
            })
        })
    }

    fn gather(&self, tuples: &[usize]) -> VoxflowResult<Box<dyn DataArray>> {
        let n = self.len();
        let mut data = Vec::new();
        data.try_reserve_exact(tuples.len() * self.components)
            .map_err(|e| VoxflowError::out_of_memory(format!("gather: {e}")))?;
        for &t in tuples {
            if t >= n {
                return Err(VoxflowError::IndexOutOfRange { index: t, len: n });
            }
            data.extend_from_slice(self.tuple(t));
        }
        Ok(Box::new(Self::from_vec(self.components, data)?.named(self.name.clone())))
    }

    fn empty_like(&self, tuples: usize) -> VoxflowResult<Box<dyn DataArray>> {
        Ok(Box::new(
            Self::zeros(tuples, self.components)?.named(self.name.clone()),
        ))
    }

    fn clone_array(&self) -> Box<dyn DataArray> {
        Box::new(self.clone())
    }

    fn copy_tuples_from(&mut self, src: &dyn DataArray, pairs: &[(usize, usize)]) -> VoxflowResult<()> {
        if src.number_of_components() != self.components {
            return Err(VoxflowError::bad_input(format!(
                "component mismatch: {} vs {}",
                src.number_of_components(),
                self.components
            )));
        }
        check_pairs(pairs, self.len(), src.number_of_tuples())?;
        let c = self.components;
        if let Some(same) = src.downcast_ref::<Self>() {
            for &(d, s) in pairs {
                self.data[d * c..(d + 1) * c].copy_from_slice(same.tuple(s));
            }
        } else {
            for &(d, s) in pairs {
                for k in 0..c {
                    self.data[d * c + k] = T::from_f64(src.component(s, k));
                }
            }
        }
        self.modified();
        Ok(())
    }

    fn write_to(&self, out: &mut Vec<u8>) -> VoxflowResult<()> {
        crate::array::persist::write_aos(self, out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/array/aos.rs"]
mod tests;
