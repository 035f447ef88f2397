use crate::array::aos::AosArray;
use crate::array::data_array::{DataArray, Layout, check_index, check_pairs};
use crate::array::range::{EMPTY_RANGE, RangeCache, RangeMode, reduce_range};
use crate::array::scalar::{Scalar, ScalarType};
use crate::foundation::core::TimeStamp;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::smp;

/// Structure-of-arrays typed array: one buffer per component.
///
/// A component may carry an affine scale; `get` then returns `scale * raw`.
#[derive(Debug, Clone)]
pub struct SoaArray<T: Scalar> {
    name: String,
    tuples: usize,
    buffers: Vec<Vec<T>>,
    scale: Vec<Option<f64>>,
    mtime: TimeStamp,
    cache: RangeCache,
}

impl<T: Scalar> SoaArray<T> {
    /// Empty array with `components` buffers; `0` is widened to one.
    pub fn new(components: usize) -> Self {
        let c = components.max(1);
        Self {
            name: String::new(),
            tuples: 0,
            buffers: vec![Vec::new(); c],
            scale: vec![None; c],
            mtime: TimeStamp::now(),
            cache: RangeCache::default(),
        }
    }

    /// Builder-style rename.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Wrap per-component buffers; all must have the same length.
    pub fn from_buffers(buffers: Vec<Vec<T>>) -> VoxflowResult<Self> {
        let Some(n) = buffers.first().map(Vec::len) else {
            return Err(VoxflowError::bad_input("SoA array needs at least one component"));
        };
        if let Some(bad) = buffers.iter().position(|b| b.len() != n) {
            return Err(VoxflowError::bad_input(format!(
                "component {bad} has {} tuples, expected {n}",
                buffers[bad].len()
            )));
        }
        Ok(Self::from_unchecked(buffers, n))
    }

    pub(crate) fn from_unchecked(buffers: Vec<Vec<T>>, tuples: usize) -> Self {
        let c = buffers.len().max(1);
        let buffers = if buffers.is_empty() {
            vec![Vec::new()]
        } else {
            buffers
        };
        Self {
            tuples,
            scale: vec![None; c],
            buffers,
            ..Self::new(c)
        }
    }

    /// `tuples` zero tuples.
    pub fn zeros(tuples: usize, components: usize) -> VoxflowResult<Self> {
        let mut a = Self::new(components);
        a.resize(tuples)?;
        Ok(a)
    }

    /// Number of tuples.
    pub fn len(&self) -> usize {
        self.tuples
    }

    /// `true` when there are no tuples.
    pub fn is_empty(&self) -> bool {
        self.tuples == 0
    }

    /// Components per tuple.
    pub fn components(&self) -> usize {
        self.buffers.len()
    }

    /// Set (or clear) the affine scale of component `comp`.
    pub fn set_scale(&mut self, comp: usize, scale: Option<f64>) -> VoxflowResult<()> {
        let c = self.components();
        let slot = self.scale.get_mut(comp).ok_or(VoxflowError::IndexOutOfRange {
            index: comp,
            len: c,
        })?;
        *slot = scale;
        self.modified();
        Ok(())
    }

    /// Affine scale of component `comp`.
    pub fn scale(&self, comp: usize) -> Option<f64> {
        self.scale.get(comp).copied().flatten()
    }

    /// Set the tuple count. Contents are not preserved on shrink.
    pub fn resize(&mut self, tuples: usize) -> VoxflowResult<()> {
        for b in &mut self.buffers {
            if tuples > b.len() {
                b.try_reserve_exact(tuples - b.len()).map_err(|e| {
                    VoxflowError::out_of_memory(format!("resize to {tuples} tuples: {e}"))
                })?;
            }
            b.resize(tuples, T::default());
        }
        self.tuples = tuples;
        self.modified();
        Ok(())
    }

    /// Set tuple and component counts together. Contents are not preserved.
    pub fn resize_with_components(&mut self, tuples: usize, components: usize) -> VoxflowResult<()> {
        let c = components.max(1);
        if c != self.components() {
            self.buffers = vec![Vec::new(); c];
            self.scale = vec![None; c];
        }
        self.resize(tuples)
    }

    /// Scaled value at `(tuple, comp)`.
    #[inline]
    pub fn get(&self, tuple: usize, comp: usize) -> f64 {
        let raw = self.get_raw(tuple, comp).to_f64();
        match self.scale[comp] {
            Some(s) => s * raw,
            None => raw,
        }
    }

    /// Stored value at `(tuple, comp)` without the scale.
    #[inline]
    pub fn get_raw(&self, tuple: usize, comp: usize) -> T {
        debug_assert!(tuple < self.tuples && comp < self.components());
        self.buffers[comp][tuple]
    }

    /// Store a raw value.
    #[inline]
    pub fn set_raw(&mut self, tuple: usize, comp: usize, v: T) {
        debug_assert!(tuple < self.tuples && comp < self.components());
        self.buffers[comp][tuple] = v;
        self.modified();
    }

    /// Store a scaled value; the raw value is `v / scale`.
    pub fn set(&mut self, tuple: usize, comp: usize, v: f64) {
        let raw = match self.scale[comp] {
            Some(s) if s != 0.0 => v / s,
            _ => v,
        };
        self.set_raw(tuple, comp, T::from_f64(raw));
    }

    /// Checked [`SoaArray::get`].
    pub fn try_get(&self, tuple: usize, comp: usize) -> VoxflowResult<f64> {
        check_index(tuple, comp, self.tuples, self.components())?;
        Ok(self.get(tuple, comp))
    }

    /// Checked [`SoaArray::set`].
    pub fn try_set(&mut self, tuple: usize, comp: usize, v: f64) -> VoxflowResult<()> {
        check_index(tuple, comp, self.tuples, self.components())?;
        self.set(tuple, comp, v);
        Ok(())
    }

    /// Raw buffer of component `comp`.
    pub fn component_slice(&self, comp: usize) -> &[T] {
        &self.buffers[comp]
    }

    /// Mutable raw buffer of component `comp`; marks the array modified.
    pub fn component_slice_mut(&mut self, comp: usize) -> &mut [T] {
        self.modified();
        &mut self.buffers[comp]
    }

    /// Append one tuple of raw values; returns its index.
    pub fn append(&mut self, raw: &[T]) -> VoxflowResult<usize> {
        if raw.len() != self.components() {
            return Err(VoxflowError::bad_input(format!(
                "tuple has {} values, array has {} components",
                raw.len(),
                self.components()
            )));
        }
        for (b, &v) in self.buffers.iter_mut().zip(raw) {
            if b.len() == b.capacity() {
                let extra = b.capacity().max(1);
                b.try_reserve_exact(extra)
                    .map_err(|e| VoxflowError::out_of_memory(format!("append: {e}")))?;
            }
            b.push(v);
        }
        self.tuples += 1;
        self.modified();
        Ok(self.tuples - 1)
    }

    /// Allocated capacity in tuples (smallest over components).
    pub fn capacity(&self) -> usize {
        self.buffers.iter().map(Vec::capacity).min().unwrap_or(0)
    }

    /// Assign raw `v` to every value, in parallel.
    pub fn fill(&mut self, v: T) {
        let ctx = smp::global();
        for b in &mut self.buffers {
            ctx.fill(b, v);
        }
        self.modified();
    }

    /// Explicit copy into array-of-structures layout. Scaled components are converted
    /// through `f64` and narrowed back to `T`.
    pub fn to_aos(&self) -> AosArray<T> {
        let c = self.components();
        let mut data = Vec::with_capacity(self.tuples * c);
        for t in 0..self.tuples {
            for k in 0..c {
                data.push(match self.scale[k] {
                    Some(_) => T::from_f64(self.get(t, k)),
                    None => self.buffers[k][t],
                });
            }
        }
        // Buffers hold whole tuples by construction.
        match AosArray::from_vec(c, data) {
            Ok(a) => a.named(self.name.clone()),
            Err(_) => AosArray::new(c).named(self.name.clone()),
        }
    }

    /// Advance the modified stamp.
    pub fn modified(&mut self) {
        self.mtime.modified();
    }

    fn component_range(&self, comp: usize, mode: RangeMode) -> (f64, f64) {
        self.cache.component(self.mtime.get(), comp, mode, || {
            if comp >= self.components() {
                return EMPTY_RANGE;
            }
            let ctx = smp::global();
            reduce_range(&ctx, self.tuples, mode, |t| self.get(t, comp))
        })
    }
}

impl<T: Scalar> DataArray for SoaArray<T> {
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
        Layout::Soa
    }

    fn number_of_tuples(&self) -> usize {
        self.tuples
    }

    fn number_of_components(&self) -> usize {
        self.components()
    }

    fn component(&self, tuple: usize, comp: usize) -> f64 {
        self.get(tuple, comp)
    }

    fn set_component(&mut self, tuple: usize, comp: usize, value: f64) {
        self.set(tuple, comp, value);
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
        self.cache.magnitude(self.mtime.get(), || {
            let ctx = smp::global();
            reduce_range(&ctx, self.tuples, RangeMode::Full, |t| {
                (0..self.components())
                    .map(|k| self.get(t, k).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
        })
    }

    fn gather(&self, tuples: &[usize]) -> VoxflowResult<Box<dyn DataArray>> {
        if let Some(&bad) = tuples.iter().find(|&&t| t >= self.tuples) {
            return Err(VoxflowError::IndexOutOfRange {
                index: bad,
                len: self.tuples,
            });
        }
        let buffers = self
            .buffers
            .iter()
            .map(|b| tuples.iter().map(|&t| b[t]).collect())
            .collect();
        let mut out = Self::from_unchecked(buffers, tuples.len()).named(self.name.clone());
        out.scale = self.scale.clone();
        Ok(Box::new(out))
    }

    fn empty_like(&self, tuples: usize) -> VoxflowResult<Box<dyn DataArray>> {
        let mut out = Self::zeros(tuples, self.components())?.named(self.name.clone());
        out.scale = self.scale.clone();
        Ok(Box::new(out))
    }

    fn clone_array(&self) -> Box<dyn DataArray> {
        Box::new(self.clone())
    }

    fn copy_tuples_from(&mut self, src: &dyn DataArray, pairs: &[(usize, usize)]) -> VoxflowResult<()> {
        if src.number_of_components() != self.components() {
            return Err(VoxflowError::bad_input(format!(
                "component mismatch: {} vs {}",
                src.number_of_components(),
                self.components()
            )));
        }
        check_pairs(pairs, self.tuples, src.number_of_tuples())?;
        match src.downcast_ref::<Self>() {
            Some(same) if same.scale == self.scale => {
                for (k, b) in self.buffers.iter_mut().enumerate() {
                    for &(d, s) in pairs {
                        b[d] = same.buffers[k][s];
                    }
                }
            }
            _ => {
                for &(d, s) in pairs {
                    for k in 0..self.components() {
                        let v = src.component(s, k);
                        let raw = match self.scale[k] {
                            Some(sc) if sc != 0.0 => v / sc,
                            _ => v,
                        };
                        self.buffers[k][d] = T::from_f64(raw);
                    }
                }
            }
        }
        self.modified();
        Ok(())
    }

    fn write_to(&self, out: &mut Vec<u8>) -> VoxflowResult<()> {
        crate::array::persist::write_soa(self, out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/array/soa.rs"]
mod tests;
