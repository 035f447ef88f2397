use std::collections::BTreeMap;
use std::sync::Arc;

use crate::array::DataArray;
use crate::foundation::error::{VoxflowError, VoxflowResult};

/// Named attribute arrays of matching length (point data or cell data).
#[derive(Clone, Debug, Default)]
pub struct FieldData {
    tuples: usize,
    arrays: BTreeMap<String, Arc<dyn DataArray>>,
    active_scalars: Option<String>,
}

impl FieldData {
    /// Empty collection whose arrays must hold `tuples` tuples.
    pub fn new(tuples: usize) -> Self {
        Self {
            tuples,
            ..Self::default()
        }
    }

    /// Required tuple count.
    pub fn tuples(&self) -> usize {
        self.tuples
    }

    /// Change the required tuple count; existing arrays are dropped when it changes.
    pub fn set_tuples(&mut self, tuples: usize) {
        if tuples != self.tuples {
            self.arrays.clear();
            self.active_scalars = None;
            self.tuples = tuples;
        }
    }

    /// Add or replace an array (keyed by its name).
    pub fn insert(&mut self, array: Arc<dyn DataArray>) -> VoxflowResult<()> {
        if array.name().is_empty() {
            return Err(VoxflowError::bad_input("attribute arrays must be named"));
        }
        if array.number_of_tuples() != self.tuples {
            return Err(VoxflowError::bad_input(format!(
                "array '{}' has {} tuples, expected {}",
                array.name(),
                array.number_of_tuples(),
                self.tuples
            )));
        }
        self.arrays.insert(array.name().to_owned(), array);
        Ok(())
    }

    /// Array by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn DataArray>> {
        self.arrays.get(name)
    }

    /// Mutable access to a named array; a shared array is copied first.
    pub fn array_mut(&mut self, name: &str) -> Option<&mut dyn DataArray> {
        let slot = self.arrays.get_mut(name)?;
        if Arc::get_mut(slot).is_none() {
            *slot = Arc::from(slot.clone_array());
        }
        Arc::get_mut(slot)
    }

    /// Remove an array by name.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn DataArray>> {
        if self.active_scalars.as_deref() == Some(name) {
            self.active_scalars = None;
        }
        self.arrays.remove(name)
    }

    /// Arrays in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn DataArray>)> {
        self.arrays.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of arrays.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// `true` without arrays.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Mark a contained array as the active scalars.
    pub fn set_active_scalars(&mut self, name: &str) -> VoxflowResult<()> {
        if !self.arrays.contains_key(name) {
            return Err(VoxflowError::bad_input(format!("no array named '{name}'")));
        }
        self.active_scalars = Some(name.to_owned());
        Ok(())
    }

    /// Name of the active scalars.
    pub fn active_scalars_name(&self) -> Option<&str> {
        self.active_scalars.as_deref()
    }

    /// The active scalars; falls back to the only array when exactly one is present.
    pub fn active_scalars(&self) -> Option<&Arc<dyn DataArray>> {
        match &self.active_scalars {
            Some(n) => self.arrays.get(n),
            None if self.arrays.len() == 1 => self.arrays.values().next(),
            None => None,
        }
    }

    /// Latest modified stamp among the arrays.
    pub fn mtime(&self) -> u64 {
        self.arrays.values().map(|a| a.mtime()).max().unwrap_or(0)
    }

    /// Same array names, types and layouts holding `tuples` zero tuples.
    pub fn empty_like(&self, tuples: usize) -> VoxflowResult<Self> {
        self.try_map(tuples, |a| a.empty_like(tuples))
    }

    /// Every array restricted to `indices`, in order.
    pub fn gather(&self, indices: &[usize]) -> VoxflowResult<Self> {
        self.try_map(indices.len(), |a| a.gather(indices))
    }

    fn try_map(
        &self,
        tuples: usize,
        f: impl Fn(&dyn DataArray) -> VoxflowResult<Box<dyn DataArray>>,
    ) -> VoxflowResult<Self> {
        let mut out = Self::new(tuples);
        for a in self.arrays.values() {
            out.insert(Arc::from(f(a.as_ref())?))?;
        }
        out.active_scalars = self.active_scalars.clone();
        Ok(out)
    }
}
