use std::sync::Arc;

use crate::dataset::{DataKind, DataObject, LeafRef};
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::pipeline::algorithm::{Algorithm, InputPortSpec, OutputPortSpec, input_object, set_output};
use crate::pipeline::composite_cache::DataObjectCache;
use crate::pipeline::information::Information;

/// Per-leaf operation of a [`CompositeLeafFilter`].
pub type LeafOp = Arc<dyn Fn(&DataObject) -> VoxflowResult<DataObject> + Send + Sync>;

/// Applies an operation to every leaf of a composite input.
///
/// Outputs of leaves that did not change since the previous execution are reused from a
/// [`DataObjectCache`]; only new or modified leaves are recomputed.
pub struct CompositeLeafFilter {
    op: LeafOp,
    cache: DataObjectCache,
    evaluations: usize,
}

impl std::fmt::Debug for CompositeLeafFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeLeafFilter")
            .field("cache", &self.cache)
            .field("evaluations", &self.evaluations)
            .finish_non_exhaustive()
    }
}

impl CompositeLeafFilter {
    /// Filter applying `op` to each present leaf.
    pub fn new(op: impl Fn(&DataObject) -> VoxflowResult<DataObject> + Send + Sync + 'static) -> Self {
        Self {
            op: Arc::new(op),
            cache: DataObjectCache::new(),
            evaluations: 0,
        }
    }

    /// Times `op` ran in total.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Leaf cache.
    pub fn cache(&self) -> &DataObjectCache {
        &self.cache
    }
}

impl Algorithm for CompositeLeafFilter {
    fn name(&self) -> &str {
        "composite_leaf_filter"
    }

    fn input_ports(&self) -> Vec<InputPortSpec> {
        vec![InputPortSpec::new("input", &[DataKind::Composite])]
    }

    fn output_ports(&self) -> Vec<OutputPortSpec> {
        vec![OutputPortSpec::new("output", DataKind::Composite)]
    }

    fn request_data(
        &mut self,
        inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        let input = input_object(inputs, 0, 0)?;
        let tree = input.as_composite().ok_or_else(|| {
            VoxflowError::bad_input(format!("expected composite data, got {}", input.kind()))
        })?;

        let op = Arc::clone(&self.op);
        let cache = &mut self.cache;
        let mut evaluated = 0usize;
        let out = tree.map_leaves(&mut |leaf: LeafRef<'_>| {
            let Some(data) = leaf.data else {
                return Ok(None);
            };
            if let Some(hit) = cache.find(leaf.index, data) {
                return Ok(Some(hit));
            }
            let produced = Arc::new(op(&**data)?);
            cache.update(leaf.index, data, Arc::clone(&produced));
            evaluated += 1;
            Ok::<_, VoxflowError>(Some(produced))
        })?;
        let dropped = cache.finalize();
        self.evaluations += evaluated;
        tracing::debug!(evaluated, dropped, "composite leaves");
        set_output(outputs, 0, out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/composite_leaf.rs"]
mod tests;
