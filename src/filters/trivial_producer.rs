use std::sync::Arc;

use crate::dataset::{DataKind, DataObject};
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::pipeline::algorithm::{Algorithm, OutputPortSpec, requested_extent};
use crate::pipeline::information::Information;
use crate::pipeline::keys::{
    CAN_PRODUCE_SUB_EXTENT, DATA_OBJECT, ORIGIN, SCALAR_RANGE, SPACING, WHOLE_EXTENT,
};

/// Source that hands out an existing data object.
///
/// Image data is cropped to the requested extent; everything else is shared as is.
#[derive(Clone, Debug)]
pub struct TrivialProducer {
    data: Arc<DataObject>,
}

impl TrivialProducer {
    /// Wrap `data`.
    pub fn new(data: impl Into<DataObject>) -> Self {
        Self::from_arc(Arc::new(data.into()))
    }

    /// Wrap shared `data`.
    pub fn from_arc(data: Arc<DataObject>) -> Self {
        Self { data }
    }

    /// Wrapped object.
    pub fn data(&self) -> &Arc<DataObject> {
        &self.data
    }

    /// Kind of the wrapped object.
    pub fn kind(&self) -> DataKind {
        self.data.kind()
    }

    /// Replace the wrapped object. The kind must not change (the output port is fixed).
    pub fn set_data(&mut self, data: impl Into<DataObject>) -> VoxflowResult<()> {
        let data = data.into();
        if data.kind() != self.data.kind() {
            return Err(VoxflowError::validation(format!(
                "producer of {} data cannot switch to {}",
                self.data.kind(),
                data.kind()
            )));
        }
        self.data = Arc::new(data);
        Ok(())
    }
}

impl Algorithm for TrivialProducer {
    fn name(&self) -> &str {
        "trivial_producer"
    }

    fn output_ports(&self) -> Vec<OutputPortSpec> {
        vec![OutputPortSpec::new("output", self.data.kind())]
    }

    fn dependency_mtime(&self) -> u64 {
        self.data.mtime()
    }

    fn request_information(
        &mut self,
        _inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        let out = &mut outputs[0];
        if let Some(ext) = self.data.extent() {
            out.set(&WHOLE_EXTENT, ext);
        }
        if let Some(img) = self.data.as_image() {
            out.set(&ORIGIN, img.origin());
            out.set(&SPACING, img.spacing());
            out.set(&CAN_PRODUCE_SUB_EXTENT, true);
            if let Some(s) = img.scalars() {
                let (lo, hi) = s.range(0);
                out.set(&SCALAR_RANGE, [lo, hi]);
            }
        }
        Ok(())
    }

    fn request_data(
        &mut self,
        _inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        let out = &mut outputs[0];
        let data = match (self.data.as_image(), requested_extent(out)) {
            (Some(img), Some(ue)) if ue != img.extent() => {
                Arc::new(DataObject::from(img.crop(ue)?))
            }
            _ => Arc::clone(&self.data),
        };
        out.set(&DATA_OBJECT, data);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/trivial_producer.rs"]
mod tests;
