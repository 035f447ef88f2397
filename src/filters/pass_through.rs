use crate::dataset::DataKind;
use crate::foundation::error::VoxflowResult;
use crate::pipeline::algorithm::{Algorithm, InputPortSpec, OutputPortSpec, input_object};
use crate::pipeline::information::Information;
use crate::pipeline::keys::DATA_OBJECT;

/// Forwards its input unchanged.
#[derive(Clone, Copy, Debug)]
pub struct PassThrough {
    kind: DataKind,
}

impl PassThrough {
    /// Pass `kind` data through.
    pub fn new(kind: DataKind) -> Self {
        Self { kind }
    }
}

impl Default for PassThrough {
    fn default() -> Self {
        Self::new(DataKind::Image)
    }
}

impl Algorithm for PassThrough {
    fn name(&self) -> &str {
        "pass_through"
    }

    fn input_ports(&self) -> Vec<InputPortSpec> {
        vec![InputPortSpec::new("input", &[self.kind])]
    }

    fn output_ports(&self) -> Vec<OutputPortSpec> {
        vec![OutputPortSpec::new("output", self.kind)]
    }

    fn request_data(
        &mut self,
        inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        outputs[0].set(&DATA_OBJECT, input_object(inputs, 0, 0)?);
        Ok(())
    }
}
