use std::any::Any;
use std::sync::Arc;

use crate::dataset::{DataKind, DataObject, ImageData};
use crate::foundation::core::Extent;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::pipeline::fingerprint::Fingerprint;
use crate::pipeline::information::Information;
use crate::pipeline::keys::{
    DATA_OBJECT, DATA_TYPE_NAME, REQUEST_KEYS, UPDATE_EXTENT, UPDATE_NUMBER_OF_GHOST_LEVELS,
    UPDATE_NUMBER_OF_PIECES, UPDATE_PIECE_NUMBER, UPDATE_TIME_STEP, WHOLE_EXTENT,
};

/// Declaration of one input port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputPortSpec {
    /// Port label used in diagnostics.
    pub name: &'static str,
    /// Data kinds a producer may deliver on this port.
    pub accepts: Vec<DataKind>,
    /// The port may stay unconnected.
    pub optional: bool,
    /// The port takes more than one connection.
    pub repeatable: bool,
}

impl InputPortSpec {
    /// Required, single-connection port.
    pub fn new(name: &'static str, accepts: &[DataKind]) -> Self {
        Self {
            name,
            accepts: accepts.to_vec(),
            optional: false,
            repeatable: false,
        }
    }

    /// Builder: allow the port to stay unconnected.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Builder: allow several connections.
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// `true` when `kind` may be connected here.
    pub fn accepts(&self, kind: DataKind) -> bool {
        self.accepts.contains(&kind)
    }
}

/// Declaration of one output port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPortSpec {
    /// Port label used in diagnostics.
    pub name: &'static str,
    /// Data kind produced.
    pub kind: DataKind,
}

impl OutputPortSpec {
    /// Output producing `kind`.
    pub fn new(name: &'static str, kind: DataKind) -> Self {
        Self { name, kind }
    }
}

/// A pipeline stage: ports plus the three request handlers.
///
/// Handlers receive one [`Information`] per input connection (`inputs[port][conn]`) and one
/// per output port. The executive fills in `WHOLE_EXTENT` & co. from upstream before
/// `request_information`, the `UPDATE_*` keys before `request_update_extent`, and
/// `DATA_OBJECT` on the inputs before `request_data`. `request_data` must store a
/// `DATA_OBJECT` on every output.
pub trait Algorithm: Any + Send + Sync {
    /// Name used in logs and error annotations.
    fn name(&self) -> &str;

    /// Input port declarations.
    fn input_ports(&self) -> Vec<InputPortSpec> {
        Vec::new()
    }

    /// Output port declarations.
    fn output_ports(&self) -> Vec<OutputPortSpec> {
        vec![OutputPortSpec::new("output", DataKind::Image)]
    }

    /// Ghost width the algorithm reads around each output point on structured inputs.
    fn stencil_width(&self) -> i32 {
        0
    }

    /// Stamp of external state the output depends on (e.g. a wrapped data object).
    fn dependency_mtime(&self) -> u64 {
        0
    }

    /// Stable fingerprint of the configuration, enabling the persistent cache.
    fn fingerprint(&self) -> Option<Fingerprint> {
        None
    }

    /// Publish metadata about the outputs. Default: forward the first input's metadata.
    fn request_information(
        &mut self,
        inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        forward_information(inputs, outputs);
        Ok(())
    }

    /// Declare what each input must deliver for the requested outputs.
    ///
    /// Default: structured inputs get the first output's update extent grown by
    /// [`Algorithm::stencil_width`] and clamped to their whole extent. Piece, ghost and time
    /// requests are forwarded unchanged.
    fn request_update_extent(
        &mut self,
        inputs: &mut [Vec<Information>],
        outputs: &[Information],
    ) -> VoxflowResult<()> {
        forward_update_extent(self.stencil_width(), inputs, outputs);
        Ok(())
    }

    /// Produce every output.
    fn request_data(
        &mut self,
        inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()>;
}

/// Copy producer metadata from `inputs[0][0]` into every output, skipping request keys and
/// the per-port data entries.
pub fn forward_information(inputs: &[Vec<Information>], outputs: &mut [Information]) {
    let Some(first) = inputs.first().and_then(|c| c.first()) else {
        return;
    };
    for out in outputs.iter_mut() {
        for (k, v) in first.iter() {
            if k == DATA_OBJECT.name() || k == DATA_TYPE_NAME.name() || REQUEST_KEYS.contains(&k) {
                continue;
            }
            out.set_raw(k, v.clone());
        }
    }
}

/// The default update-extent rule, usable from custom handlers.
pub fn forward_update_extent(
    stencil: i32,
    inputs: &mut [Vec<Information>],
    outputs: &[Information],
) {
    let Some(out) = outputs.first() else {
        return;
    };
    let ue = out.get(&UPDATE_EXTENT);
    for info in inputs.iter_mut().flatten() {
        for key in [
            UPDATE_PIECE_NUMBER,
            UPDATE_NUMBER_OF_PIECES,
            UPDATE_NUMBER_OF_GHOST_LEVELS,
        ] {
            match out.get(&key) {
                Some(v) => info.set(&key, v),
                None => info.remove(&key),
            }
        }
        match out.get(&UPDATE_TIME_STEP) {
            Some(t) => info.set(&UPDATE_TIME_STEP, t),
            None => info.remove(&UPDATE_TIME_STEP),
        }
        if let (Some(ue), Some(whole)) = (ue, info.get(&WHOLE_EXTENT)) {
            info.set(&UPDATE_EXTENT, grown_request(ue, stencil, whole));
        }
    }
}

/// `ue` grown by `stencil` layers, clamped to `whole`. Empty requests stay empty.
pub fn grown_request(ue: Extent, stencil: i32, whole: Extent) -> Extent {
    if ue.is_empty() {
        return ue;
    }
    ue.grow_within(stencil, whole)
}

/// Data object delivered on `inputs[port][conn]`.
pub fn input_object(
    inputs: &[Vec<Information>],
    port: usize,
    conn: usize,
) -> VoxflowResult<Arc<DataObject>> {
    inputs
        .get(port)
        .and_then(|c| c.get(conn))
        .and_then(|info| info.get(&DATA_OBJECT))
        .ok_or_else(|| {
            VoxflowError::bad_input(format!("no data on input port {port} connection {conn}"))
        })
}

/// Image view of a data object, or `BadInput`.
pub fn as_image(obj: &DataObject) -> VoxflowResult<&ImageData> {
    obj.as_image().ok_or_else(|| {
        VoxflowError::bad_input(format!("expected image data, got {}", obj.kind()))
    })
}

/// Store `obj` as the data of output `port`.
pub fn set_output(outputs: &mut [Information], port: usize, obj: impl Into<DataObject>) -> VoxflowResult<()> {
    let info = outputs
        .get_mut(port)
        .ok_or_else(|| VoxflowError::bad_input(format!("no output port {port}")))?;
    info.set(&DATA_OBJECT, Arc::new(obj.into()));
    Ok(())
}

/// Update extent requested on an output (whole extent when none was requested).
pub fn requested_extent(info: &Information) -> Option<Extent> {
    info.get(&UPDATE_EXTENT).or_else(|| info.get(&WHOLE_EXTENT))
}
