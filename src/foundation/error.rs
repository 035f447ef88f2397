/// Convenience result type used across voxflow.
pub type VoxflowResult<T> = Result<T, VoxflowError>;

/// Flat classification of [`VoxflowError`] values.
///
/// Useful when a caller only needs to branch on the failure class (for example the
/// `render-timing` binary mapping failures to exit codes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong dataset type or malformed extent on a port.
    BadInput,
    /// Allocation refused.
    OutOfMemory,
    /// Tuple/component index outside the array.
    IndexOutOfRange,
    /// Connecting two algorithms would close a loop.
    CycleDetected,
    /// Producer output type is not accepted by the consumer input port.
    PortTypeMismatch,
    /// An upstream algorithm failed to produce the requested data.
    ProducerFailed,
    /// The cooperative abort flag was observed.
    Aborted,
    /// A numeric precondition was violated (e.g. log scale over a non-positive range).
    NumericDomain,
    /// The requested SMP backend is not available.
    BackendUnavailable,
    /// Invalid options or API misuse.
    Validation,
    /// Persisted data could not be decoded.
    Serde,
    /// Filesystem errors.
    Io,
    /// Anything wrapped from dependencies.
    Other,
}

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum VoxflowError {
    /// Wrong dataset type or malformed extent on a port.
    #[error("bad input: {0}")]
    BadInput(String),

    /// Allocation refused.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Tuple or component index outside the valid range.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Valid length at the time of the access.
        len: usize,
    },

    /// Pipeline wiring would create a cycle.
    #[error("cycle detected: {0}")]
    CycleDetected(String),

    /// Producer output type is not accepted by the consumer input port.
    #[error("port type mismatch: {0}")]
    PortTypeMismatch(String),

    /// An algorithm failed to honor a request; annotated with the failing output port.
    #[error("producer '{algorithm}' failed on output port {port}: {source}")]
    ProducerFailed {
        /// Name of the algorithm that failed.
        algorithm: String,
        /// Output port of that algorithm.
        port: usize,
        /// Underlying failure.
        #[source]
        source: Box<VoxflowError>,
    },

    /// The cooperative abort flag was observed.
    #[error("aborted")]
    Aborted,

    /// Numeric domain violation.
    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    /// Requested SMP backend is not available in this build.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Invalid options or API misuse.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when decoding persisted data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VoxflowError {
    /// Build a [`VoxflowError::BadInput`] value.
    pub fn bad_input(msg: impl Into<String>) -> Self {
        Self::BadInput(msg.into())
    }

    /// Build a [`VoxflowError::OutOfMemory`] value.
    pub fn out_of_memory(msg: impl Into<String>) -> Self {
        Self::OutOfMemory(msg.into())
    }

    /// Build a [`VoxflowError::CycleDetected`] value.
    pub fn cycle(msg: impl Into<String>) -> Self {
        Self::CycleDetected(msg.into())
    }

    /// Build a [`VoxflowError::PortTypeMismatch`] value.
    pub fn port_mismatch(msg: impl Into<String>) -> Self {
        Self::PortTypeMismatch(msg.into())
    }

    /// Build a [`VoxflowError::NumericDomain`] value.
    pub fn numeric_domain(msg: impl Into<String>) -> Self {
        Self::NumericDomain(msg.into())
    }

    /// Build a [`VoxflowError::BackendUnavailable`] value.
    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Build a [`VoxflowError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VoxflowError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Wrap `self` as the failure of `algorithm` on output `port`.
    pub fn producer_failed(self, algorithm: impl Into<String>, port: usize) -> Self {
        Self::ProducerFailed {
            algorithm: algorithm.into(),
            port,
            source: Box::new(self),
        }
    }

    /// Flat classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadInput(_) => ErrorKind::BadInput,
            Self::OutOfMemory(_) => ErrorKind::OutOfMemory,
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::CycleDetected(_) => ErrorKind::CycleDetected,
            Self::PortTypeMismatch(_) => ErrorKind::PortTypeMismatch,
            Self::ProducerFailed { .. } => ErrorKind::ProducerFailed,
            Self::Aborted => ErrorKind::Aborted,
            Self::NumericDomain(_) => ErrorKind::NumericDomain,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Serde(_) => ErrorKind::Serde,
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Innermost error beneath any `ProducerFailed` annotations.
    pub fn root_cause(&self) -> &VoxflowError {
        let mut cur = self;
        while let Self::ProducerFailed { source, .. } = cur {
            cur = source;
        }
        cur
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
