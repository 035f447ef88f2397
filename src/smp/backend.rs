use crate::foundation::error::{VoxflowError, VoxflowResult};

/// Scheduling backend behind the SMP primitives.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Everything runs on the calling thread.
    Sequential,
    /// Fork-join work-stealing pool (rayon).
    #[default]
    Pool,
    /// Static schedule: each worker thread gets one contiguous block of chunks.
    Omp,
}

impl BackendKind {
    /// Parse a backend name as used by `VTK_SMP_BACKEND` (case-insensitive).
    pub fn parse(s: &str) -> VoxflowResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "serial" => Ok(Self::Sequential),
            "pool" | "stdthread" => Ok(Self::Pool),
            "omp" | "openmp" => Ok(Self::Omp),
            other => Err(VoxflowError::backend_unavailable(format!(
                "unknown SMP backend '{other}' (expected sequential, pool or omp)"
            ))),
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Pool => "pool",
            Self::Omp => "omp",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = VoxflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Number of hardware threads (at least 1).
pub fn hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
