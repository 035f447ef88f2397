use std::path::PathBuf;

use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::smp::BackendKind;

/// Environment variable selecting the SMP backend (`sequential`, `pool`, `omp`).
pub const ENV_SMP_BACKEND: &str = "VTK_SMP_BACKEND";
/// Environment variable capping the SMP thread count (integer >= 0, 0 = backend default).
pub const ENV_SMP_MAX_THREADS: &str = "VTK_SMP_MAX_THREADS";
/// Environment variable enabling the executive's persistent cache directory.
pub const ENV_CACHE_PATH: &str = "VTK_CACHE_PATH";

/// Process configuration read from the environment.
///
/// Every field is optional; `None` means "use the built-in default".
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    /// SMP backend requested via [`ENV_SMP_BACKEND`].
    pub smp_backend: Option<BackendKind>,
    /// Thread cap requested via [`ENV_SMP_MAX_THREADS`].
    pub smp_max_threads: Option<usize>,
    /// Persistent executive cache directory from [`ENV_CACHE_PATH`].
    pub cache_path: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> VoxflowResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> VoxflowResult<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let smp_backend = get(ENV_SMP_BACKEND)
            .map(|v| BackendKind::parse(&v))
            .transpose()?;

        let smp_max_threads = get(ENV_SMP_MAX_THREADS)
            .map(|v| {
                v.parse::<usize>().map_err(|_| {
                    VoxflowError::validation(format!(
                        "{ENV_SMP_MAX_THREADS} must be an integer >= 0, got '{v}'"
                    ))
                })
            })
            .transpose()?;

        let cache_path = get(ENV_CACHE_PATH).map(PathBuf::from);

        Ok(Self {
            smp_backend,
            smp_max_threads,
            cache_path,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
