use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::foundation::error::{VoxflowError, VoxflowResult};

/// Cooperative abort flag.
///
/// Polled at the top of every `request_data` pass and at the outer pixel loop of the ray
/// caster. Setting it never interrupts a running body; the current pass notices it at the
/// next poll and returns [`VoxflowError::Aborted`].
///
/// Cloning shares the same underlying flag.
#[derive(Clone, Debug, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

static GLOBAL: OnceLock<AbortFlag> = OnceLock::new();

impl AbortFlag {
    /// A new, independent flag (cleared).
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide flag used when no explicit flag is configured.
    pub fn global() -> &'static AbortFlag {
        GLOBAL.get_or_init(AbortFlag::new)
    }

    /// Request an abort.
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clear a previous request.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// `true` when an abort was requested.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Aborted)` when an abort was requested.
    pub fn check(&self) -> VoxflowResult<()> {
        if self.is_set() {
            Err(VoxflowError::Aborted)
        } else {
            Ok(())
        }
    }
}
