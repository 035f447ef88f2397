//! Backend-pluggable parallel primitives.

/// Backend selection.
pub mod backend;
/// Parallel primitives over an explicit context.
pub mod context;
pub mod global;
/// Per-worker accumulators.
pub mod thread_local;

pub use backend::{BackendKind, hardware_concurrency};
pub use context::{SmpContext, SmpOpts, current_thread_id};
pub use global::{
    estimated_thread_count, global, initialize, initialize_with, parallel_for, parallel_reduce,
    try_global,
};
pub use thread_local::ThreadLocal;
