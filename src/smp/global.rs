//! Process-wide SMP state.
//!
//! The backend and thread count are chosen once. [`initialize_with`] may replace the
//! context until the first parallel call goes through [`global`]; from then on only
//! re-initialising with the same options is accepted.

use std::sync::{Arc, Mutex};

use crate::foundation::config::RuntimeConfig;
use crate::foundation::diagnostics::{self, Severity};
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::smp::backend::BackendKind;
use crate::smp::context::{SmpContext, SmpOpts};

struct GlobalState {
    ctx: Option<Arc<SmpContext>>,
    used: bool,
}

static STATE: Mutex<GlobalState> = Mutex::new(GlobalState {
    ctx: None,
    used: false,
});

fn lock() -> std::sync::MutexGuard<'static, GlobalState> {
    STATE.lock().unwrap_or_else(|e| e.into_inner())
}

/// Initialise the process-wide context with `n_threads` (0 = backend default).
///
/// The backend comes from `VTK_SMP_BACKEND` (default: pool).
pub fn initialize(n_threads: usize) -> VoxflowResult<()> {
    let cfg = RuntimeConfig::from_env()?;
    initialize_with(SmpOpts {
        backend: cfg.smp_backend.unwrap_or_default(),
        threads: n_threads,
    })
}

/// Initialise the process-wide context with explicit options.
#[tracing::instrument(level = "debug")]
pub fn initialize_with(opts: SmpOpts) -> VoxflowResult<()> {
    let cap = RuntimeConfig::from_env()?.smp_max_threads;
    let resolved = opts.resolve(cap);

    let mut st = lock();
    if let Some(cur) = &st.ctx {
        if cur.opts() == resolved {
            return Ok(());
        }
        if st.used {
            return Err(VoxflowError::validation(format!(
                "SMP already running as {} x{}; cannot switch to {} x{}",
                cur.backend(),
                cur.estimated_thread_count(),
                resolved.backend,
                resolved.threads
            )));
        }
    }
    st.ctx = Some(Arc::new(SmpContext::with_default_cap(resolved, cap)?));
    Ok(())
}

/// The process-wide context, built from the environment on first use.
pub fn try_global() -> VoxflowResult<Arc<SmpContext>> {
    let mut st = lock();
    if st.ctx.is_none() {
        let cfg = RuntimeConfig::from_env()?;
        let opts = SmpOpts {
            backend: cfg.smp_backend.unwrap_or_default(),
            threads: 0,
        };
        st.ctx = Some(Arc::new(SmpContext::with_default_cap(
            opts,
            cfg.smp_max_threads,
        )?));
    }
    st.used = true;
    match &st.ctx {
        Some(ctx) => Ok(Arc::clone(ctx)),
        None => Err(VoxflowError::backend_unavailable("SMP context missing")),
    }
}

/// Like [`try_global`]; an unusable environment falls back to the sequential backend and
/// reports an error diagnostic.
pub fn global() -> Arc<SmpContext> {
    match try_global() {
        Ok(ctx) => ctx,
        Err(e) => {
            diagnostics::emit(
                Severity::Error,
                "smp",
                format!("{e}; falling back to the sequential backend"),
            );
            let ctx = Arc::new(SmpContext::sequential());
            let mut st = lock();
            st.ctx = Some(Arc::clone(&ctx));
            st.used = true;
            ctx
        }
    }
}

/// Options of the process-wide context, if it was initialised.
pub fn current_opts() -> Option<SmpOpts> {
    lock().ctx.as_ref().map(|c| c.opts())
}

/// Backend of the process-wide context.
pub fn backend() -> BackendKind {
    global().backend()
}

/// Worker count of the process-wide context.
pub fn estimated_thread_count() -> usize {
    global().estimated_thread_count()
}

/// [`SmpContext::parallel_for`] on the process-wide context.
pub fn parallel_for<F>(first: usize, last: usize, grain: usize, body: F) -> VoxflowResult<()>
where
    F: Fn(usize, usize, usize) -> VoxflowResult<()> + Sync,
{
    global().parallel_for(first, last, grain, body)
}

/// [`SmpContext::parallel_reduce`] on the process-wide context.
pub fn parallel_reduce<T, M, C>(
    first: usize,
    last: usize,
    grain: usize,
    init: T,
    map: M,
    combine: C,
) -> VoxflowResult<T>
where
    T: Send,
    M: Fn(usize, usize, usize) -> VoxflowResult<T> + Sync,
    C: Fn(T, T) -> T,
{
    global().parallel_reduce(first, last, grain, init, map, combine)
}

#[cfg(test)]
#[path = "../../tests/unit/smp/global.rs"]
mod tests;
