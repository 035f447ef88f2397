use std::cell::Cell;
use std::cmp::Ordering;

use rayon::prelude::*;

use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::smp::backend::{BackendKind, hardware_concurrency};

/// Options for building an [`SmpContext`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SmpOpts {
    /// Scheduling backend.
    pub backend: BackendKind,
    /// Worker count; `0` selects the backend default.
    pub threads: usize,
}

impl SmpOpts {
    /// Options for the given backend with its default thread count.
    pub fn backend(backend: BackendKind) -> Self {
        Self {
            backend,
            threads: 0,
        }
    }

    /// Resolve `threads == 0` to a concrete count and clamp to hardware concurrency.
    ///
    /// `default_cap` is the configured `VTK_SMP_MAX_THREADS` value, if any.
    pub fn resolve(self, default_cap: Option<usize>) -> Self {
        let hw = hardware_concurrency();
        let threads = match self.backend {
            BackendKind::Sequential => 1,
            _ if self.threads == 0 => default_cap.filter(|&n| n > 0).unwrap_or(hw).min(hw),
            _ => {
                if self.threads > hw {
                    tracing::warn!(
                        requested = self.threads,
                        hardware = hw,
                        "SMP thread count exceeds hardware concurrency; clamping"
                    );
                }
                self.threads.min(hw)
            }
        };
        Self {
            backend: self.backend,
            threads: threads.max(1),
        }
    }
}

thread_local! {
    static REGION: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Marks the current thread as running inside a parallel body with id `tid`.
struct RegionGuard {
    prev: Option<usize>,
}

impl RegionGuard {
    fn enter(tid: usize) -> Self {
        let prev = REGION.with(|r| r.replace(Some(tid)));
        Self { prev }
    }
}

impl Drop for RegionGuard {
    fn drop(&mut self) {
        REGION.with(|r| r.set(self.prev));
    }
}

/// Worker id of the enclosing parallel body, if any.
pub fn current_thread_id() -> Option<usize> {
    REGION.with(|r| r.get())
}

/// A configured SMP backend: the carrier of every parallel primitive.
///
/// Bodies receive `(begin, end, thread_id)` over contiguous sub-ranges. Between workers
/// there is no ordering; within a sub-range iteration is ascending. Everything a body writes
/// is visible to the caller once the call returns. Calls issued from inside a body run
/// sequentially on the calling worker.
pub struct SmpContext {
    opts: SmpOpts,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for SmpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmpContext")
            .field("backend", &self.opts.backend)
            .field("threads", &self.opts.threads)
            .finish()
    }
}

impl SmpContext {
    /// Build a context. `opts.threads == 0` resolves to the hardware concurrency.
    pub fn new(opts: SmpOpts) -> VoxflowResult<Self> {
        Self::with_default_cap(opts, None)
    }

    pub(crate) fn with_default_cap(opts: SmpOpts, cap: Option<usize>) -> VoxflowResult<Self> {
        let opts = opts.resolve(cap);
        let pool = match opts.backend {
            BackendKind::Pool | BackendKind::Omp => Some(build_thread_pool(opts.threads)?),
            BackendKind::Sequential => None,
        };
        tracing::debug!(backend = %opts.backend, threads = opts.threads, "SMP context ready");
        Ok(Self { opts, pool })
    }

    /// Single-threaded context.
    pub fn sequential() -> Self {
        Self {
            opts: SmpOpts {
                backend: BackendKind::Sequential,
                threads: 1,
            },
            pool: None,
        }
    }

    /// Resolved options.
    pub fn opts(&self) -> SmpOpts {
        self.opts
    }

    /// Active backend.
    pub fn backend(&self) -> BackendKind {
        self.opts.backend
    }

    /// Number of workers a parallel call may use.
    pub fn estimated_thread_count(&self) -> usize {
        self.opts.threads
    }

    /// Grain actually used for a range of `len` items; `0` means automatic.
    pub fn effective_grain(&self, len: usize, grain: usize) -> usize {
        if grain > 0 {
            return grain;
        }
        (len / (4 * self.opts.threads.max(1))).max(1)
    }

    /// Execute `body(begin, end, thread_id)` over sub-ranges partitioning `[first, last)`.
    ///
    /// `body` is not invoked when the range is empty. If bodies fail, every worker still
    /// finishes its current sub-range and the error of the lowest failing sub-range is
    /// returned.
    pub fn parallel_for<F>(&self, first: usize, last: usize, grain: usize, body: F) -> VoxflowResult<()>
    where
        F: Fn(usize, usize, usize) -> VoxflowResult<()> + Sync,
    {
        self.parallel_map(first, last, grain, body).map(|_| ())
    }

    /// Like [`SmpContext::parallel_for`], returning each sub-range's result in range order.
    pub fn parallel_map<R, F>(
        &self,
        first: usize,
        last: usize,
        grain: usize,
        body: F,
    ) -> VoxflowResult<Vec<R>>
    where
        R: Send,
        F: Fn(usize, usize, usize) -> VoxflowResult<R> + Sync,
    {
        if first >= last {
            return Ok(Vec::new());
        }
        let ranges = split_range(first, last, self.effective_grain(last - first, grain));
        self.run_items(ranges, |(b, e), tid| body(b, e, tid))
            .into_iter()
            .collect()
    }

    /// Map each sub-range to a partial result and merge partials pairwise.
    ///
    /// Partials are merged as a balanced tree that preserves range order, so `combine`
    /// needs to be associative but not commutative. The final value is `combine(init, tree)`;
    /// an empty range returns `init`.
    pub fn parallel_reduce<T, M, C>(
        &self,
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
        let partials = self.parallel_map(first, last, grain, map)?;
        Ok(match tree_merge(partials, &combine) {
            Some(v) => combine(init, v),
            None => init,
        })
    }

    /// Execute `body(offset, chunk, thread_id)` over disjoint mutable chunks of `data`.
    pub fn parallel_for_slice_mut<T, F>(&self, data: &mut [T], grain: usize, body: F) -> VoxflowResult<()>
    where
        T: Send,
        F: Fn(usize, &mut [T], usize) -> VoxflowResult<()> + Sync,
    {
        if data.is_empty() {
            return Ok(());
        }
        let g = self.effective_grain(data.len(), grain);
        let items: Vec<(usize, &mut [T])> = data
            .chunks_mut(g)
            .enumerate()
            .map(|(i, c)| (i * g, c))
            .collect();
        self.run_items(items, |(off, chunk), tid| body(off, chunk, tid))
            .into_iter()
            .collect::<VoxflowResult<Vec<()>>>()
            .map(|_| ())
    }

    /// Assign `value` to every element.
    pub fn fill<T>(&self, data: &mut [T], value: T)
    where
        T: Clone + Send + Sync,
    {
        let res = self.parallel_for_slice_mut(data, 0, |_, chunk, _| {
            chunk.fill(value.clone());
            Ok(())
        });
        debug_assert!(res.is_ok());
    }

    /// `output[i] = f(&input[i])` for every index.
    pub fn transform<A, B, F>(&self, input: &[A], output: &mut [B], f: F) -> VoxflowResult<()>
    where
        A: Sync,
        B: Send,
        F: Fn(&A) -> B + Sync,
    {
        if input.len() != output.len() {
            return Err(VoxflowError::validation(format!(
                "transform expects equal-length buffers ({} vs {})",
                input.len(),
                output.len()
            )));
        }
        self.parallel_for_slice_mut(output, 0, |off, chunk, _| {
            let n = chunk.len();
            for (o, i) in chunk.iter_mut().zip(&input[off..off + n]) {
                *o = f(i);
            }
            Ok(())
        })
    }

    /// Sort in ascending order.
    pub fn sort<T: Ord + Send>(&self, data: &mut [T]) {
        self.sort_by(data, T::cmp);
    }

    /// Sort with a comparator (unstable).
    pub fn sort_by<T, F>(&self, data: &mut [T], cmp: F)
    where
        T: Send,
        F: Fn(&T, &T) -> Ordering + Sync + Send,
    {
        match (&self.pool, current_thread_id()) {
            (Some(pool), None) => pool.install(|| data.par_sort_unstable_by(cmp)),
            _ => data.sort_unstable_by(cmp),
        }
    }

    /// Run `f(item, thread_id)` for every item, returning results in item order.
    fn run_items<I, R, F>(&self, items: Vec<I>, f: F) -> Vec<R>
    where
        I: Send,
        R: Send,
        F: Fn(I, usize) -> R + Sync,
    {
        if let Some(tid) = current_thread_id() {
            return items.into_iter().map(|it| f(it, tid)).collect();
        }

        match (self.opts.backend, &self.pool) {
            (BackendKind::Pool, Some(pool)) => pool.install(|| {
                items
                    .into_par_iter()
                    .map(|it| {
                        let tid = rayon::current_thread_index().unwrap_or(0);
                        let _g = RegionGuard::enter(tid);
                        f(it, tid)
                    })
                    .collect()
            }),
            (BackendKind::Omp, Some(pool)) => run_static(pool, items, &f),
            _ => {
                let _g = RegionGuard::enter(0);
                items.into_iter().map(|it| f(it, 0)).collect()
            }
        }
    }
}

/// Static schedule: block `t` of contiguous items runs as one task on `pool`, in ascending
/// order, with thread id `t`.
///
/// `rayon::scope` joins every block before re-raising a panic, so no body is cut short.
fn run_static<I, R, F>(pool: &rayon::ThreadPool, items: Vec<I>, f: &F) -> Vec<R>
where
    I: Send,
    R: Send,
    F: Fn(I, usize) -> R + Sync,
{
    let n = items.len();
    let nt = pool.current_num_threads().clamp(1, n.max(1));
    if nt == 1 {
        let _g = RegionGuard::enter(0);
        return items.into_iter().map(|it| f(it, 0)).collect();
    }

    let mut blocks: Vec<Vec<I>> = (0..nt).map(|_| Vec::new()).collect();
    for (i, it) in items.into_iter().enumerate() {
        blocks[i * nt / n].push(it);
    }

    let mut results: Vec<Vec<R>> = (0..nt).map(|_| Vec::new()).collect();
    pool.scope(|scope| {
        for (tid, (block, slot)) in blocks.into_iter().zip(results.iter_mut()).enumerate() {
            scope.spawn(move |_| {
                let _g = RegionGuard::enter(tid);
                *slot = block.into_iter().map(|it| f(it, tid)).collect();
            });
        }
    });
    results.into_iter().flatten().collect()
}

/// Contiguous sub-ranges of at most `grain` items covering `[first, last)`.
pub(crate) fn split_range(first: usize, last: usize, grain: usize) -> Vec<(usize, usize)> {
    let grain = grain.max(1);
    let mut out = Vec::with_capacity((last - first).div_ceil(grain));
    let mut b = first;
    while b < last {
        let e = b.saturating_add(grain).min(last);
        out.push((b, e));
        b = e;
    }
    out
}

fn tree_merge<T, C>(mut level: Vec<T>, combine: &C) -> Option<T>
where
    C: Fn(T, T) -> T,
{
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut it = level.into_iter();
        while let Some(a) = it.next() {
            match it.next() {
                Some(b) => next.push(combine(a, b)),
                None => next.push(a),
            }
        }
        level = next;
    }
    level.pop()
}

pub(crate) fn build_thread_pool(threads: usize) -> VoxflowResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(VoxflowError::validation(
            "SMP pool 'threads' must be >= 1 once resolved",
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("voxflow-smp-{i}"))
        .build()
        .map_err(|e| {
            VoxflowError::backend_unavailable(format!("failed to build rayon thread pool: {e}"))
        })
}

#[cfg(test)]
#[path = "../../tests/unit/smp/context.rs"]
mod tests;
