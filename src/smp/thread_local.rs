use std::sync::Mutex;

use crate::smp::context::SmpContext;

/// Per-worker accumulator for use inside parallel bodies.
///
/// Each worker id gets its own slot, created lazily by `init` on first access. After the
/// parallel call returns, [`ThreadLocal::into_values`] hands back every slot that was
/// touched so the caller can combine them.
pub struct ThreadLocal<T> {
    slots: Vec<Mutex<Option<T>>>,
    init: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: Send> ThreadLocal<T> {
    /// One slot per worker of `ctx`.
    pub fn new(ctx: &SmpContext, init: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self::with_slots(ctx.estimated_thread_count(), init)
    }

    /// Explicit slot count (at least one).
    pub fn with_slots(slots: usize, init: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            slots: (0..slots.max(1)).map(|_| Mutex::new(None)).collect(),
            init: Box::new(init),
        }
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Run `f` on the slot of worker `tid`.
    pub fn with<R>(&self, tid: usize, f: impl FnOnce(&mut T) -> R) -> R {
        let slot = &self.slots[tid % self.slots.len()];
        let mut g = slot.lock().unwrap_or_else(|e| e.into_inner());
        let v = g.get_or_insert_with(|| (self.init)());
        f(v)
    }

    /// Values of every slot that was touched, in worker order.
    pub fn into_values(self) -> Vec<T> {
        self.slots
            .into_iter()
            .filter_map(|m| m.into_inner().unwrap_or_else(|e| e.into_inner()))
            .collect()
    }

    /// Fold every touched slot into `init` with `f`.
    pub fn combine<A>(self, init: A, f: impl FnMut(A, T) -> A) -> A {
        self.into_values().into_iter().fold(init, f)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/smp/thread_local.rs"]
mod tests;
