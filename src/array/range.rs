use std::sync::Mutex;

use crate::foundation::core::next_stamp;
use crate::smp::SmpContext;

/// Range of an empty or all-NaN component.
pub const EMPTY_RANGE: (f64, f64) = (f64::INFINITY, f64::NEG_INFINITY);

/// Which values participate in a range computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RangeMode {
    /// Ignore NaN, include ±∞.
    Full,
    /// Ignore NaN and ±∞.
    Finite,
}

impl RangeMode {
    #[inline]
    fn admits(self, v: f64) -> bool {
        match self {
            Self::Full => !v.is_nan(),
            Self::Finite => v.is_finite(),
        }
    }
}

#[inline]
pub(crate) fn merge(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    (a.0.min(b.0), a.1.max(b.1))
}

/// Min/max of `value(i)` over `0..n`, computed as a parallel tree reduction.
pub(crate) fn reduce_range<F>(ctx: &SmpContext, n: usize, mode: RangeMode, value: F) -> (f64, f64)
where
    F: Fn(usize) -> f64 + Sync,
{
    ctx.parallel_reduce(
        0,
        n,
        0,
        EMPTY_RANGE,
        |b, e, _| {
            let mut r = EMPTY_RANGE;
            for i in b..e {
                let v = value(i);
                if mode.admits(v) {
                    r = (r.0.min(v), r.1.max(v));
                }
            }
            Ok(r)
        },
        merge,
    )
    .unwrap_or(EMPTY_RANGE)
}

#[derive(Debug, Default)]
struct Slots {
    stamp: u64,
    full: Vec<Option<(f64, f64)>>,
    finite: Vec<Option<(f64, f64)>>,
    magnitude: Option<(f64, f64)>,
}

/// Per-array range cache. Entries are valid iff the cache stamp is at least the array's
/// modified stamp.
#[derive(Debug, Default)]
pub(crate) struct RangeCache {
    inner: Mutex<Slots>,
}

impl RangeCache {
    pub(crate) fn component(
        &self,
        mtime: u64,
        comp: usize,
        mode: RangeMode,
        compute: impl FnOnce() -> (f64, f64),
    ) -> (f64, f64) {
        {
            let g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if g.stamp >= mtime {
                let slot = match mode {
                    RangeMode::Full => g.full.get(comp),
                    RangeMode::Finite => g.finite.get(comp),
                };
                if let Some(Some(r)) = slot {
                    return *r;
                }
            }
        }

        let r = compute();
        let mut g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if g.stamp < mtime {
            *g = Slots {
                stamp: next_stamp(),
                ..Slots::default()
            };
        }
        let slots = match mode {
            RangeMode::Full => &mut g.full,
            RangeMode::Finite => &mut g.finite,
        };
        if slots.len() <= comp {
            slots.resize(comp + 1, None);
        }
        slots[comp] = Some(r);
        r
    }

    pub(crate) fn magnitude(&self, mtime: u64, compute: impl FnOnce() -> (f64, f64)) -> (f64, f64) {
        {
            let g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if g.stamp >= mtime
                && let Some(r) = g.magnitude
            {
                return r;
            }
        }
        let r = compute();
        let mut g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if g.stamp < mtime {
            *g = Slots {
                stamp: next_stamp(),
                ..Slots::default()
            };
        }
        g.magnitude = Some(r);
        r
    }

    /// Stamp of the cached entries (0 when nothing was computed yet).
    pub(crate) fn stamp(&self) -> u64 {
        self.inner.lock().map(|g| g.stamp).unwrap_or(0)
    }
}

impl Clone for RangeCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}
