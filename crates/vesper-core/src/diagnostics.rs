//! Rate-limited diagnostics for hot compilation paths.
//!
//! Analyses can hit their degradation paths thousands of times per second
//! on large workloads; logging each occurrence would drown the output.
//! [`perf_warning`] keeps a per-site counter and forwards only every
//! `every`-th occurrence to the caller's emit closure.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

static COUNTS: Lazy<Mutex<FxHashMap<&'static str, u64>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

/// Run `emit` on the first occurrence of `key` and then once every
/// `every` occurrences after that.
pub fn perf_warning(key: &'static str, every: u64, emit: impl FnOnce()) {
    let n = {
        let mut counts = COUNTS.lock();
        let n = counts.entry(key).or_insert(0);
        *n += 1;
        *n
    };
    if (n - 1) % every.max(1) == 0 {
        emit();
    }
}

/// How many times `key` has been observed so far, emitted or not.
pub fn occurrence_count(key: &'static str) -> u64 {
    COUNTS.lock().get(key).copied().unwrap_or(0)
}
