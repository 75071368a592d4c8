//! Parallel load support.
//!
//! Splits the texture load phase across threads using [`std::thread::scope`],
//! falling back to sequential iteration on WASM where threads are
//! unavailable. Loads do file I/O and CPU filtering only, so workers never
//! touch the device.

/// Configuration for parallel loading.
///
/// Controls the number of worker threads and minimum batch size.
/// Use [`Default::default()`] for sensible defaults.
#[derive(Debug, Clone)]
pub struct ParConfig {
    /// Minimum number of textures per batch. Default: 1.
    pub min_batch_size: usize,
    /// Number of worker threads. `None` uses
    /// [`std::thread::available_parallelism`]. Default: `None`.
    pub num_threads: Option<usize>,
}

impl Default for ParConfig {
    fn default() -> Self {
        Self {
            min_batch_size: 1,
            num_threads: None,
        }
    }
}

impl ParConfig {
    pub(crate) fn effective_threads(&self) -> usize {
        self.num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1)
    }
}

/// Run `f` on every item, spreading batches over worker threads.
///
/// Returns once every call finished. Runs on the calling thread when a
/// single batch would result.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn par_for_each<T, F>(items: &[T], config: &ParConfig, f: &F)
where
    T: Sync,
    F: Fn(&T) + Sync,
{
    let count = items.len();
    let num_threads = config.effective_threads();
    let batch_size = count.div_ceil(num_threads).max(config.min_batch_size).max(1);

    if num_threads == 1 || count <= batch_size {
        items.iter().for_each(f);
        return;
    }

    std::thread::scope(|scope| {
        for chunk in items.chunks(batch_size) {
            scope.spawn(move || chunk.iter().for_each(f));
        }
    });
}

/// WASM fallback: sequential iteration (no threads available).
#[cfg(target_arch = "wasm32")]
pub(crate) fn par_for_each<T, F>(items: &[T], _config: &ParConfig, f: &F)
where
    T: Sync,
    F: Fn(&T) + Sync,
{
    items.iter().for_each(f);
}
