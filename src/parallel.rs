//! Scoped worker helpers used to spread independent columns (or rows) over threads.
//!
//! With `threads <= 1` everything runs on the calling thread. The output never depends on the
//! number of threads.

use anyhow::{anyhow, Result};
use std::ops::Range;

/// Splits `0..len` into at most `threads` contiguous ranges of nearly equal length.
pub(crate) fn split_ranges(len: usize, threads: usize) -> Vec<Range<usize>> {
    let threads = threads.clamp(1, len.max(1));
    let chunk = len.div_ceil(threads).max(1);
    (0..len)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(len))
        .collect()
}

/// Maps `f` over `0..len` and collects the results in index order.
pub(crate) fn map_indices<T, F>(len: usize, threads: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync,
{
    if threads <= 1 || len <= 1 {
        return (0..len).map(&f).collect();
    }

    let f = &f;
    let parts = crossbeam::scope(|s| {
        let handles = split_ranges(len, threads)
            .into_iter()
            .map(|range| s.spawn(move |_| range.map(f).collect::<Result<Vec<T>>>()))
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .map_err(|_| anyhow!("worker thread panicked @{}:{}", file!(), line!()))?
            })
            .collect::<Result<Vec<_>>>()
    })
    .map_err(|_| anyhow!("worker scope panicked @{}:{}", file!(), line!()))??;

    Ok(parts.into_iter().flatten().collect())
}

/// Calls `f(i, chunk)` for every `chunk_len`-sized chunk of `data` (the last one may be shorter).
pub(crate) fn for_each_chunk_mut<F>(data: &mut [u8], chunk_len: usize, threads: usize, f: F)
where
    F: Fn(usize, &mut [u8]) + Sync,
{
    if chunk_len == 0 || data.is_empty() {
        return;
    }

    let chunks = data.len().div_ceil(chunk_len);
    if threads <= 1 || chunks <= 1 {
        data.chunks_mut(chunk_len)
            .enumerate()
            .for_each(|(i, chunk)| f(i, chunk));
        return;
    }

    let per_worker = chunks.div_ceil(threads);
    let f = &f;
    let res = crossbeam::scope(|s| {
        for (w, group) in data.chunks_mut(per_worker * chunk_len).enumerate() {
            s.spawn(move |_| {
                for (k, chunk) in group.chunks_mut(chunk_len).enumerate() {
                    f(w * per_worker + k, chunk);
                }
            });
        }
    });

    if let Err(panic) = res {
        std::panic::resume_unwind(panic);
    }
}
