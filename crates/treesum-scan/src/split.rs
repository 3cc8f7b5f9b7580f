//! File batch splitting.

use std::ops::Range;

use treesum_core::SplitPolicy;

/// Whether a batch of `count` files is small enough to hash directly.
///
/// `total_bytes` is only evaluated for the size policy, and only when the
/// batch holds more than one file.
pub fn fits_in_one_unit(policy: SplitPolicy, count: usize, total_bytes: impl FnOnce() -> u64) -> bool {
    match policy {
        SplitPolicy::Count { max_files } => count <= max_files,
        SplitPolicy::Size { max_bytes } => count <= 1 || total_bytes() <= max_bytes,
    }
}

/// Split `0..len` into contiguous index ranges.
///
/// Every group gets `len / branch_factor` indices and the last group also
/// absorbs the remainder. When there are fewer items than groups, the
/// branch factor shrinks to `len` so no group is empty and every group is
/// strictly smaller than the input (for `len >= 2`).
pub fn split_ranges(len: usize, branch_factor: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let groups = branch_factor.clamp(1, len);
    let step = len / groups;

    (0..groups)
        .map(|i| {
            let start = i * step;
            let end = if i == groups - 1 { len } else { start + step };
            start..end
        })
        .collect()
}
