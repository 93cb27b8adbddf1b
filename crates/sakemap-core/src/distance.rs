//! Distance primitives over taste vectors.
//!
//! Vectors here are tiny (six components), so these are plain scalar loops.

/// Squared Euclidean distance between two vectors.
#[must_use]
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Dimension mismatch in squared_euclidean");
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean distance between two vectors.
#[must_use]
#[inline]
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    squared_euclidean(a, b).sqrt()
}

/// Returns the index of the candidate nearest to `query` by squared
/// Euclidean distance, or `None` when there are no candidates.
///
/// A later candidate only wins with a strictly smaller distance, so the
/// lowest index wins ties.
#[must_use]
pub fn nearest_index<V: AsRef<[f32]>>(query: &[f32], candidates: &[V]) -> Option<usize> {
    let (first, rest) = candidates.split_first()?;
    let mut best = 0;
    let mut best_dist = squared_euclidean(query, first.as_ref());

    for (offset, candidate) in rest.iter().enumerate() {
        let d = squared_euclidean(query, candidate.as_ref());
        if d < best_dist {
            best_dist = d;
            best = offset + 1;
        }
    }

    Some(best)
}
