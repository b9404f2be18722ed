//! Linear-rank weighted selection over a coverage-sorted candidate list.
//!
//! Classic linear-rank selection from evolutionary search: with the list
//! sorted ascending by coverage, the probability mass at rank `i` is
//! `(c - 2(c-1) * i/(n-1)) / n` with bias constant `c = 1.5`, so the
//! front of the sort (lowest coverage) gets `c/n` and the back gets
//! `(2-c)/n`. Every candidate keeps a non-zero probability.

use rand::Rng;

/// Bias constant of the rank distribution.
pub const RANK_BIAS: f64 = 1.5;

/// Build the cumulative probability table for `n` candidates.
///
/// The table is ephemeral and recomputed for every selection call.
pub fn rank_table(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }

    let c = RANK_BIAS;
    let mut cumulative = Vec::with_capacity(n);
    for i in 0..n {
        let position = i as f64 / (n - 1) as f64;
        let mass = (c - 2.0 * (c - 1.0) * position) / n as f64;
        let previous = cumulative.last().copied().unwrap_or(0.0);
        cumulative.push(previous + mass);
    }
    cumulative
}

/// Resolve a uniform draw `u` in `[0, 1)` to a rank index.
///
/// Returns the first index whose cumulative mass exceeds `u`; floating
/// rounding can leave the final entry just below 1.0, in which case the
/// last index wins.
pub fn select_index(cumulative: &[f64], u: f64) -> usize {
    for (i, bound) in cumulative.iter().enumerate() {
        if *bound > u {
            return i;
        }
    }
    cumulative.len().saturating_sub(1)
}

/// Draw one index from `n` ranks with the linear-rank distribution.
pub fn draw(n: usize, rng: &mut impl Rng) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let cumulative = rank_table(n);
    Some(select_index(&cumulative, rng.random::<f64>()))
}
