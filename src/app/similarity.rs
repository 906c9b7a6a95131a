//! Token-overlap similarity used to match prompts against learned scenarios.

use std::collections::HashSet;

/// Minimum score for a learned scenario to answer a prompt.
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Jaccard index of the whitespace-separated tokens of `a` and `b`.
///
/// Tokens are compared verbatim, so callers lowercase both sides first.
pub fn similarity(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    intersection as f64 / union as f64
}
