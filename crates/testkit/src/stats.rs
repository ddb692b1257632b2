//! Sampling helpers for probabilistic assertions.

use std::collections::BTreeMap;

/// Count of each distinct value.
pub fn histogram<I: IntoIterator<Item = u32>>(samples: I) -> BTreeMap<u32, usize> {
    let mut counts = BTreeMap::new();
    for sample in samples {
        *counts.entry(sample).or_insert(0) += 1;
    }
    counts
}

/// Fraction of `samples` equal to `high`; 0.0 for no samples.
pub fn high_ratio(samples: &[u32], high: u32) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().filter(|&&sample| sample == high).count() as f64 / samples.len() as f64
}

/// Whether `observed` is within `tolerance` of `expected`.
pub fn within(observed: f64, expected: f64, tolerance: f64) -> bool {
    (observed - expected).abs() <= tolerance
}
