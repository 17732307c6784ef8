// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CPU-bound reference workload: trial-division primality.

use parabench_core::{CallContext, WorkError, WorkUnit};

/// Large numbers that keep each check busy for a noticeable time.
pub const PRIMES: [u64; 6] = [
    112_272_535_095_293,
    112_582_705_942_171,
    112_272_535_095_293,
    115_280_095_190_773,
    115_797_848_077_099,
    1_099_726_899_285_419,
];

/// Full batch size used by `parabench cpu`.
pub const BATCH_LEN: usize = 100;

/// Batch size under `--quick`.
pub const QUICK_BATCH_LEN: usize = 12;

/// The reference batch: [`PRIMES`] repeated to the requested length.
pub fn batch(quick: bool) -> Vec<u64> {
    let len = if quick { QUICK_BATCH_LEN } else { BATCH_LEN };
    PRIMES.iter().copied().cycle().take(len).collect()
}

pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n == 2 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut limit = (n as f64).sqrt() as u64;
    // Float sqrt can land one off for large n
    while limit * limit > n {
        limit -= 1;
    }
    while (limit + 1) * (limit + 1) <= n {
        limit += 1;
    }

    (3..=limit).step_by(2).all(|d| n % d != 0)
}

/// Work unit wrapping [`is_prime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimalityUnit;

impl WorkUnit for PrimalityUnit {
    type Input = u64;
    type Output = bool;

    fn name(&self) -> &str {
        "primes"
    }

    fn call(&self, input: &u64, _ctx: &CallContext) -> Result<bool, WorkError> {
        Ok(is_prime(*input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_numbers() {
        let primes: Vec<u64> = (0..30).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
    }

    #[test]
    fn test_reference_scenario() {
        let unit = PrimalityUnit;
        let ctx = CallContext::default();
        let results: Vec<bool> = [4, 7, 9, 11]
            .iter()
            .map(|n| unit.call(n, &ctx).unwrap())
            .collect();
        assert_eq!(results, vec![false, true, false, true]);
    }

    #[test]
    fn test_perfect_squares_of_primes() {
        assert!(!is_prime(49));
        assert!(!is_prime(10_007 * 10_007));
        assert!(is_prime(10_007));
    }

    #[test]
    fn test_batch_lengths() {
        assert_eq!(batch(false).len(), BATCH_LEN);
        assert_eq!(batch(true).len(), QUICK_BATCH_LEN);
        assert_eq!(batch(true)[6], PRIMES[0]);
    }
}
