//! Random number generation and synthetic Normal data.
//!
//! The generator never touches a hidden global: callers pass the RNG in,
//! so tests seed it with [`create_rng`] and front ends use
//! [`entropy_rng`].
//!
//! # Reproducibility
//!
//! `SmallRng` is deterministic for a given seed on the same platform.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::{ensure_finite, Result, StatError};
use crate::sample::Sample;

/// Largest sample [`generate`] will produce.
pub const MAX_SAMPLE_SIZE: usize = 5000;

/// Creates a fast, seeded random number generator.
///
/// # Examples
/// ```
/// use u_statcalc::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!((0.0..1.0).contains(&x));
/// ```
pub fn create_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Creates a generator seeded from operating-system entropy.
pub fn entropy_rng() -> SmallRng {
    SmallRng::from_os_rng()
}

/// Draws `size` i.i.d. values from Normal(`mean`, `std_dev`).
///
/// `std_dev == 0` is legal and yields a constant sample.
///
/// # Errors
/// [`StatError::InvalidInput`] if `mean` or `std_dev` is not finite,
/// `std_dev < 0`, or `size` is outside `1..=MAX_SAMPLE_SIZE`.
///
/// # Examples
/// ```
/// use u_statcalc::random::{create_rng, generate};
/// let mut rng = create_rng(7);
/// let sample = generate(10.0, 2.0, 100, &mut rng).unwrap();
/// assert_eq!(sample.len(), 100);
/// ```
pub fn generate<R: Rng + ?Sized>(
    mean: f64,
    std_dev: f64,
    size: usize,
    rng: &mut R,
) -> Result<Sample> {
    ensure_finite("mean", mean)?;
    ensure_finite("standard deviation", std_dev)?;
    if std_dev < 0.0 {
        return Err(StatError::invalid(format!(
            "standard deviation must be non-negative, got {std_dev}"
        )));
    }
    if !(1..=MAX_SAMPLE_SIZE).contains(&size) {
        return Err(StatError::invalid(format!(
            "size must be between 1 and {MAX_SAMPLE_SIZE}, got {size}"
        )));
    }

    let normal = Normal::new(mean, std_dev).map_err(|e| StatError::invalid(e.to_string()))?;
    let values: Vec<f64> = (0..size).map(|_| normal.sample(rng)).collect();
    tracing::debug!(mean, std_dev, size, "generated normal sample");
    Sample::new(values)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_create_rng_deterministic() {
        let a = generate(0.0, 1.0, 50, &mut create_rng(42)).unwrap();
        let b = generate(0.0, 1.0, 50, &mut create_rng(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(0.0, 1.0, 20, &mut create_rng(1)).unwrap();
        let b = generate(0.0, 1.0, 20, &mut create_rng(2)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_std_dev_is_constant() {
        let s = generate(3.5, 0.0, 25, &mut create_rng(0)).unwrap();
        assert!(s.values().iter().all(|&v| v == 3.5));
    }

    #[test]
    fn test_size_bounds() {
        let mut rng = create_rng(0);
        assert_eq!(generate(0.0, 1.0, 1, &mut rng).unwrap().len(), 1);
        assert_eq!(
            generate(0.0, 1.0, MAX_SAMPLE_SIZE, &mut rng).unwrap().len(),
            MAX_SAMPLE_SIZE
        );
        for size in [0, MAX_SAMPLE_SIZE + 1] {
            let err = generate(0.0, 1.0, size, &mut rng).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let mut rng = create_rng(0);
        assert!(generate(0.0, -1.0, 10, &mut rng).is_err());
        assert!(generate(f64::NAN, 1.0, 10, &mut rng).is_err());
        assert!(generate(0.0, f64::INFINITY, 10, &mut rng).is_err());
    }

    #[test]
    fn test_large_sample_moments() {
        let s = generate(50.0, 10.0, MAX_SAMPLE_SIZE, &mut create_rng(2024)).unwrap();
        // SE of the mean is 10/√5000 ≈ 0.14; allow ~5 SE
        assert!((s.mean() - 50.0).abs() < 0.75, "mean = {}", s.mean());
        let sd = s.sample_std_dev().unwrap();
        assert!((sd - 10.0).abs() < 0.6, "sd = {sd}");
    }

    #[test]
    fn test_accepts_unsized_rng() {
        let mut rng = create_rng(9);
        let dyn_rng: &mut dyn rand::RngCore = &mut rng;
        assert_eq!(generate(0.0, 1.0, 5, dyn_rng).unwrap().len(), 5);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn returns_exactly_size_finite_values(
            seed in 0_u64..10_000,
            mean in -1e3_f64..1e3,
            std_dev in 0.0_f64..100.0,
            size in 1_usize..=500,
        ) {
            let s = generate(mean, std_dev, size, &mut create_rng(seed)).unwrap();
            prop_assert_eq!(s.len(), size);
            prop_assert!(s.values().iter().all(|v| v.is_finite()));
        }

        #[test]
        fn mean_converges(seed in 0_u64..1_000, mean in -100.0_f64..100.0, std_dev in 0.1_f64..20.0) {
            let s = generate(mean, std_dev, MAX_SAMPLE_SIZE, &mut create_rng(seed)).unwrap();
            // 6 standard errors
            let tol = 6.0 * std_dev / (MAX_SAMPLE_SIZE as f64).sqrt();
            prop_assert!((s.mean() - mean).abs() < tol, "mean {} vs {}", s.mean(), mean);
            let sd = s.sample_std_dev().unwrap();
            prop_assert!((sd - std_dev).abs() < 0.1 * std_dev, "sd {} vs {}", sd, std_dev);
        }
    }
}
