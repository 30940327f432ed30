//! Random number generation for the toy event source, on top of the
//! abstractions of the standard "rand" crate.

use crate::numeric::{reals::consts::PI, Float};
use rand::{Rng, SeedableRng};

// Select random number generation engine in use
#[cfg(feature = "f32")]
type Engine = rand_xoshiro::Xoshiro128Plus;
#[cfg(not(feature = "f32"))]
type Engine = rand_xoshiro::Xoshiro256Plus;

/// Facade over the rand crate exposing the distributions we need
#[derive(Clone)]
pub struct RandomGenerator {
    rng: Engine,
}
//
impl RandomGenerator {
    /// Spawn a new random number generator
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Engine::seed_from_u64(seed),
        }
    }

    /// Generate a random floating-point number in [0, 1)
    pub fn random(&mut self) -> Float {
        self.rng.gen()
    }

    /// Uniformly distributed number in [low, high)
    pub fn uniform(&mut self, low: Float, high: Float) -> Float {
        low + (high - low) * self.random()
    }

    /// Normally distributed number (Box-Muller transform)
    pub fn normal(&mut self, mean: Float, sigma: Float) -> Float {
        // 1 - random() lies in (0, 1], which keeps the logarithm finite
        let u1 = 1. - self.random();
        let u2 = self.random();
        mean + sigma * (-2. * u1.ln()).sqrt() * (2. * PI * u2).cos()
    }

    /// Exponentially distributed number
    pub fn exponential(&mut self, mean: Float) -> Float {
        -mean * (1. - self.random()).ln()
    }

    /// Integer in [0, n)
    pub fn below(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Truth with probability p
    pub fn chance(&mut self, p: Float) -> bool {
        self.random() < p
    }

    /// Advance state as if a very large number of values had been drawn,
    /// giving a stream which does not overlap with the current one
    pub fn jump(&mut self) {
        self.rng.jump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_is_reproducible() {
        let mut rng1 = RandomGenerator::new(42);
        let mut rng2 = RandomGenerator::new(42);
        for _ in 0..10 {
            assert_eq!(rng1.random(), rng2.random());
        }
    }

    #[test]
    fn jumps_decorrelate_streams() {
        let mut rng = RandomGenerator::new(42);
        let mut jumped = rng.clone();
        jumped.jump();
        let head = (0..4).map(|_| rng.random()).collect::<Vec<_>>();
        let jumped_head = (0..4).map(|_| jumped.random()).collect::<Vec<_>>();
        assert_ne!(head, jumped_head);
    }

    #[test]
    fn distributions_stay_in_range() {
        let mut rng = RandomGenerator::new(7);
        for _ in 0..1000 {
            let u = rng.uniform(-0.9, 0.9);
            assert!((-0.9..0.9).contains(&u));
            assert!(rng.exponential(0.5) >= 0.);
            assert!(rng.normal(0., 10.).is_finite());
            assert!(rng.below(6) < 6);
        }
    }

    #[test]
    fn normal_moments() {
        let mut rng = RandomGenerator::new(1234);
        let n = 20_000;
        let samples = (0..n).map(|_| rng.normal(1., 2.)).collect::<Vec<_>>();
        let mean = samples.iter().sum::<Float>() / n as Float;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<Float>() / n as Float;
        assert!((mean - 1.).abs() < 0.1);
        assert!((var.sqrt() - 2.).abs() < 0.1);
    }
}
