//! Seedable random selection.
//!
//! Every "pick N of M" reduction, trending flag and random theme choice goes
//! through a [`Sampler`] so tests can pin the sequence with a seed.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

pub struct Sampler {
    rng: Mutex<StdRng>,
}

impl Sampler {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        // A poisoned RNG is still a valid RNG
        let mut guard = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Shuffle `items` and keep the first `n`.
    pub fn sample<T>(&self, mut items: Vec<T>, n: usize) -> Vec<T> {
        self.shuffle(&mut items);
        items.truncate(n);
        items
    }

    pub fn shuffle<T>(&self, items: &mut [T]) {
        self.with_rng(|rng| items.shuffle(rng));
    }

    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        self.with_rng(|rng| items.choose(rng))
    }

    /// True with probability `p` (clamped to `0.0..=1.0`).
    pub fn chance(&self, p: f64) -> bool {
        let p = p.clamp(0.0, 1.0);
        self.with_rng(|rng| rng.gen_bool(p))
    }

    /// Uniform integer in `0..n`; `0` when `n == 0`.
    pub fn below(&self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.with_rng(|rng| rng.gen_range(0..n))
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_truncates_to_n() {
        let sampler = Sampler::seeded(7);
        let picked = sampler.sample((0..10).collect::<Vec<_>>(), 3);
        assert_eq!(picked.len(), 3);

        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 3);
        assert!(picked.iter().all(|n| (0..10).contains(n)));
    }

    #[test]
    fn test_sample_larger_than_input_keeps_all() {
        let sampler = Sampler::seeded(7);
        let mut picked = sampler.sample(vec![1, 2, 3], 10);
        picked.sort_unstable();
        assert_eq!(picked, vec![1, 2, 3]);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = Sampler::seeded(42);
        let b = Sampler::seeded(42);
        let items: Vec<u32> = (0..50).collect();
        assert_eq!(a.sample(items.clone(), 10), b.sample(items, 10));
        assert_eq!(a.below(1000), b.below(1000));
    }

    #[test]
    fn test_chance_extremes() {
        let sampler = Sampler::seeded(1);
        assert!((0..100).all(|_| sampler.chance(1.0)));
        assert!((0..100).all(|_| !sampler.chance(0.0)));
        // Out-of-range probabilities are clamped rather than panicking
        assert!(sampler.chance(3.5));
        assert!(!sampler.chance(-1.0));
    }

    #[test]
    fn test_choose_and_below_edges() {
        let sampler = Sampler::seeded(3);
        let empty: [u8; 0] = [];
        assert!(sampler.choose(&empty).is_none());
        assert_eq!(sampler.choose(&[9]), Some(&9));
        assert_eq!(sampler.below(0), 0);
        assert!(sampler.below(5) < 5);
    }
}
