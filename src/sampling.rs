//! Injectable random source for auxiliary-frame selection.

use rand::rngs::ThreadRng;
use rand::Rng;

/// Picks an integer uniformly from an inclusive range.
pub trait FrameSampler {
    fn pick(&mut self, lo: i64, hi: i64) -> i64;
}

/// Thread-local RNG used outside of tests.
pub struct ThreadRngSampler {
    rng: ThreadRng,
}

impl ThreadRngSampler {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for ThreadRngSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSampler for ThreadRngSampler {
    fn pick(&mut self, lo: i64, hi: i64) -> i64 {
        self.rng.gen_range(lo..=hi)
    }
}

/// Replays a preset sequence of picks, clamped into each requested range.
/// Lets tests make auxiliary-frame selection deterministic.
pub struct FixedSampler {
    picks: Vec<i64>,
    next: usize,
}

impl FixedSampler {
    pub fn new(picks: Vec<i64>) -> Self {
        Self { picks, next: 0 }
    }
}

impl FrameSampler for FixedSampler {
    fn pick(&mut self, lo: i64, hi: i64) -> i64 {
        let value = self.picks.get(self.next).copied().unwrap_or(lo);
        self.next += 1;
        value.clamp(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::{FixedSampler, FrameSampler, ThreadRngSampler};

    #[test]
    fn fixed_sampler_replays_and_clamps() {
        let mut sampler = FixedSampler::new(vec![7, -3, 100]);
        assert_eq!(sampler.pick(0, 10), 7);
        assert_eq!(sampler.pick(0, 10), 0);
        assert_eq!(sampler.pick(0, 10), 10);
        // Exhausted sequences fall back to the range start.
        assert_eq!(sampler.pick(2, 10), 2);
    }

    #[test]
    fn thread_rng_sampler_stays_in_range() {
        let mut sampler = ThreadRngSampler::new();
        for _ in 0..100 {
            let value = sampler.pick(-5, 5);
            assert!((-5..=5).contains(&value));
        }
    }
}
