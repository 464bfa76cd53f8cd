use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand_xorshift::XorShiftRng;

/// Construct a throwaway random number generator seeded by a noise value.
///
/// Good for short-term use in immutable contexts given a varying source of
/// noise like map position coordinates.
pub fn srng(seed: &(impl Hash + ?Sized)) -> XorShiftRng {
    let mut h = crate::FastHasher::default();
    seed.hash(&mut h);
    XorShiftRng::seed_from_u64(h.finish())
}

pub trait RngExt {
    fn one_chance_in(&mut self, n: usize) -> bool;

    /// Return true with probability `p`, clamped to [0, 1].
    fn chance(&mut self, p: f64) -> bool;

    /// Uniform float in [0, 1).
    fn unit(&mut self) -> f64;

    /// Pick an item with probability proportional to its weight.
    ///
    /// Nonpositive weights are never picked. Returns `None` if nothing has
    /// positive weight.
    fn pick_weighted<'a, T>(&mut self, items: &'a [(T, f64)]) -> Option<&'a T>;
}

impl<R: Rng + ?Sized> RngExt for R {
    fn one_chance_in(&mut self, n: usize) -> bool {
        if n == 0 {
            return false;
        }
        self.gen_range(0..n) == 0
    }

    fn chance(&mut self, p: f64) -> bool {
        self.gen_bool(p.clamp(0.0, 1.0))
    }

    fn unit(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }

    fn pick_weighted<'a, T>(&mut self, items: &'a [(T, f64)]) -> Option<&'a T> {
        let total: f64 = items.iter().map(|(_, w)| w.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut roll = self.gen_range(0.0..total);
        let mut last = None;
        for (item, w) in items {
            if *w <= 0.0 {
                continue;
            }
            if roll < *w {
                return Some(item);
            }
            roll -= w;
            last = Some(item);
        }
        // Float slop at the top of the range.
        last
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn seeded_rng_is_stable() {
        assert_eq!(
            srng(&(1, 2, 3)).gen_range(0..1_000_000),
            srng(&(1, 2, 3)).gen_range(0..1_000_000)
        );
    }

    #[test]
    fn weighted_pick_skips_zero_weights() {
        let mut rng = srng("weights");
        let items = [("never", 0.0), ("always", 2.0), ("nope", -1.0)];
        for _ in 0..100 {
            assert_eq!(rng.pick_weighted(&items), Some(&"always"));
        }
        let empty: [(u8, f64); 1] = [(0, 0.0)];
        assert_eq!(rng.pick_weighted(&empty), None);
    }

    #[test]
    fn chance_extremes() {
        let mut rng = srng("chance");
        assert!((0..100).all(|_| rng.chance(1.5)));
        assert!((0..100).all(|_| !rng.chance(0.0)));
    }
}
