use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors from uniform or weighted selection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// There was nothing to choose from.
    #[error("cannot choose from an empty list")]
    EmptyChoice,
    /// Every item has weight zero.
    #[error("all {0} candidates have zero weight")]
    ZeroTotalWeight(usize),
}

/// Deterministic random source for every choice the solver makes.
///
/// The same seed and the same call sequence always give the same outputs,
/// which is what makes runs replayable and golden-output tests possible.
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: u64,
    rng: StdRng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed derived from the wall clock, for runs without a fixed seed.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn time_seed() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos() as u64)
    }

    /// The seed this generator was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewinds to the start of the sequence for the original seed.
    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform integer in `min..=max`. Reversed bounds are swapped.
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        self.rng.gen_range(low..=high)
    }

    /// Uniform index in `0..len`, or `None` when `len` is zero.
    pub fn next_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.gen_range(0..len))
    }

    /// Picks one element uniformly.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::EmptyChoice` if `items` is empty.
    pub fn pick_one<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, SelectionError> {
        let index = self
            .next_index(items.len())
            .ok_or(SelectionError::EmptyChoice)?;
        Ok(&items[index])
    }

    /// Picks one element with probability proportional to its weight.
    ///
    /// The distribution is exactly that of expanding each item into `weight`
    /// copies and drawing one uniformly, computed with a cumulative table and
    /// a binary search. Zero-weight items are never selected.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::EmptyChoice` if `items` is empty and
    /// `SelectionError::ZeroTotalWeight` if every weight is zero.
    pub fn pick_weighted<'a, T, F>(
        &mut self,
        items: &'a [T],
        weight_of: F,
    ) -> Result<&'a T, SelectionError>
    where
        F: Fn(&T) -> u32,
    {
        if items.is_empty() {
            return Err(SelectionError::EmptyChoice);
        }
        let mut total = 0u64;
        let cumulative: Vec<u64> = items
            .iter()
            .map(|item| {
                total += u64::from(weight_of(item));
                total
            })
            .collect();
        if total == 0 {
            return Err(SelectionError::ZeroTotalWeight(items.len()));
        }
        let draw = self.rng.gen_range(0..total);
        let index = cumulative.partition_point(|&bound| bound <= draw);
        Ok(&items[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SeededRng::new(7);
        let mut b = SeededRng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_float().to_bits(), b.next_float().to_bits());
            assert_eq!(a.next_int(-5, 5), b.next_int(-5, 5));
        }
        let mut c = SeededRng::new(8);
        let differs = (0..16).any(|_| a.next_float().to_bits() != c.next_float().to_bits());
        assert!(differs);
    }

    #[test]
    fn reseed_restarts_sequence() {
        let mut rng = SeededRng::new(99);
        let first: Vec<i64> = (0..10).map(|_| rng.next_int(0, 1000)).collect();
        rng.reseed();
        let second: Vec<i64> = (0..10).map(|_| rng.next_int(0, 1000)).collect();
        assert_eq!(first, second);
        assert_eq!(rng.seed(), 99);
    }

    #[test]
    fn float_and_int_ranges() {
        let mut rng = SeededRng::new(1);
        for _ in 0..1_000 {
            let f = rng.next_float();
            assert!((0.0..1.0).contains(&f));
            let i = rng.next_int(3, 6);
            assert!((3..=6).contains(&i));
            assert_eq!(rng.next_int(4, 4), 4);
            let swapped = rng.next_int(10, 2);
            assert!((2..=10).contains(&swapped));
        }
    }

    #[test]
    fn pick_one_handles_empty() {
        let mut rng = SeededRng::new(3);
        let empty: [u8; 0] = [];
        assert_eq!(rng.pick_one(&empty), Err(SelectionError::EmptyChoice));
        assert_eq!(rng.pick_one(&[42]), Ok(&42));
    }

    #[test]
    fn weighted_distribution_is_one_to_three() {
        let mut rng = SeededRng::new(42);
        let items = [("light", 1u32), ("heavy", 3u32)];
        let draws = 40_000;
        let heavy = (0..draws)
            .filter(|_| rng.pick_weighted(&items, |item| item.1).unwrap().0 == "heavy")
            .count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = heavy as f64 / f64::from(draws);
        assert!((ratio - 0.75).abs() < 0.015, "heavy ratio was {ratio}");
    }

    #[test]
    fn zero_weight_never_selected() {
        let mut rng = SeededRng::new(5);
        let items = [(0, 0u32), (1, 2u32), (2, 0u32), (3, 1u32)];
        for _ in 0..5_000 {
            let picked = rng.pick_weighted(&items, |item| item.1).unwrap();
            assert!(picked.0 == 1 || picked.0 == 3);
        }
    }

    #[test]
    fn all_zero_weights_is_an_error() {
        let mut rng = SeededRng::new(5);
        let only = [7u32];
        assert_eq!(
            rng.pick_weighted(&only, |_| 0),
            Err(SelectionError::ZeroTotalWeight(1))
        );
        let none: [u32; 0] = [];
        assert_eq!(
            rng.pick_weighted(&none, |_| 1),
            Err(SelectionError::EmptyChoice)
        );
    }
}
