/// Deterministic SplitMix64 generator backing the `random`/`randint` expression functions.
#[derive(Clone, Debug)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from an expression value; fractional seeds are distinct streams.
    pub fn from_f64_seed(seed: f64) -> Self {
        Self::new(seed.to_bits() ^ 0x5DEE_CE66_D1CE_4E5B)
    }

    pub fn next_u64(&mut self) -> u64 {
        // SplitMix64
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub fn next_f64_01(&mut self) -> f64 {
        // 53 bits of precision.
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform value in `[min, max)`.
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64_01() * (max - min)
    }

    /// Uniform integer in `[min, max]` (inclusive); bounds may be given in any order.
    pub fn next_int_inclusive(&mut self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        // The full i64 range spans 2^64 values, so widen before adding one.
        let span = (i128::from(hi) - i128::from(lo)) as u128 + 1;
        let offset = u128::from(self.next_u64()) % span;
        (i128::from(lo) + offset as i128) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Rng64::new(42);
        let mut b = Rng64::new(42);
        for _ in 0..8 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn unit_interval_and_inclusive_ints() {
        let mut r = Rng64::from_f64_seed(3.0);
        for _ in 0..256 {
            let v = r.next_f64_01();
            assert!((0.0..1.0).contains(&v));
            let i = r.next_int_inclusive(5, 1);
            assert!((1..=5).contains(&i));
        }
    }

    #[test]
    fn inclusive_ints_cover_the_full_range() {
        let mut r = Rng64::new(7);
        for _ in 0..64 {
            r.next_int_inclusive(i64::MIN, i64::MAX);
            let near_top = r.next_int_inclusive(i64::MAX - 1, i64::MAX);
            assert!(near_top >= i64::MAX - 1);
            let near_bottom = r.next_int_inclusive(i64::MIN, i64::MIN + 1);
            assert!(near_bottom <= i64::MIN + 1);
        }
        assert_eq!(r.next_int_inclusive(3, 3), 3);
    }
}
