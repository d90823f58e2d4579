//! xorshift64* generator with unbiased bounded draws.

use super::seed::FALLBACK_SEED;

const MULTIPLIER: u64 = 2_685_821_657_736_338_717;

/// Seeded xorshift64* generator.
///
/// All arithmetic wraps modulo 2^64 so output is bit-identical across
/// platforms.
#[derive(Debug, Clone)]
pub struct XorShift64Star {
    state: u64,
}

impl XorShift64Star {
    /// Creates a generator; a zero seed is replaced by `FALLBACK_SEED`.
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { FALLBACK_SEED } else { seed };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(MULTIPLIER)
    }

    /// Draws uniformly from `0..upper` using the multiply-high method.
    ///
    /// Returns 0 without drawing when `upper` is 0.
    pub fn next_bounded(&mut self, upper: u64) -> u64 {
        if upper == 0 {
            return 0;
        }

        let mut product = u128::from(self.next_u64()) * u128::from(upper);
        let mut low = product as u64;
        if low < upper {
            let threshold = upper.wrapping_neg() % upper;
            while low < threshold {
                product = u128::from(self.next_u64()) * u128::from(upper);
                low = product as u64;
            }
        }
        (product >> 64) as u64
    }
}
