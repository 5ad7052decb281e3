// Deterministic, portable pseudo-random number generator for the hatchery.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// The generator state is four `u64` words and serializes with serde, so a
// session can carry its RNG through save/load and keep producing the same
// stream it would have produced without the round-trip.
//
// The only consumer today is `hatchery_sim`, which draws from it when an
// unmated egg hatches and a purebred species has to be picked for the
// incubation environment. Keeping randomness behind this one type means
// tests can seed a session and assert exact hatch results.
//
// **Critical constraint: determinism.** Given the same prior state, every
// method here returns the same value on every platform. No OS entropy, no
// system time, no floating point in the sampling paths.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG: the hatchery's sole source of randomness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    s: [u64; 4],
}

impl GameRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// SplitMix64 expands the seed into the 256-bit state, so nearby seeds
    /// still give unrelated streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform integer in `[low, high)`, rejection-sampled to avoid modulo
    /// bias. Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let span = high - low;
        if span.is_power_of_two() {
            return low + (self.next_u64() & (span - 1));
        }
        let threshold = span.wrapping_neg() % span;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % span);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Pick one element uniformly. Returns `None` for an empty slice and
    /// leaves the state untouched in that case.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range_usize(0, items.len());
        items.get(idx)
    }
}

/// SplitMix64 step, used only to expand a seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
