//! Seeded random streams
//!
//! Every random decision in the fixture engine draws from a [`RandomStream`] keyed by
//! a descriptive string (for example `"2024-01-15-rest"`). Equal seed strings always
//! produce the same infinite sequence, independent of call site or process.

/// Hash a seed string to 32 bits with the classic `hash * 31 + code_unit` polynomial.
///
/// Code units are UTF-16, so non-ASCII seeds hash the same way a JavaScript or Java
/// host would.
pub fn hash_seed(seed: &str) -> u32 {
    seed.encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// Deterministic float source (mulberry32 mixing)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomStream {
    state: u32,
}

impl RandomStream {
    /// Create a stream keyed by a seed string
    pub fn new(seed: &str) -> Self {
        Self::from_hash(hash_seed(seed))
    }

    /// Create a stream from an already hashed seed
    pub fn from_hash(state: u32) -> Self {
        Self { state }
    }

    /// Next value in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        f64::from(t ^ (t >> 14)) / 4_294_967_296.0
    }

    /// Uniform value in `[min, max)`
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Uniform integer in `[min, max]`
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        min + (self.next_f64() * span).floor() as i64
    }

    /// Uniform index in `[0, len)`; 0 for an empty range
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f64() * len as f64).floor() as usize).min(len - 1)
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Symmetric noise in `[-amplitude, amplitude)`
    pub fn jitter(&mut self, amplitude: f64) -> f64 {
        (self.next_f64() * 2.0 - 1.0) * amplitude
    }

    /// Uniformly pick one element
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.index(items.len()))
    }
}
