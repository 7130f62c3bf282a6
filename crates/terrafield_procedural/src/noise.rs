//! # Gradient Noise Implementation
//!
//! Deterministic, memoized 2D gradient noise in the range [0, 1].
//!
//! ## Algorithm
//!
//! Each integer lattice point owns a pseudo-random unit gradient derived
//! from a hash of `(ix, iy, seed)`. A sample takes the four lattice corners
//! around `(x, y)`, dots each corner's gradient with the offset from that
//! corner, and blends the four values with the cubic Hermite weight
//! `3w² − 2w³`: first along x on both rows, then along y.
//!
//! ## Memoization
//!
//! Terrain is permanent once generated, so both the gradient table and the
//! final samples are cached for the field's lifetime and never invalidated.
//! The caches grow with explored area.
//!
//! ## Determinism Guarantee
//!
//! Given the same `FieldSeed`, this implementation produces exactly the same
//! values on any platform, any time. No global state is involved: each
//! `NoiseField` is an explicit value owned by whoever samples it.

use std::collections::HashMap;
use std::f64::consts::TAU;

use terrafield_shared::Vec2;

/// Seed for one noise field.
///
/// Each terrain property uses its own seed so the fields are independent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldSeed(u64);

impl FieldSeed {
    /// Creates a new field seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., one cell's flora roll).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        Self(mix64(self.0 ^ purpose.wrapping_mul(0x517c_c1b7_2722_0a95)))
    }
}

impl Default for FieldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// 64-bit finalizer (murmur3 `fmix64`).
#[inline]
const fn mix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// Hashes a lattice point together with the field seed.
#[inline]
#[allow(clippy::cast_sign_loss)]
const fn lattice_hash(ix: i64, iy: i64, seed: u64) -> u64 {
    let mut h = seed ^ 0x9e37_79b9_7f4a_7c15;
    h = mix64(h ^ (ix as u64).wrapping_mul(0x517c_c1b7_2722_0a95));
    mix64(h ^ (iy as u64).wrapping_mul(0x6c8e_9cf5_7093_2bd5))
}

/// Cubic Hermite weight `3w² − 2w³`.
#[inline]
#[must_use]
pub fn smootherstep(w: f64) -> f64 {
    w * w * (3.0 - 2.0 * w)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Converts a real coordinate to its lattice cell, saturating at the `i64`
/// range. NaN maps to 0.
#[inline]
#[allow(clippy::cast_possible_truncation)]
fn lattice_floor(v: f64) -> (i64, f64) {
    let floor = v.floor();
    (floor as i64, v - floor)
}

/// Deterministic 2D gradient noise field with memoized gradients and samples.
///
/// # Performance
///
/// - O(1) per sample after the first query at the same point
/// - Gradients are hashed once per lattice point
///
/// # Example
///
/// ```rust
/// use terrafield_procedural::noise::{FieldSeed, NoiseField};
///
/// let mut noise = NoiseField::new(FieldSeed::new(42));
/// let value = noise.sample(100.5, -200.3);
/// assert!((0.0..=1.0).contains(&value));
/// ```
#[derive(Debug, Clone)]
pub struct NoiseField {
    /// Seed mixed into every lattice hash.
    seed: FieldSeed,
    /// Gradient per lattice point.
    gradients: HashMap<(i64, i64), Vec2>,
    /// Final sample per exact query point, keyed by the coordinate bits.
    samples: HashMap<(u64, u64), f64>,
}

impl NoiseField {
    /// Creates a new noise field from a seed.
    #[must_use]
    pub fn new(seed: FieldSeed) -> Self {
        Self {
            seed,
            gradients: HashMap::new(),
            samples: HashMap::new(),
        }
    }

    /// Returns the seed this field was built from.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> FieldSeed {
        self.seed
    }

    /// Returns the unit gradient at lattice point `(ix, iy)`.
    ///
    /// Computed on first use and cached; later lookups return the identical
    /// vector.
    pub fn gradient(&mut self, ix: i64, iy: i64) -> Vec2 {
        let seed = self.seed.value();
        *self.gradients.entry((ix, iy)).or_insert_with(|| {
            let hash = lattice_hash(ix, iy, seed);
            // Top 53 bits give a uniform fraction in [0, 1).
            #[allow(clippy::cast_precision_loss)]
            let unit = (hash >> 11) as f64 / (1u64 << 53) as f64;
            Vec2::from_angle(unit * TAU)
        })
    }

    /// Samples the field at `(x, y)`.
    ///
    /// # Returns
    ///
    /// A value in the range [0, 1]. The function is total: non-finite input
    /// yields 0.5 (a raw value of zero).
    pub fn sample(&mut self, x: f64, y: f64) -> f64 {
        let key = (x.to_bits(), y.to_bits());
        if let Some(&cached) = self.samples.get(&key) {
            return cached;
        }

        let value = self.compute(x, y);
        self.samples.insert(key, value);
        value
    }

    /// Evaluates the noise without touching the sample cache.
    fn compute(&mut self, x: f64, y: f64) -> f64 {
        let (ix, fx) = lattice_floor(x);
        let (iy, fy) = lattice_floor(y);
        let ix1 = ix.wrapping_add(1);
        let iy1 = iy.wrapping_add(1);

        // Dot products of corner gradients with offsets from each corner
        let n00 = self.gradient(ix, iy).dot(Vec2::new(fx, fy));
        let n10 = self.gradient(ix1, iy).dot(Vec2::new(fx - 1.0, fy));
        let n01 = self.gradient(ix, iy1).dot(Vec2::new(fx, fy - 1.0));
        let n11 = self.gradient(ix1, iy1).dot(Vec2::new(fx - 1.0, fy - 1.0));

        let sx = smootherstep(fx);
        let near = lerp(n00, n10, sx);
        let far = lerp(n01, n11, sx);
        let raw = lerp(near, far, smootherstep(fy));

        if raw.is_finite() {
            ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    /// Number of lattice gradients computed so far.
    #[must_use]
    pub fn gradient_cache_len(&self) -> usize {
        self.gradients.len()
    }

    /// Number of distinct points sampled so far.
    #[must_use]
    pub fn sample_cache_len(&self) -> usize {
        self.samples.len()
    }
}
