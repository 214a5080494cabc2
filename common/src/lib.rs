pub extern crate rand;
pub extern crate rand_pcg;

use rand::prelude::*;
use rand_pcg::Pcg32;

const TILE_RNG_STREAM: u64 = 382173857842u64;

pub fn build_rng(seed: (u64, u64)) -> Pcg32 {
  let mut bytes = [0u8; 16];
  bytes[..8].copy_from_slice(&seed.0.to_le_bytes());
  bytes[8..].copy_from_slice(&seed.1.to_le_bytes());
  Pcg32::from_seed(bytes)
}

/// SplitMix64 finalizer.  Spreads neighboring grid coordinates across the whole state space.
#[inline]
fn mix64(mut x: u64) -> u64 {
  x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
  x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
  x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
  x ^ (x >> 31)
}

/// Builds an RNG whose output depends only on the provided grid coordinates.
///
/// No shared state is involved; the same `(ix, iy)` always yields the same sequence.
pub fn tile_rng(ix: i32, iy: i32) -> Pcg32 {
  let packed = ((ix as u32 as u64) << 32) | (iy as u32 as u64);
  let mut rng = build_rng((mix64(packed), TILE_RNG_STREAM));
  // pump the rng a few times to avoid possible issues with seeding
  for _ in 0..4 {
    let _ = rng.gen::<u32>();
  }
  rng
}

/// Returns a random f32 in the range [-1, 1).
#[inline(always)]
pub fn random_signed(rng: &mut Pcg32) -> f32 {
  rng.gen::<f32>() * 2. - 1.
}

pub fn clamp(val: f32, min: f32, max: f32) -> f32 {
  if val < min {
    return min;
  }
  if val > max {
    return max;
  }
  val
}

#[inline(always)]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
  a + (b - a) * t
}

#[inline(always)]
pub fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
  (a - b).abs() <= epsilon
}
