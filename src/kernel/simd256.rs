//! 256-bit SIMD kernel variant: one anchor against eight others, computed
//! with 8-wide `f32` lanes via the [`wide`] crate.
//!
//! The original packed one anchor broadcast over both 128-bit halves of a
//! 256-bit register against eight other points taken two at a time; `wide`'s
//! `f32x8` expresses the same "eight distances per outer iteration" shape
//! directly without the two-at-a-time bookkeeping.

use super::{combine_ff_pair, RawFormFactor, RawWeighted};
use crate::point::{FormFactorPoint, WeightedPoint};
use wide::f32x8;

/// Computes the eight (distance, weight) pairs between `anchor` and `others`.
#[must_use]
pub fn weighted_raw_x8(anchor: WeightedPoint, others: &[WeightedPoint; 8]) -> [RawWeighted; 8] {
    let ax = f32x8::splat(anchor.x);
    let ay = f32x8::splat(anchor.y);
    let az = f32x8::splat(anchor.z);
    let aw = f32x8::splat(anchor.weight);

    let ox = f32x8::from(std::array::from_fn::<f32, 8, _>(|i| others[i].x));
    let oy = f32x8::from(std::array::from_fn::<f32, 8, _>(|i| others[i].y));
    let oz = f32x8::from(std::array::from_fn::<f32, 8, _>(|i| others[i].z));
    let ow = f32x8::from(std::array::from_fn::<f32, 8, _>(|i| others[i].weight));

    let dx = ax - ox;
    let dy = ay - oy;
    let dz = az - oz;
    let dist2 = dx * dx + dy * dy + dz * dz;
    let dist = dist2.sqrt();
    let weight = aw * ow;

    let d = dist.to_array();
    let w = weight.to_array();
    std::array::from_fn(|i| RawWeighted {
        distance: d[i],
        weight: w[i],
    })
}

/// Computes the eight (distance, ff_pair) pairs between `anchor` and
/// `others`.
#[must_use]
pub fn form_factor_raw_x8(
    anchor: FormFactorPoint,
    others: &[FormFactorPoint; 8],
    num_types: i32,
) -> [RawFormFactor; 8] {
    let ax = f32x8::splat(anchor.x);
    let ay = f32x8::splat(anchor.y);
    let az = f32x8::splat(anchor.z);

    let ox = f32x8::from(std::array::from_fn::<f32, 8, _>(|i| others[i].x));
    let oy = f32x8::from(std::array::from_fn::<f32, 8, _>(|i| others[i].y));
    let oz = f32x8::from(std::array::from_fn::<f32, 8, _>(|i| others[i].z));

    let dx = ax - ox;
    let dy = ay - oy;
    let dz = az - oz;
    let dist2 = dx * dx + dy * dy + dz * dz;
    let dist = dist2.sqrt();
    let d = dist.to_array();

    std::array::from_fn(|i| RawFormFactor {
        distance: d[i],
        ff_pair: combine_ff_pair(anchor.ff_index, others[i].ff_index, num_types),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::scalar;

    #[test]
    fn matches_scalar_for_axis_aligned_points() {
        let anchor = WeightedPoint::new(0.0, 0.0, 0.0, 1.0);
        let others = [
            WeightedPoint::new(1.0, 0.0, 0.0, 1.0),
            WeightedPoint::new(0.0, 2.0, 0.0, 1.0),
            WeightedPoint::new(0.0, 0.0, 3.0, 1.0),
            WeightedPoint::new(1.0, 1.0, 1.0, 1.0),
            WeightedPoint::new(-1.0, 0.0, 0.0, 2.0),
            WeightedPoint::new(0.0, -2.0, 0.0, 2.0),
            WeightedPoint::new(0.0, 0.0, -3.0, 2.0),
            WeightedPoint::new(-1.0, -1.0, -1.0, 2.0),
        ];
        let simd = weighted_raw_x8(anchor, &others);
        for (i, &o) in others.iter().enumerate() {
            let scalar = scalar::weighted_raw(anchor, o);
            assert!((scalar.distance - simd[i].distance).abs() < 1e-6);
            assert!((scalar.weight - simd[i].weight).abs() < 1e-6);
        }
    }

    #[test]
    fn ff_pair_distance_matches_scalar() {
        let anchor = FormFactorPoint::new(0.0, 0.0, 0.0, 0);
        let others: [FormFactorPoint; 8] = std::array::from_fn(|i| {
            FormFactorPoint::new(i as f32, 0.0, 0.0, (i % 3) as i32)
        });
        let simd = form_factor_raw_x8(anchor, &others, 3);
        for (i, &o) in others.iter().enumerate() {
            let scalar = scalar::form_factor_raw(anchor, o, 3);
            assert!((scalar.distance - simd[i].distance).abs() < 1e-6);
            assert_eq!(scalar.ff_pair, simd[i].ff_pair);
        }
    }
}
