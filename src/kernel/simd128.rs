//! 128-bit SIMD kernel variant: one anchor against four others, computed with
//! 4-wide `f32` lanes via the [`wide`] crate's portable vector types.
//!
//! This plays the role the original implementation gave to raw `__m128`
//! intrinsics and a masked dot-product (design note #2: "should be mapped to
//! the target language's portable SIMD abstraction"). Since the payload lane
//! (weight or form-factor index) is never loaded into the distance
//! computation here — `x`, `y`, `z` are gathered into their own vectors, the
//! fourth field never enters a vector register — there is no lane to mask
//! out, unlike the original's `(Δx, Δy, Δz, 0)` dot product.

use super::{combine_ff_pair, RawFormFactor, RawWeighted};
use crate::point::{FormFactorPoint, WeightedPoint};
use wide::f32x4;

/// Computes the four (distance, weight) pairs between `anchor` and `others`.
#[must_use]
pub fn weighted_raw_x4(anchor: WeightedPoint, others: &[WeightedPoint; 4]) -> [RawWeighted; 4] {
    let ax = f32x4::splat(anchor.x);
    let ay = f32x4::splat(anchor.y);
    let az = f32x4::splat(anchor.z);
    let aw = f32x4::splat(anchor.weight);

    let ox = f32x4::from([others[0].x, others[1].x, others[2].x, others[3].x]);
    let oy = f32x4::from([others[0].y, others[1].y, others[2].y, others[3].y]);
    let oz = f32x4::from([others[0].z, others[1].z, others[2].z, others[3].z]);
    let ow = f32x4::from([
        others[0].weight,
        others[1].weight,
        others[2].weight,
        others[3].weight,
    ]);

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

/// Computes the four (distance, ff_pair) pairs between `anchor` and `others`.
/// The distance is vectorised; the form-factor-pair index is a scalar
/// combination (it indexes a table, it is never itself reduced across
/// lanes).
#[must_use]
pub fn form_factor_raw_x4(
    anchor: FormFactorPoint,
    others: &[FormFactorPoint; 4],
    num_types: i32,
) -> [RawFormFactor; 4] {
    let ax = f32x4::splat(anchor.x);
    let ay = f32x4::splat(anchor.y);
    let az = f32x4::splat(anchor.z);

    let ox = f32x4::from([others[0].x, others[1].x, others[2].x, others[3].x]);
    let oy = f32x4::from([others[0].y, others[1].y, others[2].y, others[3].y]);
    let oz = f32x4::from([others[0].z, others[1].z, others[2].z, others[3].z]);

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
            WeightedPoint::new(1.0, 0.0, 0.0, 2.0),
            WeightedPoint::new(0.0, 2.0, 0.0, 3.0),
            WeightedPoint::new(0.0, 0.0, 3.0, 4.0),
            WeightedPoint::new(1.0, 1.0, 1.0, 5.0),
        ];
        let simd = weighted_raw_x4(anchor, &others);
        for (i, &o) in others.iter().enumerate() {
            let scalar = scalar::weighted_raw(anchor, o);
            assert!((scalar.distance - simd[i].distance).abs() < 1e-6);
            assert!((scalar.weight - simd[i].weight).abs() < 1e-6);
        }
    }
}
