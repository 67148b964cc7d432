//! Scalar kernel variant. The reference implementation: every SIMD variant
//! must agree with this one (see `tests` in [`super`]).

use super::{combine_ff_pair, to_bin, RawFormFactor, RawWeighted, RoundedFormFactor, RoundedWeighted};
use crate::point::{FormFactorPoint, WeightedPoint};

#[inline]
fn distance(ax: f32, ay: f32, az: f32, bx: f32, by: f32, bz: f32) -> f32 {
    let dx = ax - bx;
    let dy = ay - by;
    let dz = az - bz;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// `d = sqrt((Δx)² + (Δy)² + (Δz)²)`, `w = w1 * w2`.
#[must_use]
pub fn weighted_raw(anchor: WeightedPoint, other: WeightedPoint) -> RawWeighted {
    RawWeighted {
        distance: distance(anchor.x, anchor.y, anchor.z, other.x, other.y, other.z),
        weight: anchor.weight * other.weight,
    }
}

/// Rounded counterpart of [`weighted_raw`].
#[must_use]
pub fn weighted_rounded(
    anchor: WeightedPoint,
    other: WeightedPoint,
    inv_bin_width: f32,
) -> RoundedWeighted {
    let raw = weighted_raw(anchor, other);
    RoundedWeighted {
        bin: to_bin(raw.distance, inv_bin_width),
        weight: super::ordered_weight::OrderedF32(raw.weight),
    }
}

/// `d = sqrt((Δx)² + (Δy)² + (Δz)²)`, `ff_pair = ff2 + ff1 * T`.
#[must_use]
pub fn form_factor_raw(
    anchor: FormFactorPoint,
    other: FormFactorPoint,
    num_types: i32,
) -> RawFormFactor {
    RawFormFactor {
        distance: distance(anchor.x, anchor.y, anchor.z, other.x, other.y, other.z),
        ff_pair: combine_ff_pair(anchor.ff_index, other.ff_index, num_types),
    }
}

/// Rounded counterpart of [`form_factor_raw`].
#[must_use]
pub fn form_factor_rounded(
    anchor: FormFactorPoint,
    other: FormFactorPoint,
    num_types: i32,
    inv_bin_width: f32,
) -> RoundedFormFactor {
    let raw = form_factor_raw(anchor, other, num_types);
    RoundedFormFactor {
        bin: to_bin(raw.distance, inv_bin_width),
        ff_pair: raw.ff_pair,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_pair_combines_by_product() {
        let a = WeightedPoint::new(0.0, 0.0, 0.0, 2.0);
        let b = WeightedPoint::new(3.0, 4.0, 0.0, 5.0);
        let r = weighted_raw(a, b);
        assert!((r.distance - 5.0).abs() < 1e-6);
        assert!((r.weight - 10.0).abs() < 1e-6);
    }

    #[test]
    fn form_factor_pair_index() {
        let a = FormFactorPoint::new(0.0, 0.0, 0.0, 1);
        let b = FormFactorPoint::new(1.0, 0.0, 0.0, 2);
        let r = form_factor_raw(a, b, 5);
        assert_eq!(r.ff_pair, 2 + 1 * 5);
    }
}
