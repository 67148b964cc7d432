//! The pairwise kernel: distance + combined-weight (or combined-type)
//! computation for one anchor against 1, 4 or 8 other points.
//!
//! Three variants exist — [`scalar`], [`simd128`] and [`simd256`] — and all
//! three are required to agree (see `tests` below and
//! `tests/end_to_end.rs`): this is what design note #2 calls "the scalar
//! fallback must exist and must be exercised by tests even on SIMD-capable
//! hosts". The kernel never writes into a histogram; [`crate::manager`] is
//! the only caller and owns accumulation.
//!
//! Rounding is centralised in [`to_bin`] rather than duplicated per variant:
//! every kernel variant first produces a raw `f32` distance (via scalar math
//! or via [`wide`] vector math), and only [`to_bin`] turns that into a bin
//! index. This sidesteps the "round() vs cvtps_epi32" divergence the
//! original implementation had between its scalar and SIMD paths (see
//! `spec.md`'s open question on rounding) by construction: there is only one
//! rounding call site.

pub mod scalar;
pub mod simd128;
pub mod simd256;

use crate::point::{FormFactorPoint, WeightedPoint};
use arrayvec::ArrayVec;

/// Maximum number of points processed by a single kernel batch call.
pub const BATCH: usize = 8;

/// Raw (unrounded) result of a weighted pairwise evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawWeighted {
    /// Euclidean distance between the two points, in Å.
    pub distance: f32,
    /// Product of the two points' weights.
    pub weight: f32,
}

/// Rounded result of a weighted pairwise evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundedWeighted {
    /// Distance bin index.
    pub bin: u32,
    /// Product of the two points' weights, as a bit-pattern-stable `f32`
    /// (kept as `f32`, not rounded further).
    pub weight: ordered_weight::OrderedF32,
}

/// Raw (unrounded) result of a form-factor-pair pairwise evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawFormFactor {
    /// Euclidean distance between the two points, in Å.
    pub distance: f32,
    /// Combined form-factor-pair index, see [`combine_ff_pair`].
    pub ff_pair: i32,
}

/// Rounded result of a form-factor-pair pairwise evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundedFormFactor {
    /// Distance bin index.
    pub bin: u32,
    /// Combined form-factor-pair index, see [`combine_ff_pair`].
    pub ff_pair: i32,
}

/// Converts a raw floating-point distance into a bin index using round-to-
/// nearest with ties resolved to even (banker's rounding), per spec.md's
/// rounding rule. This is the single authoritative rounding rule referenced
/// throughout this module: every kernel variant funnels its raw distance
/// through this function, so the "kernel equivalence" property (spec.md §8)
/// holds trivially for the bin, and holds to within 1 ULP for the raw
/// distance itself.
#[inline]
#[must_use]
pub fn to_bin(distance: f32, inv_bin_width: f32) -> u32 {
    let scaled = distance * inv_bin_width;
    let floor = scaled.floor();
    let frac = scaled - floor;
    let rounded = match frac.partial_cmp(&0.5) {
        Some(std::cmp::Ordering::Less) => floor,
        Some(std::cmp::Ordering::Greater) => floor + 1.0,
        _ => {
            // Exact tie: resolve to the even neighbour.
            if (floor as i64) % 2 == 0 {
                floor
            } else {
                floor + 1.0
            }
        }
    };
    rounded as u32
}

/// Combines two form-factor type indices into the flat pair index used to
/// look up [`crate::formfactor::FormFactorTable`] and to index
/// [`crate::histogram::PartitionedHistogram::aa`]: `ff_pair = j + i * T`.
#[inline]
#[must_use]
pub const fn combine_ff_pair(i: i32, j: i32, num_types: i32) -> i32 {
    j + i * num_types
}

/// Computes the raw (distance, weight) pairs between `anchor` and `others`
/// (`others.len() <= `[`BATCH`]``), dispatching to the SIMD variant that
/// exactly matches the batch length and falling back to the scalar kernel
/// otherwise.
#[must_use]
pub fn weighted_raw_batch(
    anchor: WeightedPoint,
    others: &[WeightedPoint],
) -> ArrayVec<RawWeighted, BATCH> {
    let mut out = ArrayVec::new();
    match others {
        [a, b, c, d, e, f, g, h] => {
            out.extend(simd256::weighted_raw_x8(anchor, &[*a, *b, *c, *d, *e, *f, *g, *h]));
        }
        [a, b, c, d] => {
            out.extend(simd128::weighted_raw_x4(anchor, &[*a, *b, *c, *d]));
        }
        rest => out.extend(rest.iter().map(|&o| scalar::weighted_raw(anchor, o))),
    }
    out
}

/// Rounded counterpart of [`weighted_raw_batch`].
#[must_use]
pub fn weighted_rounded_batch(
    anchor: WeightedPoint,
    others: &[WeightedPoint],
    inv_bin_width: f32,
) -> ArrayVec<RoundedWeighted, BATCH> {
    weighted_raw_batch(anchor, others)
        .into_iter()
        .map(|r| RoundedWeighted {
            bin: to_bin(r.distance, inv_bin_width),
            weight: ordered_weight::OrderedF32(r.weight),
        })
        .collect()
}

/// Computes the raw (distance, ff_pair) pairs between `anchor` and `others`
/// (`others.len() <= `[`BATCH`]`), dispatching like [`weighted_raw_batch`].
#[must_use]
pub fn form_factor_raw_batch(
    anchor: FormFactorPoint,
    others: &[FormFactorPoint],
    num_types: i32,
) -> ArrayVec<RawFormFactor, BATCH> {
    let mut out = ArrayVec::new();
    match others {
        [a, b, c, d, e, f, g, h] => {
            out.extend(simd256::form_factor_raw_x8(
                anchor,
                &[*a, *b, *c, *d, *e, *f, *g, *h],
                num_types,
            ));
        }
        [a, b, c, d] => {
            out.extend(simd128::form_factor_raw_x4(anchor, &[*a, *b, *c, *d], num_types));
        }
        rest => out.extend(rest.iter().map(|&o| scalar::form_factor_raw(anchor, o, num_types))),
    }
    out
}

/// Rounded counterpart of [`form_factor_raw_batch`].
#[must_use]
pub fn form_factor_rounded_batch(
    anchor: FormFactorPoint,
    others: &[FormFactorPoint],
    num_types: i32,
    inv_bin_width: f32,
) -> ArrayVec<RoundedFormFactor, BATCH> {
    form_factor_raw_batch(anchor, others, num_types)
        .into_iter()
        .map(|r| RoundedFormFactor {
            bin: to_bin(r.distance, inv_bin_width),
            ff_pair: r.ff_pair,
        })
        .collect()
}

/// A thin `f32` wrapper that is `Eq`/`Ord` for weights that are never NaN, so
/// [`RoundedWeighted`] can derive `Eq` for use in tests.
pub mod ordered_weight {
    /// See [`super::ordered_weight`].
    #[derive(Clone, Copy, Debug)]
    pub struct OrderedF32(pub f32);

    impl PartialEq for OrderedF32 {
        fn eq(&self, other: &Self) -> bool {
            self.0.to_bits() == other.0.to_bits()
        }
    }
    impl Eq for OrderedF32 {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    fn random_weighted_points(rng: &mut Pcg64, n: usize) -> Vec<WeightedPoint> {
        (0..n)
            .map(|_| {
                WeightedPoint::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(0.1..3.0),
                )
            })
            .collect()
    }

    #[test]
    fn to_bin_same_position_is_bin_zero() {
        assert_eq!(to_bin(0.0, 1.0), 0);
    }

    #[test]
    fn to_bin_round_half_to_even() {
        // 2.5 Å at 1 Å bin width ties between bin 2 and bin 3; banker's
        // rounding resolves to the even neighbour, bin 2.
        assert_eq!(to_bin(2.5, 1.0), 2);
        // 3.5 Å ties between bin 3 and bin 4; even neighbour is bin 4.
        assert_eq!(to_bin(3.5, 1.0), 4);
    }

    #[test]
    fn scalar_and_simd128_agree_on_weighted_batch() {
        let mut rng = Pcg64::seed_from_u64(42);
        let anchor = random_weighted_points(&mut rng, 1)[0];
        let others: [WeightedPoint; 4] = random_weighted_points(&mut rng, 4).try_into().unwrap();

        let simd = simd128::weighted_raw_x4(anchor, &others);
        for (i, o) in others.iter().enumerate() {
            let s = scalar::weighted_raw(anchor, *o);
            assert!((s.distance - simd[i].distance).abs() < 1e-5);
            assert!((s.weight - simd[i].weight).abs() < 1e-6);
        }
    }

    #[test]
    fn scalar_and_simd256_agree_on_weighted_batch() {
        let mut rng = Pcg64::seed_from_u64(7);
        let anchor = random_weighted_points(&mut rng, 1)[0];
        let others: [WeightedPoint; 8] = random_weighted_points(&mut rng, 8).try_into().unwrap();

        let simd = simd256::weighted_raw_x8(anchor, &others);
        for (i, o) in others.iter().enumerate() {
            let s = scalar::weighted_raw(anchor, *o);
            assert!((s.distance - simd[i].distance).abs() < 1e-5);
            assert!((s.weight - simd[i].weight).abs() < 1e-6);
        }
    }

    #[test]
    fn batch_dispatch_matches_length() {
        let anchor = WeightedPoint::new(0.0, 0.0, 0.0, 1.0);
        let three = vec![
            WeightedPoint::new(1.0, 0.0, 0.0, 1.0),
            WeightedPoint::new(0.0, 1.0, 0.0, 1.0),
            WeightedPoint::new(0.0, 0.0, 1.0, 1.0),
        ];
        let result = weighted_raw_batch(anchor, &three);
        assert_eq!(result.len(), 3);
        for r in &result {
            assert!((r.distance - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn form_factor_pair_index_matches_spec_formula() {
        // ff_pair = ff2 + ff1 * T
        assert_eq!(combine_ff_pair(0, 0, 5), 0);
        assert_eq!(combine_ff_pair(1, 2, 5), 7);
        assert_eq!(combine_ff_pair(2, 1, 5), 11);
    }

    #[test]
    fn self_pair_is_bin_zero_not_underflow() {
        let p = WeightedPoint::new(3.5, -1.2, 9.9, 1.0);
        let r = scalar::weighted_raw(p, p);
        assert_eq!(r.distance, 0.0);
        assert_eq!(to_bin(r.distance, 1.0), 0);
    }
}
