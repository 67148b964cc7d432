//! Per-body-pair partial histogram computation. Each accumulation function
//! below splits its outer anchor loop into contiguous chunks and schedules
//! one rayon task per chunk, each building its own [`PartitionedHistogram`];
//! [`super::HistogramManager`] then merges the per-body-pair results it
//! schedules on top of this.

use crate::error::{Error, Result};
use crate::histogram::{OverflowPolicy, PartitionedHistogram};
use crate::kernel::{self, BATCH};
use crate::point::{FormFactorPoint, WeightedPoint};
use rayon::prelude::*;

/// One body's packed point clouds, ready for pairwise evaluation.
#[derive(Clone, Debug, Default)]
pub struct BodyPoints {
    /// Heavy-atom points, form-factor-indexed.
    pub atoms: Vec<FormFactorPoint>,
    /// Per-atom occupancy weight, parallel to `atoms`.
    pub atom_weights: Vec<f32>,
    /// Water points, weight = occupancy.
    pub waters: Vec<WeightedPoint>,
    /// Excluded-volume pseudo-points, one colocated with each atom, weight =
    /// that atom's occupancy (spec.md §4.3: the exv point cloud shares
    /// atomic positions for the `average`/`explicit` variants).
    pub exv: Vec<WeightedPoint>,
}

/// Anchors per rayon task in the anchor loops below. Chosen so that small
/// bodies (a handful of atoms) still run as a single task, while larger
/// bodies split across the thread pool.
const ANCHOR_CHUNK: usize = 64;

fn bin_index(bin: u32, num_bins: usize, overflow: OverflowPolicy, inv_bin_width: f32) -> Result<usize> {
    let bin = bin as usize;
    if bin < num_bins {
        return Ok(bin);
    }
    match (overflow, num_bins) {
        (OverflowPolicy::Saturate, n) if n > 0 => Ok(n - 1),
        _ => Err(Error::BinOverflow {
            distance: bin as f32 / inv_bin_width,
            bound: num_bins as f32 / inv_bin_width,
        }),
    }
}

/// Runs `body` once per contiguous `[start, end)` anchor range covering
/// `0..n`, one rayon task per range, and merges the resulting partial
/// histograms in range order — independent of which task finishes first, so
/// the reduction is deterministic (spec.md §5).
fn parallel_reduce<F>(n: usize, num_types: usize, num_bins: usize, body: F) -> Result<PartitionedHistogram>
where
    F: Fn(usize, usize) -> Result<PartitionedHistogram> + Sync,
{
    if n == 0 {
        return Ok(PartitionedHistogram::zeros(num_types, num_bins));
    }
    let ranges: Vec<(usize, usize)> =
        (0..n).step_by(ANCHOR_CHUNK).map(|start| (start, (start + ANCHOR_CHUNK).min(n))).collect();
    let parts: Vec<Result<PartitionedHistogram>> =
        ranges.into_par_iter().map(|(start, end)| body(start, end)).collect();
    let mut total = PartitionedHistogram::zeros(num_types, num_bins);
    for part in parts {
        total.merge(&part?);
    }
    Ok(total)
}

/// Accumulates atom-atom pairs between `a` and `b` into a fresh histogram.
/// When `same_body` is true, `a` and `b` are the same point cloud: only the
/// strict upper triangle (`ai < bi`) is visited, plus each atom's self term,
/// to avoid double-counting (see
/// [`PartitionedHistogram::add_aa`][crate::histogram::PartitionedHistogram::add_aa]).
fn accumulate_aa(
    a_points: &[FormFactorPoint],
    a_weights: &[f32],
    b_points: &[FormFactorPoint],
    b_weights: &[f32],
    same_body: bool,
    num_types: i32,
    num_bins: usize,
    inv_bin_width: f32,
    overflow: OverflowPolicy,
) -> Result<PartitionedHistogram> {
    parallel_reduce(a_points.len(), num_types as usize, num_bins, |lo, hi| {
        let mut hist = PartitionedHistogram::zeros(num_types as usize, num_bins);
        for ai in lo..hi {
            let anchor = a_points[ai];
            let start = if same_body { ai + 1 } else { 0 };
            if start < b_points.len() {
                let others = &b_points[start..];
                for chunk_start in (0..others.len()).step_by(BATCH) {
                    let chunk = &others[chunk_start..(chunk_start + BATCH).min(others.len())];
                    let raw = kernel::form_factor_raw_batch(anchor, chunk, num_types);
                    for (k, r) in raw.into_iter().enumerate() {
                        let bi = start + chunk_start + k;
                        let bin =
                            bin_index(kernel::to_bin(r.distance, inv_bin_width), num_bins, overflow, inv_bin_width)?;
                        let j = r.ff_pair - anchor.ff_index * num_types;
                        let weight = f64::from(a_weights[ai]) * f64::from(b_weights[bi]);
                        hist.add_aa(anchor.ff_index as usize, j as usize, bin, weight);
                    }
                }
            }
            if same_body {
                let weight = f64::from(a_weights[ai]) * f64::from(a_weights[ai]);
                hist.add_self_aa(anchor.ff_index as usize, weight);
            }
        }
        Ok(hist)
    })
}

/// Accumulates atom-water pairs: `atoms` against `waters`, one-directionally
/// (see
/// [`PartitionedHistogram::add_aw`][crate::histogram::PartitionedHistogram::add_aw]).
fn accumulate_aw(
    atoms: &[FormFactorPoint],
    atom_weights: &[f32],
    waters: &[WeightedPoint],
    num_types: usize,
    num_bins: usize,
    inv_bin_width: f32,
    overflow: OverflowPolicy,
) -> Result<PartitionedHistogram> {
    parallel_reduce(atoms.len(), num_types, num_bins, |lo, hi| {
        let mut hist = PartitionedHistogram::zeros(num_types, num_bins);
        for ai in lo..hi {
            let anchor = atoms[ai];
            let anchor_weighted = WeightedPoint::new(anchor.x, anchor.y, anchor.z, atom_weights[ai]);
            for chunk in waters.chunks(BATCH) {
                let raw = kernel::weighted_raw_batch(anchor_weighted, chunk);
                for r in raw {
                    let bin = bin_index(kernel::to_bin(r.distance, inv_bin_width), num_bins, overflow, inv_bin_width)?;
                    hist.add_aw(anchor.ff_index as usize, bin, f64::from(r.weight));
                }
            }
        }
        Ok(hist)
    })
}

/// Accumulates atom-exv pairs, structurally identical to [`accumulate_aw`].
fn accumulate_ax(
    atoms: &[FormFactorPoint],
    atom_weights: &[f32],
    exv: &[WeightedPoint],
    num_types: usize,
    num_bins: usize,
    inv_bin_width: f32,
    overflow: OverflowPolicy,
) -> Result<PartitionedHistogram> {
    parallel_reduce(atoms.len(), num_types, num_bins, |lo, hi| {
        let mut hist = PartitionedHistogram::zeros(num_types, num_bins);
        for ai in lo..hi {
            let anchor = atoms[ai];
            let anchor_weighted = WeightedPoint::new(anchor.x, anchor.y, anchor.z, atom_weights[ai]);
            for chunk in exv.chunks(BATCH) {
                let raw = kernel::weighted_raw_batch(anchor_weighted, chunk);
                for r in raw {
                    let bin = bin_index(kernel::to_bin(r.distance, inv_bin_width), num_bins, overflow, inv_bin_width)?;
                    hist.add_ax(anchor.ff_index as usize, bin, f64::from(r.weight));
                }
            }
        }
        Ok(hist)
    })
}

/// Which bare `B x B` channel [`accumulate_symmetric`] writes into. Water-
/// water and exv-exv pairs are both plain weighted-point clouds with the
/// same doubled-cross / undoubled-self convention, so one generic routine
/// serves both.
#[derive(Clone, Copy)]
enum SymmetricChannel {
    Ww,
    Xx,
}

impl SymmetricChannel {
    fn add_cross(self, hist: &mut PartitionedHistogram, bin: usize, weight: f64) {
        match self {
            Self::Ww => hist.add_ww(bin, weight),
            Self::Xx => hist.add_xx(bin, weight),
        }
    }

    fn add_self(self, hist: &mut PartitionedHistogram, weight: f64) {
        match self {
            Self::Ww => hist.add_self_ww(weight),
            Self::Xx => hist.add_self_xx(weight),
        }
    }
}

/// Accumulates water-water or exv-exv pairs into `channel`.
fn accumulate_symmetric(
    a_points: &[WeightedPoint],
    b_points: &[WeightedPoint],
    same_body: bool,
    channel: SymmetricChannel,
    num_types: usize,
    num_bins: usize,
    inv_bin_width: f32,
    overflow: OverflowPolicy,
) -> Result<PartitionedHistogram> {
    parallel_reduce(a_points.len(), num_types, num_bins, |lo, hi| {
        let mut hist = PartitionedHistogram::zeros(num_types, num_bins);
        for ai in lo..hi {
            let anchor = a_points[ai];
            let start = if same_body { ai + 1 } else { 0 };
            if start < b_points.len() {
                let others = &b_points[start..];
                for chunk in others.chunks(BATCH) {
                    let raw = kernel::weighted_raw_batch(anchor, chunk);
                    for r in raw {
                        let bin =
                            bin_index(kernel::to_bin(r.distance, inv_bin_width), num_bins, overflow, inv_bin_width)?;
                        channel.add_cross(&mut hist, bin, f64::from(r.weight));
                    }
                }
            }
            if same_body {
                channel.add_self(&mut hist, f64::from(anchor.weight) * f64::from(anchor.weight));
            }
        }
        Ok(hist)
    })
}

/// Accumulates water-exv pairs, one-directional like [`accumulate_aw`].
fn accumulate_wx(
    waters: &[WeightedPoint],
    exv: &[WeightedPoint],
    num_types: usize,
    num_bins: usize,
    inv_bin_width: f32,
    overflow: OverflowPolicy,
) -> Result<PartitionedHistogram> {
    parallel_reduce(waters.len(), num_types, num_bins, |lo, hi| {
        let mut hist = PartitionedHistogram::zeros(num_types, num_bins);
        for ai in lo..hi {
            let anchor = waters[ai];
            for chunk in exv.chunks(BATCH) {
                let raw = kernel::weighted_raw_batch(anchor, chunk);
                for r in raw {
                    let bin = bin_index(kernel::to_bin(r.distance, inv_bin_width), num_bins, overflow, inv_bin_width)?;
                    hist.add_wx(bin, f64::from(r.weight));
                }
            }
        }
        Ok(hist)
    })
}

/// Computes the full partial-histogram contribution of one body pair.
/// `same_body` must be true iff `a` and `b` are the same
/// [`BodyPoints`] (self-pair of a body with itself).
pub fn pair_partial(
    a: &BodyPoints,
    b: &BodyPoints,
    same_body: bool,
    num_types: usize,
    num_bins: usize,
    inv_bin_width: f32,
    overflow: OverflowPolicy,
) -> Result<PartitionedHistogram> {
    let mut hist = PartitionedHistogram::zeros(num_types, num_bins);

    hist.merge(&accumulate_aa(
        &a.atoms,
        &a.atom_weights,
        &b.atoms,
        &b.atom_weights,
        same_body,
        num_types as i32,
        num_bins,
        inv_bin_width,
        overflow,
    )?);
    hist.merge(&accumulate_aw(&a.atoms, &a.atom_weights, &b.waters, num_types, num_bins, inv_bin_width, overflow)?);
    hist.merge(&accumulate_ax(&a.atoms, &a.atom_weights, &b.exv, num_types, num_bins, inv_bin_width, overflow)?);
    if same_body {
        hist.merge(&accumulate_symmetric(
            &a.waters,
            &b.waters,
            true,
            SymmetricChannel::Ww,
            num_types,
            num_bins,
            inv_bin_width,
            overflow,
        )?);
        hist.merge(&accumulate_symmetric(
            &a.exv,
            &b.exv,
            true,
            SymmetricChannel::Xx,
            num_types,
            num_bins,
            inv_bin_width,
            overflow,
        )?);
        hist.merge(&accumulate_wx(&a.waters, &a.exv, num_types, num_bins, inv_bin_width, overflow)?);
    } else {
        hist.merge(&accumulate_aw(&b.atoms, &b.atom_weights, &a.waters, num_types, num_bins, inv_bin_width, overflow)?);
        hist.merge(&accumulate_ax(&b.atoms, &b.atom_weights, &a.exv, num_types, num_bins, inv_bin_width, overflow)?);
        hist.merge(&accumulate_symmetric(
            &a.waters,
            &b.waters,
            false,
            SymmetricChannel::Ww,
            num_types,
            num_bins,
            inv_bin_width,
            overflow,
        )?);
        hist.merge(&accumulate_symmetric(
            &a.exv,
            &b.exv,
            false,
            SymmetricChannel::Xx,
            num_types,
            num_bins,
            inv_bin_width,
            overflow,
        )?);
        hist.merge(&accumulate_wx(&a.waters, &b.exv, num_types, num_bins, inv_bin_width, overflow)?);
        hist.merge(&accumulate_wx(&b.waters, &a.exv, num_types, num_bins, inv_bin_width, overflow)?);
    }
    Ok(hist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{FormFactorPoint, WeightedPoint};

    fn single_atom_body(x: f32, ff_index: i32) -> BodyPoints {
        BodyPoints {
            atoms: vec![FormFactorPoint::new(x, 0.0, 0.0, ff_index)],
            atom_weights: vec![1.0],
            waters: vec![],
            exv: vec![WeightedPoint::new(x, 0.0, 0.0, 1.0)],
        }
    }

    #[test]
    fn self_body_single_atom_has_only_self_term() {
        let body = single_atom_body(0.0, 0);
        let hist = pair_partial(&body, &body, true, 1, 5, 1.0, OverflowPolicy::Saturate).unwrap();
        assert_eq!(hist.aa[[0, 0, 0]], 1.0);
        assert_eq!(hist.xx[0], 1.0);
        assert_eq!(hist.aa.sum() - hist.aa[[0, 0, 0]], 0.0);
    }

    #[test]
    fn cross_body_two_atoms_produce_symmetric_aa() {
        let a = single_atom_body(0.0, 0);
        let b = single_atom_body(3.0, 0);
        let hist = pair_partial(&a, &b, false, 1, 5, 1.0, OverflowPolicy::Saturate).unwrap();
        // Same type index on both ends doubles the cell (see `add_aa`).
        assert_eq!(hist.aa[[0, 0, 3]], 2.0);
    }

    #[test]
    fn overflow_reject_surfaces_as_error() {
        let a = single_atom_body(0.0, 0);
        let b = single_atom_body(100.0, 0);
        let err = pair_partial(&a, &b, false, 1, 5, 1.0, OverflowPolicy::Reject).unwrap_err();
        assert!(matches!(err, Error::BinOverflow { .. }));
    }

    #[test]
    fn many_atoms_split_across_anchor_chunks_matches_single_chunk() {
        // Enough atoms that accumulate_aa schedules more than one rayon task
        // (ANCHOR_CHUNK == 64), checked against a hand-summed total pair count.
        let n = 130;
        let atoms: Vec<FormFactorPoint> = (0..n).map(|i| FormFactorPoint::new(i as f32, 0.0, 0.0, 0)).collect();
        let body = BodyPoints {
            atoms,
            atom_weights: vec![1.0; n],
            waters: vec![],
            exv: vec![],
        };
        let hist = pair_partial(&body, &body, true, 1, n + 1, 1.0, OverflowPolicy::Saturate).unwrap();
        let total_pairs: f64 = hist.aa.iter().sum::<f64>() - hist.aa[[0, 0, 0]];
        // Every unordered pair contributes 2.0 to the doubled `aa` cells.
        let expected_pairs = (n * (n - 1)) as f64; // == 2 * C(n, 2)
        assert_eq!(total_pairs, expected_pairs);
        assert_eq!(hist.aa[[0, 0, 0]], n as f64);
    }
}
