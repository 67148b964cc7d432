//! The distance histogram: a plain, one-dimensional `p(r)` accumulator, and
//! its form-factor-partitioned counterpart used internally by
//! [`crate::composite::CompositeHistogram`].
//!
//! These are two distinct entities (spec.md §3's data model lists them
//! separately): [`DistanceHistogram`] counts each unordered pair exactly
//! once (`Σ bins == N(N-1)/2`, plus `N` self-pairs at bin 0); the six arrays
//! of [`PartitionedHistogram`] follow a different, physics-driven
//! convention — see the doc comment on [`PartitionedHistogram::add_aa`].

use crate::error::{Error, Result};
use crate::kernel::to_bin;
use ndarray::{Array1, Array2, Array3};

/// What to do when a computed distance falls outside a histogram's r-axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Extend the histogram so the offending bin exists.
    Grow,
    /// Fold the weight into the last bin instead of growing.
    Saturate,
    /// Return [`Error::BinOverflow`] instead of accumulating.
    Reject,
}

/// A one-dimensional, non-negative distance histogram, `p(r)`.
#[derive(Clone, Debug)]
pub struct DistanceHistogram {
    bins: Vec<f64>,
    self_term: f64,
    inv_bin_width: f32,
    overflow: OverflowPolicy,
}

impl DistanceHistogram {
    /// Builds an empty histogram with `num_bins` bins of width `1 /
    /// inv_bin_width`.
    #[must_use]
    pub fn new(num_bins: usize, inv_bin_width: f32, overflow: OverflowPolicy) -> Self {
        Self {
            bins: vec![0.0; num_bins],
            self_term: 0.0,
            inv_bin_width,
            overflow,
        }
    }

    /// The non-negative per-bin counts, excluding the self term.
    #[must_use]
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// The accumulated self-pair term (tracked separately, see spec.md
    /// §4.2: "contribute only to the bin-0 self term, which is tracked
    /// separately").
    #[must_use]
    pub const fn self_term(&self) -> f64 {
        self.self_term
    }

    /// Sum over all bins, including the self term. Testable property:
    /// equals `N(N-1)/2 + N` for unit weights (spec.md §8).
    #[must_use]
    pub fn total(&self) -> f64 {
        self.bins.iter().sum::<f64>() + self.self_term
    }

    /// Accumulates `weight` at the bin corresponding to `distance`.
    pub fn add(&mut self, distance: f32, weight: f64) -> Result<()> {
        let bin = to_bin(distance, self.inv_bin_width) as usize;
        self.add_bin(bin, weight)
    }

    /// Accumulates `weight` directly at `bin`, applying this histogram's
    /// [`OverflowPolicy`] if `bin` is out of range.
    pub fn add_bin(&mut self, bin: usize, weight: f64) -> Result<()> {
        if bin < self.bins.len() {
            self.bins[bin] += weight;
            return Ok(());
        }
        match self.overflow {
            OverflowPolicy::Grow => {
                self.bins.resize(bin + 1, 0.0);
                self.bins[bin] += weight;
                Ok(())
            }
            OverflowPolicy::Saturate => match self.bins.last_mut() {
                Some(last) => {
                    *last += weight;
                    Ok(())
                }
                None => Err(Error::BinOverflow {
                    distance: bin as f32 / self.inv_bin_width,
                    bound: 0.0,
                }),
            },
            OverflowPolicy::Reject => Err(Error::BinOverflow {
                distance: bin as f32 / self.inv_bin_width,
                bound: self.bins.len() as f32 / self.inv_bin_width,
            }),
        }
    }

    /// Adds `weight` to the self-pair term (the bin-0 contribution of `N`
    /// atoms each paired with themselves).
    pub fn add_self(&mut self, weight: f64) {
        self.self_term += weight;
    }

    /// Merges `other` into `self`, bin by bin. If the two histograms have
    /// different lengths, `self` is grown to the larger length first.
    pub fn merge(&mut self, other: &Self) {
        if other.bins.len() > self.bins.len() {
            self.bins.resize(other.bins.len(), 0.0);
        }
        for (dst, src) in self.bins.iter_mut().zip(&other.bins) {
            *dst += src;
        }
        self.self_term += other.self_term;
    }
}

/// The six sub-histograms a [`crate::composite::CompositeHistogram`]
/// combines with a [`crate::formfactor::FormFactorTable`] to produce `I(q)`.
///
/// `aa` is a dense, symmetric `T x T x B` array (`T` non-reserved form
/// factor types, `B` distance bins): `aw`/`ax`/`wx` are `T x B` / `B`-length
/// one-directional vectors, and `ww`/`xx` are `B`-length self-category
/// vectors.
#[derive(Clone, Debug)]
pub struct PartitionedHistogram {
    /// Atom-atom, indexed `[i, j, bin]`. `aa[i,j,bin] == aa[j,i,bin]`.
    pub aa: Array3<f64>,
    /// Atom-water, indexed `[i, bin]`.
    pub aw: Array2<f64>,
    /// Atom-excluded-volume, indexed `[i, bin]`.
    pub ax: Array2<f64>,
    /// Water-water, indexed `[bin]`.
    pub ww: Array1<f64>,
    /// Water-excluded-volume, indexed `[bin]`.
    pub wx: Array1<f64>,
    /// Excluded-volume-excluded-volume, indexed `[bin]`.
    pub xx: Array1<f64>,
}

impl PartitionedHistogram {
    /// Builds an all-zero set of sub-histograms for `num_types` non-reserved
    /// form-factor types and `num_bins` distance bins.
    #[must_use]
    pub fn zeros(num_types: usize, num_bins: usize) -> Self {
        Self {
            aa: Array3::zeros((num_types, num_types, num_bins)),
            aw: Array2::zeros((num_types, num_bins)),
            ax: Array2::zeros((num_types, num_bins)),
            ww: Array1::zeros(num_bins),
            wx: Array1::zeros(num_bins),
            xx: Array1::zeros(num_bins),
        }
    }

    /// Accumulates an unordered cross-atom pair of types `(i, j)` at `bin`
    /// with combined weight `weight`.
    ///
    /// Writes to **both** `[i, j, bin]` and `[j, i, bin]`. When `i == j`
    /// these are the same cell, so the cell ends up holding `2 * weight`;
    /// when `i != j` two distinct cells each hold `weight`. Both cases are
    /// required for `debye_transform`'s `Σ_i Σ_j` to reproduce the physical
    /// Debye double sum over *ordered* atom pairs `(a, b)` and `(b, a)`
    /// (spec.md §4.5's formula has no extra factor on the `aa` term — the
    /// factor is already folded into this storage convention).
    pub fn add_aa(&mut self, i: usize, j: usize, bin: usize, weight: f64) {
        self.aa[[i, j, bin]] += weight;
        self.aa[[j, i, bin]] += weight;
    }

    /// Accumulates an atom self-pair (type `i`, distance 0) directly into
    /// `aa[i, i, 0]`, undoubled: one atom's self term is `f_i(q)²`, counted
    /// once, not twice.
    pub fn add_self_aa(&mut self, i: usize, weight: f64) {
        self.aa[[i, i, 0]] += weight;
    }

    /// Accumulates an atom(type `i`)-water pair. One-directional: the `2
    /// c_w` factor in `debye_transform` supplies the missing ordered-pair
    /// reflection.
    pub fn add_aw(&mut self, i: usize, bin: usize, weight: f64) {
        self.aw[[i, bin]] += weight;
    }

    /// Accumulates an atom(type `i`)-excluded-volume pair. One-directional,
    /// see [`Self::add_aw`].
    pub fn add_ax(&mut self, i: usize, bin: usize, weight: f64) {
        self.ax[[i, bin]] += weight;
    }

    /// Accumulates a water-excluded-volume pair. One-directional, see
    /// [`Self::add_aw`].
    pub fn add_wx(&mut self, bin: usize, weight: f64) {
        self.wx[bin] += weight;
    }

    /// Accumulates a cross (distinct-water, distinct-water) pair. Doubled,
    /// analogous to the diagonal of [`Self::add_aa`]: `debye_transform`'s
    /// `c_w²` term carries no extra factor.
    pub fn add_ww(&mut self, bin: usize, weight: f64) {
        self.ww[bin] += 2.0 * weight;
    }

    /// Accumulates a water self-pair, undoubled (see [`Self::add_self_aa`]).
    pub fn add_self_ww(&mut self, weight: f64) {
        self.ww[0] += weight;
    }

    /// Accumulates a cross (distinct-exv-point, distinct-exv-point) pair.
    /// Doubled, see [`Self::add_ww`].
    pub fn add_xx(&mut self, bin: usize, weight: f64) {
        self.xx[bin] += 2.0 * weight;
    }

    /// Accumulates an excluded-volume self-pair, undoubled.
    pub fn add_self_xx(&mut self, weight: f64) {
        self.xx[0] += weight;
    }

    /// Number of distance bins.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.ww.len()
    }

    /// Number of non-reserved form-factor types.
    #[must_use]
    pub fn num_types(&self) -> usize {
        self.aw.shape()[0]
    }

    /// Element-wise merges `other` into `self`. Both must share shape
    /// (enforced by the manager, which only merges partials it built
    /// itself).
    pub fn merge(&mut self, other: &Self) {
        self.merge_scaled(other, 1.0);
    }

    /// Element-wise merges `factor * other` into `self`. Used by
    /// [`crate::manager`]'s symmetry-aware reduction, where a cross-copy
    /// histogram between two symmetry mates is folded in scaled by `K / 2`
    /// rather than added once per copy pair.
    pub fn merge_scaled(&mut self, other: &Self, factor: f64) {
        ndarray::Zip::from(&mut self.aa).and(&other.aa).for_each(|dst, &src| *dst += factor * src);
        ndarray::Zip::from(&mut self.aw).and(&other.aw).for_each(|dst, &src| *dst += factor * src);
        ndarray::Zip::from(&mut self.ax).and(&other.ax).for_each(|dst, &src| *dst += factor * src);
        ndarray::Zip::from(&mut self.ww).and(&other.ww).for_each(|dst, &src| *dst += factor * src);
        ndarray::Zip::from(&mut self.wx).and(&other.wx).for_each(|dst, &src| *dst += factor * src);
        ndarray::Zip::from(&mut self.xx).and(&other.xx).for_each(|dst, &src| *dst += factor * src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_histogram_counts_each_pair_once() {
        let mut h = DistanceHistogram::new(10, 1.0, OverflowPolicy::Saturate);
        h.add(3.0, 1.0).unwrap();
        h.add(3.4, 1.0).unwrap();
        h.add_self(2.0);
        assert_eq!(h.bins()[3], 2.0);
        assert_eq!(h.self_term(), 2.0);
        assert_eq!(h.total(), 4.0);
    }

    #[test]
    fn saturate_folds_overflow_into_last_bin() {
        let mut h = DistanceHistogram::new(4, 1.0, OverflowPolicy::Saturate);
        h.add(100.0, 1.0).unwrap();
        assert_eq!(h.bins()[3], 1.0);
    }

    #[test]
    fn grow_extends_the_histogram() {
        let mut h = DistanceHistogram::new(4, 1.0, OverflowPolicy::Grow);
        h.add(10.0, 1.0).unwrap();
        assert_eq!(h.bins().len(), 11);
        assert_eq!(h.bins()[10], 1.0);
    }

    #[test]
    fn reject_returns_bin_overflow_error() {
        let mut h = DistanceHistogram::new(4, 1.0, OverflowPolicy::Reject);
        let err = h.add(10.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::BinOverflow { .. }));
    }

    #[test]
    fn merge_sums_bins_and_self_term() {
        let mut a = DistanceHistogram::new(4, 1.0, OverflowPolicy::Saturate);
        let mut b = DistanceHistogram::new(4, 1.0, OverflowPolicy::Saturate);
        a.add(1.0, 1.0).unwrap();
        a.add_self(1.0);
        b.add(1.0, 2.0).unwrap();
        b.add_self(3.0);
        a.merge(&b);
        assert_eq!(a.bins()[1], 3.0);
        assert_eq!(a.self_term(), 4.0);
    }

    #[test]
    fn partitioned_aa_is_symmetric() {
        let mut p = PartitionedHistogram::zeros(3, 5);
        p.add_aa(0, 1, 2, 4.0);
        assert_eq!(p.aa[[0, 1, 2]], p.aa[[1, 0, 2]]);
        assert_eq!(p.aa[[0, 1, 2]], 4.0);
    }

    #[test]
    fn partitioned_aa_diagonal_is_doubled() {
        let mut p = PartitionedHistogram::zeros(2, 5);
        p.add_aa(0, 0, 3, 1.5);
        assert_eq!(p.aa[[0, 0, 3]], 3.0);
    }

    #[test]
    fn self_terms_are_not_doubled() {
        let mut p = PartitionedHistogram::zeros(2, 5);
        p.add_self_aa(1, 7.0);
        p.add_self_ww(2.0);
        p.add_self_xx(1.0);
        assert_eq!(p.aa[[1, 1, 0]], 7.0);
        assert_eq!(p.ww[0], 2.0);
        assert_eq!(p.xx[0], 1.0);
    }

    #[test]
    fn merge_partitioned_histograms() {
        let mut a = PartitionedHistogram::zeros(2, 3);
        let mut b = PartitionedHistogram::zeros(2, 3);
        a.add_aw(0, 1, 1.0);
        b.add_aw(0, 1, 2.0);
        a.merge(&b);
        assert_eq!(a.aw[[0, 1]], 3.0);
    }

    #[test]
    fn merge_scaled_applies_factor() {
        let mut a = PartitionedHistogram::zeros(1, 3);
        let mut b = PartitionedHistogram::zeros(1, 3);
        b.add_wx(1, 2.0);
        a.merge_scaled(&b, 1.5);
        assert_eq!(a.wx[1], 3.0);
    }
}
