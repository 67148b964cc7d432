//! The composite distance histogram: a [`PartitionedHistogram`] paired with a
//! [`FormFactorTable`] and a [`SincTable`], together able to produce `I(q)`
//! via the Debye transform (spec.md §4.5).
//!
//! The six sub-histograms are bilinear in form factor and linear in the two
//! scaling parameters `c_w` (water) and `c_x` (excluded volume), so
//! `debye_transform` can be decomposed into six cached partial curves —
//! [`crate::intensity::CachedIntensity`] owns that cache; this type owns the
//! raw accumulation and the un-cached formula.

use crate::error::{Error, Result};
use crate::formfactor::FormFactorTable;
use crate::histogram::PartitionedHistogram;
use crate::sinc::SincTable;

/// A [`PartitionedHistogram`] bound to the [`FormFactorTable`] and
/// [`SincTable`] it will be transformed with.
#[derive(Clone, Debug)]
pub struct CompositeHistogram {
    histogram: PartitionedHistogram,
    form_factors: FormFactorTable,
    sinc: SincTable,
    c_w: f64,
    c_x: f64,
    version: u64,
}

impl CompositeHistogram {
    /// Builds a composite histogram, checking that `form_factors` and
    /// `sinc` share a q-axis and that `histogram`'s type/bin counts match
    /// `form_factors`/`sinc`.
    pub fn new(
        histogram: PartitionedHistogram,
        form_factors: FormFactorTable,
        sinc: SincTable,
    ) -> Result<Self> {
        if !form_factors.q_axis().compatible_with(sinc.q_axis()) {
            return Err(Error::AxisMismatch(
                "form-factor table and sinc table built for different q-axes".into(),
            ));
        }
        if histogram.num_types() != form_factors.num_types() {
            return Err(Error::AxisMismatch(format!(
                "histogram has {} atom types, form-factor table has {}",
                histogram.num_types(),
                form_factors.num_types()
            )));
        }
        if histogram.num_bins() != sinc.r_axis().n {
            return Err(Error::AxisMismatch(format!(
                "histogram has {} distance bins, sinc table's r-axis has {}",
                histogram.num_bins(),
                sinc.r_axis().n
            )));
        }
        Ok(Self {
            histogram,
            form_factors,
            sinc,
            c_w: 1.0,
            c_x: 1.0,
            version: 0,
        })
    }

    /// Read-only access to the underlying partitioned histogram.
    #[must_use]
    pub const fn histogram(&self) -> &PartitionedHistogram {
        &self.histogram
    }

    /// Mutable access, for accumulation. Bumps [`Self::version`] on the
    /// assumption that the caller is about to change bin contents; a cache
    /// built from this composite before the call is stale afterwards.
    pub fn histogram_mut(&mut self) -> &mut PartitionedHistogram {
        self.version += 1;
        &mut self.histogram
    }

    /// Monotonically increasing counter bumped by [`Self::histogram_mut`].
    /// [`crate::intensity::CachedIntensity`] records the version it was
    /// built from and uses this to detect a stale cache.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// The bound form-factor table.
    #[must_use]
    pub const fn form_factors(&self) -> &FormFactorTable {
        &self.form_factors
    }

    /// The bound sinc table.
    #[must_use]
    pub const fn sinc(&self) -> &SincTable {
        &self.sinc
    }

    /// Current water-scaling parameter.
    #[must_use]
    pub const fn c_w(&self) -> f64 {
        self.c_w
    }

    /// Current excluded-volume-scaling parameter.
    #[must_use]
    pub const fn c_x(&self) -> f64 {
        self.c_x
    }

    /// Sets the water-scaling parameter, rejecting non-finite or negative
    /// values.
    pub fn apply_water_scaling(&mut self, c_w: f64) -> Result<()> {
        if !c_w.is_finite() || c_w < 0.0 {
            return Err(Error::InvalidScaling { name: "c_w", value: c_w });
        }
        self.c_w = c_w;
        Ok(())
    }

    /// Sets the excluded-volume-scaling parameter, rejecting non-finite or
    /// negative values.
    pub fn apply_exv_scaling(&mut self, c_x: f64) -> Result<()> {
        if !c_x.is_finite() || c_x < 0.0 {
            return Err(Error::InvalidScaling { name: "c_x", value: c_x });
        }
        self.c_x = c_x;
        Ok(())
    }

    /// `p(r)` contribution of the atom-atom sub-histogram only, summed over
    /// types at each bin, weighted by `f_i(q)f_j(q)` at a fixed q-index.
    #[must_use]
    pub fn profile_aa(&self, q_index: usize) -> f64 {
        let h = &self.histogram;
        let row = self.sinc.row(q_index);
        let mut sum = 0.0;
        for i in 0..h.num_types() {
            for j in 0..h.num_types() {
                let ff = self.form_factors.product_aa(i, j, q_index);
                for bin in 0..h.num_bins() {
                    sum += ff * h.aa[[i, j, bin]] * f64::from(row[bin]);
                }
            }
        }
        sum
    }

    /// `p(r)` contribution of the atom-water sub-histogram.
    #[must_use]
    pub fn profile_aw(&self, q_index: usize) -> f64 {
        let h = &self.histogram;
        let row = self.sinc.row(q_index);
        let mut sum = 0.0;
        for i in 0..h.num_types() {
            let ff = self.form_factors.product_aw(i, q_index);
            for bin in 0..h.num_bins() {
                sum += ff * h.aw[[i, bin]] * f64::from(row[bin]);
            }
        }
        sum
    }

    /// `p(r)` contribution of the atom-excluded-volume sub-histogram.
    #[must_use]
    pub fn profile_ax(&self, q_index: usize) -> f64 {
        let h = &self.histogram;
        let row = self.sinc.row(q_index);
        let mut sum = 0.0;
        for i in 0..h.num_types() {
            let ff = self.form_factors.product_ax(i, q_index);
            for bin in 0..h.num_bins() {
                sum += ff * h.ax[[i, bin]] * f64::from(row[bin]);
            }
        }
        sum
    }

    /// `p(r)` contribution of the water-water sub-histogram.
    #[must_use]
    pub fn profile_ww(&self, q_index: usize) -> f64 {
        let row = self.sinc.row(q_index);
        let ff = self.form_factors.product_ww(q_index);
        self.histogram
            .ww
            .iter()
            .zip(row)
            .map(|(&bin, &s)| ff * bin * f64::from(s))
            .sum()
    }

    /// `p(r)` contribution of the water-excluded-volume sub-histogram.
    #[must_use]
    pub fn profile_wx(&self, q_index: usize) -> f64 {
        let row = self.sinc.row(q_index);
        let ff = self.form_factors.product_wx(q_index);
        self.histogram
            .wx
            .iter()
            .zip(row)
            .map(|(&bin, &s)| ff * bin * f64::from(s))
            .sum()
    }

    /// `p(r)` contribution of the excluded-volume-excluded-volume
    /// sub-histogram.
    #[must_use]
    pub fn profile_xx(&self, q_index: usize) -> f64 {
        let row = self.sinc.row(q_index);
        let ff = self.form_factors.product_xx(q_index);
        self.histogram
            .xx
            .iter()
            .zip(row)
            .map(|(&bin, &s)| ff * bin * f64::from(s))
            .sum()
    }

    /// The full Debye transform at one q-point (spec.md §4.5):
    ///
    /// `I(q) = aa + 2 c_w aw - 2 c_x ax + c_w² ww - 2 c_w c_x wx + c_x² xx`
    #[must_use]
    pub fn debye_at(&self, q_index: usize) -> f64 {
        self.profile_aa(q_index) + 2.0 * self.c_w * self.profile_aw(q_index)
            - 2.0 * self.c_x * self.profile_ax(q_index)
            + self.c_w.powi(2) * self.profile_ww(q_index)
            - 2.0 * self.c_w * self.c_x * self.profile_wx(q_index)
            + self.c_x.powi(2) * self.profile_xx(q_index)
    }

    /// The full `I(q)` curve over every q-point on the bound form-factor
    /// table's q-axis.
    #[must_use]
    pub fn debye_transform(&self) -> Vec<f64> {
        (0..self.form_factors.q_axis().n).map(|qi| self.debye_at(qi)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisSpec;
    use crate::exv::{AverageExv, ExvVariant};
    use ndarray::Array2;

    fn build(num_types: usize, num_bins: usize, n_q: usize) -> CompositeHistogram {
        let q_axis = AxisSpec {
            min: 0.1,
            max: 1.0,
            n: n_q,
        };
        let r_axis = AxisSpec {
            min: 0.0,
            max: num_bins as f64,
            n: num_bins,
        };
        let atoms = Array2::from_elem((num_types, n_q), 1.0);
        let water = vec![1.0; n_q];
        let exv = ExvVariant::Average(AverageExv::default());
        let form_factors = FormFactorTable::new(q_axis, atoms, water, &exv).unwrap();
        let sinc = SincTable::new(q_axis, r_axis);
        let histogram = PartitionedHistogram::zeros(num_types, num_bins);
        CompositeHistogram::new(histogram, form_factors, sinc).unwrap()
    }

    #[test]
    fn rejects_histogram_type_count_mismatch() {
        let q_axis = AxisSpec::default_q();
        let r_axis = AxisSpec::default_r();
        let atoms = Array2::from_elem((2, q_axis.n), 1.0);
        let water = vec![1.0; q_axis.n];
        let exv = ExvVariant::Average(AverageExv::default());
        let form_factors = FormFactorTable::new(q_axis, atoms, water, &exv).unwrap();
        let sinc = SincTable::new(q_axis, r_axis);
        let histogram = PartitionedHistogram::zeros(3, r_axis.n);
        let err = CompositeHistogram::new(histogram, form_factors, sinc).unwrap_err();
        assert!(matches!(err, Error::AxisMismatch(_)));
    }

    #[test]
    fn zero_histogram_gives_zero_intensity() {
        let composite = build(2, 5, 4);
        for qi in 0..4 {
            assert_eq!(composite.debye_at(qi), 0.0);
        }
    }

    #[test]
    fn single_self_pair_contributes_at_every_q() {
        let mut composite = build(1, 5, 4);
        composite.histogram_mut().add_self_aa(0, 2.0);
        let curve = composite.debye_transform();
        for v in curve {
            // sinc(q, 0) == 1, form factor product == 1, so aa == 2.0 exactly.
            assert!((v - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn scaling_rejects_negative_values() {
        let mut composite = build(1, 5, 4);
        assert!(composite.apply_water_scaling(-1.0).is_err());
        assert!(composite.apply_exv_scaling(f64::NAN).is_err());
        assert!(composite.apply_water_scaling(2.0).is_ok());
        assert!((composite.c_w() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn debye_at_matches_manual_linear_combination() {
        let mut composite = build(1, 3, 2);
        composite.histogram_mut().add_self_aa(0, 1.0);
        composite.histogram_mut().add_aw(0, 0, 1.0);
        composite.histogram_mut().add_self_ww(1.0);
        composite.apply_water_scaling(2.0).unwrap();
        let aa = composite.profile_aa(0);
        let aw = composite.profile_aw(0);
        let ww = composite.profile_ww(0);
        let expected = aa + 2.0 * 2.0 * aw + 4.0 * ww;
        assert!((composite.debye_at(0) - expected).abs() < 1e-9);
    }
}
