//! Linearly-spaced axis specifications shared by the q-axis, the r-axis, the
//! [`crate::sinc::SincTable`] and the [`crate::formfactor::FormFactorTable`].

use serde::{Deserialize, Serialize};

/// A linearly-spaced axis `[min, max]` divided into `n` points (for a q-axis)
/// or `n` bins of width `(max - min) / n` (for an r-axis).
///
/// Two tables or histograms built from axes that compare unequal via
/// [`AxisSpec::compatible_with`] must not be combined; callers get
/// [`crate::error::Error::AxisMismatch`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    /// Lower bound, inclusive.
    pub min: f64,
    /// Upper bound, inclusive for q-axes, exclusive for the last r-bin.
    pub max: f64,
    /// Number of points (q-axis) or bins (r-axis).
    pub n: usize,
}

impl AxisSpec {
    /// The default q-axis: 0.0 to 1.0 Å⁻¹ in 1000 points.
    #[must_use]
    pub const fn default_q() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            n: 1000,
        }
    }

    /// The default r-axis: 0 to 1000 Å in 1 Å bins.
    #[must_use]
    pub const fn default_r() -> Self {
        Self {
            min: 0.0,
            max: 1000.0,
            n: 1000,
        }
    }

    /// Width of one step: `(max - min) / n`.
    #[must_use]
    pub fn step(&self) -> f64 {
        (self.max - self.min) / self.n as f64
    }

    /// The inverse of [`Self::step`], used to convert a distance into a bin index.
    #[must_use]
    pub fn inv_step(&self) -> f64 {
        self.n as f64 / (self.max - self.min)
    }

    /// The value at point/bin `i`, i.e. `min + i * step()`.
    #[must_use]
    pub fn value(&self, i: usize) -> f64 {
        self.min + i as f64 * self.step()
    }

    /// All `n` values of this axis, evenly spaced.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        (0..self.n).map(|i| self.value(i)).collect()
    }

    /// Two axes are compatible when they describe the same grid: tables and
    /// histograms built from incompatible axes must never be combined.
    #[must_use]
    pub fn compatible_with(&self, other: &Self) -> bool {
        self.n == other.n
            && float_cmp::approx_eq!(f64, self.min, other.min, epsilon = 1e-9)
            && float_cmp::approx_eq!(f64, self.max, other.max, epsilon = 1e-9)
    }
}

#[cfg(test)]
mod tests {
    use super::AxisSpec;

    #[test]
    fn default_q_step() {
        let axis = AxisSpec::default_q();
        assert_eq!(axis.n, 1000);
        assert!((axis.step() - 0.001).abs() < 1e-12);
        assert!((axis.value(0) - 0.0).abs() < 1e-12);
        assert!((axis.value(999) - 0.999).abs() < 1e-9);
    }

    #[test]
    fn default_r_is_one_angstrom_bins() {
        let axis = AxisSpec::default_r();
        assert!((axis.step() - 1.0).abs() < 1e-12);
        assert!((axis.inv_step() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn compatibility() {
        let a = AxisSpec::default_q();
        let b = AxisSpec::default_q();
        let c = AxisSpec {
            n: 500,
            ..AxisSpec::default_q()
        };
        assert!(a.compatible_with(&b));
        assert!(!a.compatible_with(&c));
    }
}
