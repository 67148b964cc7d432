//! The form-factor table: per-type amplitude curves `f_i(q)` sampled over a
//! shared q-axis, plus the two reserved curves (water, excluded volume) that
//! round out the six-component Debye sum (spec.md §4.3/§4.5).
//!
//! Computing the *raw* atomic curves (Cromer-Mann coefficients and the like)
//! is a physics collaborator's job and stays out of this crate — this table
//! only stores whatever curves it is given and exposes the pairwise products
//! [`crate::intensity::CachedIntensity`] needs.

use crate::axis::AxisSpec;
use crate::error::{Error, Result};
use crate::exv::ExvFormFactor;
use ndarray::Array2;

/// Amplitude curves `f_i(q)` for every non-reserved atom type, plus the
/// reserved water and excluded-volume curves, all sampled on the same
/// [`AxisSpec`].
#[derive(Clone, Debug)]
pub struct FormFactorTable {
    q_axis: AxisSpec,
    /// `[type, q_index]`.
    atoms: Array2<f64>,
    water: Vec<f64>,
    exv: Vec<f64>,
}

impl FormFactorTable {
    /// Builds a table from caller-supplied curves. `atoms` must have
    /// `q_axis.n` columns; `water` must have `q_axis.n` elements. The exv
    /// curve is taken from `exv_variant`, as it may itself depend on
    /// `c_x` (see [`crate::exv::ExvFormFactor::depends_on_c_x`]).
    pub fn new(
        q_axis: AxisSpec,
        atoms: Array2<f64>,
        water: Vec<f64>,
        exv_variant: &impl ExvFormFactor,
    ) -> Result<Self> {
        if atoms.shape()[1] != q_axis.n {
            return Err(Error::AxisMismatch(format!(
                "atom form-factor curves have {} q-samples, axis has {}",
                atoms.shape()[1],
                q_axis.n
            )));
        }
        if water.len() != q_axis.n {
            return Err(Error::AxisMismatch(format!(
                "water curve has {} q-samples, axis has {}",
                water.len(),
                q_axis.n
            )));
        }
        let exv = exv_variant.form_factor(&q_axis);
        Ok(Self {
            q_axis,
            atoms,
            water,
            exv,
        })
    }

    /// Replaces the excluded-volume curve in place, e.g. after `c_x` changes
    /// for a grid-based exv variant (see
    /// [`crate::exv::ExvFormFactor::depends_on_c_x`]).
    pub fn set_exv_curve(&mut self, exv_variant: &impl ExvFormFactor) {
        self.exv = exv_variant.form_factor(&self.q_axis);
    }

    /// The q-axis every curve in this table is sampled on.
    #[must_use]
    pub const fn q_axis(&self) -> &AxisSpec {
        &self.q_axis
    }

    /// Number of non-reserved atom types.
    #[must_use]
    pub fn num_types(&self) -> usize {
        self.atoms.shape()[0]
    }

    /// `f_i(q)` at the given type and q-sample index.
    #[must_use]
    pub fn atom(&self, type_index: usize, q_index: usize) -> f64 {
        self.atoms[[type_index, q_index]]
    }

    /// `f_w(q)`, the water curve.
    #[must_use]
    pub fn water(&self, q_index: usize) -> f64 {
        self.water[q_index]
    }

    /// `f_x(q)`, the excluded-volume curve.
    #[must_use]
    pub fn exv(&self, q_index: usize) -> f64 {
        self.exv[q_index]
    }

    /// `f_i(q) * f_j(q)`.
    #[must_use]
    pub fn product_aa(&self, i: usize, j: usize, q_index: usize) -> f64 {
        self.atom(i, q_index) * self.atom(j, q_index)
    }

    /// `f_i(q) * f_w(q)`.
    #[must_use]
    pub fn product_aw(&self, i: usize, q_index: usize) -> f64 {
        self.atom(i, q_index) * self.water(q_index)
    }

    /// `f_i(q) * f_x(q)`.
    #[must_use]
    pub fn product_ax(&self, i: usize, q_index: usize) -> f64 {
        self.atom(i, q_index) * self.exv(q_index)
    }

    /// `f_w(q)²`.
    #[must_use]
    pub fn product_ww(&self, q_index: usize) -> f64 {
        self.water(q_index).powi(2)
    }

    /// `f_w(q) * f_x(q)`.
    #[must_use]
    pub fn product_wx(&self, q_index: usize) -> f64 {
        self.water(q_index) * self.exv(q_index)
    }

    /// `f_x(q)²`.
    #[must_use]
    pub fn product_xx(&self, q_index: usize) -> f64 {
        self.exv(q_index).powi(2)
    }
}
