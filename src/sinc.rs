//! The sinc table: `s(q, r) = sin(q·r) / (q·r)`, with `s(q, 0) = 1`,
//! precomputed once over the full (q-axis, r-axis) grid and shared
//! read-only across every [`crate::composite::CompositeHistogram`] built on
//! the same two axes.
//!
//! Callers that need to share one table across threads or evaluations
//! should wrap it in an `Arc` — this type has no internal synchronization of
//! its own, matching spec.md §5 ("immutable after construction; shared
//! freely").

use crate::axis::AxisSpec;
use ndarray::{Array2, ArrayView1};

/// A dense `Q x R` table of `sin(q·r)/(q·r)` values.
#[derive(Clone, Debug)]
pub struct SincTable {
    q_axis: AxisSpec,
    r_axis: AxisSpec,
    table: Array2<f32>,
}

impl SincTable {
    /// Builds the table for the given q-axis and r-axis.
    #[must_use]
    pub fn new(q_axis: AxisSpec, r_axis: AxisSpec) -> Self {
        let q_vals = q_axis.values();
        let r_vals = r_axis.values();
        let mut table = Array2::zeros((q_axis.n, r_axis.n));
        for (qi, &q) in q_vals.iter().enumerate() {
            for (ri, &r) in r_vals.iter().enumerate() {
                let qr = q * r;
                table[[qi, ri]] = if qr.abs() < 1e-12 {
                    1.0
                } else {
                    (qr.sin() / qr) as f32
                };
            }
        }
        Self {
            q_axis,
            r_axis,
            table,
        }
    }

    /// The q-axis this table was built for.
    #[must_use]
    pub const fn q_axis(&self) -> &AxisSpec {
        &self.q_axis
    }

    /// The r-axis (distance bins) this table was built for.
    #[must_use]
    pub const fn r_axis(&self) -> &AxisSpec {
        &self.r_axis
    }

    /// `sin(q·r)/(q·r)` at the given q-point and r-bin indices.
    #[must_use]
    pub fn get(&self, q_index: usize, r_index: usize) -> f32 {
        self.table[[q_index, r_index]]
    }

    /// The full sinc curve over `r` at a fixed q-point, used to dot with a
    /// distance-histogram row when evaluating the Debye sum.
    #[must_use]
    pub fn row(&self, q_index: usize) -> ArrayView1<f32> {
        self.table.row(q_index)
    }
}
