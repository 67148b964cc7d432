//! The crate's catch-all error type.
//!
//! The kernel and the inner accumulation loops are infallible by
//! construction (no allocation, no I/O); every [`Error`] originates either at
//! construction time (axis/shape checks) or at a parameter setter
//! ([`crate::composite::CompositeHistogram::apply_water_scaling`] and
//! friends).

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A [`crate::composite::CompositeHistogram`] and a
    /// [`crate::formfactor::FormFactorTable`] (or [`crate::sinc::SincTable`])
    /// were built for different axes.
    #[error("axis mismatch: {0}")]
    AxisMismatch(String),
    /// An atom carried an (element, residue, atom name) triple this crate
    /// has no form factor for.
    #[error(
        "unrecognised form factor for (element={element:?}, residue={residue:?}, atom={atom:?})"
    )]
    UnknownFormFactor {
        /// Element symbol, e.g. `"C"`.
        element: String,
        /// Residue name, e.g. `"ALA"`.
        residue: String,
        /// Atom name, e.g. `"CA"`.
        atom: String,
    },
    /// A computed distance exceeded the r-axis upper bound of a fixed
    /// (non-dynamic) histogram.
    #[error("distance {distance} exceeds the fixed r-axis upper bound {bound}")]
    BinOverflow {
        /// The offending distance, in Å.
        distance: f32,
        /// The r-axis upper bound, in Å.
        bound: f32,
    },
    /// `c_w` or `c_x` was set to a NaN or negative value.
    #[error("invalid scaling parameter {name}: {value} (must be finite and non-negative)")]
    InvalidScaling {
        /// `"c_w"` or `"c_x"`.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Any other error, e.g. raised by a collaborator feeding this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
