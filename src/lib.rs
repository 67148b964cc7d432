#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! Distance-histogram and Debye-transform engine for small-angle X-ray and
//! neutron scattering profiles.
//!
//! Turns a set of 3D points (atoms, waters, excluded-volume pseudo-atoms)
//! into a form-factor-partitioned pairwise distance histogram, and that
//! histogram into `I(q)` via the Debye sum. See [`manager::HistogramManager`]
//! for the entry point.

pub mod axis;
pub mod composite;
pub mod constants;
pub mod error;
pub mod exv;
pub mod formfactor;
pub mod histogram;
pub mod intensity;
pub mod kernel;
pub mod manager;
pub mod molecule;
pub mod point;
pub mod sinc;

pub use error::{Error, Result};
