//! Packed point records: the 16-byte, 16-byte-aligned layout the pairwise
//! kernel ([`crate::kernel`]) operates on.
//!
//! Two concrete record kinds exist rather than one generic record with a
//! runtime-tagged payload, following design note #1 ("no inheritance or
//! virtual dispatch is required in the hot path"): which kind a point stream
//! is made of is a compile-time choice of the caller, tied to which kernel
//! functions get called.

use std::mem;

/// A point carrying a scalar weight in its fourth lane. Used for SANS
/// (weight-only, q-independent scattering length) and for the "Simple"
/// excluded-volume point cloud, where every point shares one form factor but
/// differs in weight.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedPoint {
    /// X coordinate, Å.
    pub x: f32,
    /// Y coordinate, Å.
    pub y: f32,
    /// Z coordinate, Å.
    pub z: f32,
    /// Scattering weight. Must be non-negative; combined pairwise by
    /// multiplication.
    pub weight: f32,
}

impl WeightedPoint {
    /// Builds a new weighted point.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, weight: f32) -> Self {
        Self { x, y, z, weight }
    }
}

/// A point carrying a form-factor type index in its fourth lane. Used for
/// X-ray calculations where different atom species have different
/// q-dependent form factors.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormFactorPoint {
    /// X coordinate, Å.
    pub x: f32,
    /// Y coordinate, Å.
    pub y: f32,
    /// Z coordinate, Å.
    pub z: f32,
    /// Index into the shared [`crate::formfactor::FormFactorTable`], in
    /// `[0, T)` where `T` is the number of non-reserved form-factor types.
    pub ff_index: i32,
}

impl FormFactorPoint {
    /// Builds a new form-factor-indexed point.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, ff_index: i32) -> Self {
        Self { x, y, z, ff_index }
    }
}

const _: () = assert!(mem::size_of::<WeightedPoint>() == 16);
const _: () = assert!(mem::align_of::<WeightedPoint>() == 16);
const _: () = assert!(mem::size_of::<FormFactorPoint>() == 16);
const _: () = assert!(mem::align_of::<FormFactorPoint>() == 16);
