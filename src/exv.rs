//! The excluded-volume strategy: a sum type producing the exv form-factor
//! curve `f_x(q)` on demand, rather than a class hierarchy (design note #3).
//!
//! Four variants exist, matching spec.md §4.3's table. `Grid` and
//! `GridSurface` consume their voxel occupancy summary through a narrow,
//! caller-supplied interface (building that summary is a hydration/grid
//! collaborator's job and stays out of this crate's scope, per spec.md §1).

use crate::axis::AxisSpec;
use enum_dispatch::enum_dispatch;
use std::f64::consts::PI;

/// Behaviour every excluded-volume variant implements.
#[enum_dispatch]
pub trait ExvFormFactor {
    /// The exv radial form factor `f_x(q)` sampled over `q_axis`.
    fn form_factor(&self, q_axis: &AxisSpec) -> Vec<f64>;

    /// Whether `f_x(q)` itself depends on `c_x` (true for the grid
    /// variants, whose effective voxel spacing is scaled by `c_x`). When
    /// true, [`crate::intensity::CachedIntensity`]'s `ax`/`xx`/`wx` curves
    /// must be recomputed whenever `c_x` changes; only the `c_w` sweep
    /// stays free.
    fn depends_on_c_x(&self) -> bool {
        false
    }
}

/// Gaussian-sphere form factor of volume `v`: `f_x(q) = v * exp(-v^(2/3) q² /
/// (4π))`, the standard CRYSOL-style excluded-volume dummy-atom form factor.
fn gaussian_sphere(volume: f64, q: f64) -> f64 {
    volume * (-volume.powf(2.0 / 3.0) * q * q / (4.0 * PI)).exp()
}

/// One shared Gaussian with volume equal to the average atomic volume
/// (spec.md §4.3: "average").
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AverageExv {
    /// Shared Gaussian volume, Å³. Defaults to
    /// [`crate::constants::AVERAGE_ATOMIC_VOLUME`].
    pub volume: f64,
}

impl Default for AverageExv {
    fn default() -> Self {
        Self {
            volume: crate::constants::AVERAGE_ATOMIC_VOLUME,
        }
    }
}

impl ExvFormFactor for AverageExv {
    fn form_factor(&self, q_axis: &AxisSpec) -> Vec<f64> {
        q_axis.values().into_iter().map(|q| gaussian_sphere(self.volume, q)).collect()
    }
}

/// One Gaussian per atom type, population-weighted into a single effective
/// curve (spec.md §4.3: "explicit").
#[derive(Clone, Debug, PartialEq)]
pub struct ExplicitExv {
    /// `(volume, population count)` for each non-reserved form-factor type.
    pub per_type: Vec<(f64, f64)>,
}

impl ExvFormFactor for ExplicitExv {
    fn form_factor(&self, q_axis: &AxisSpec) -> Vec<f64> {
        let total: f64 = self.per_type.iter().map(|(_, count)| count).sum();
        if total <= 0.0 {
            return vec![0.0; q_axis.n];
        }
        q_axis
            .values()
            .into_iter()
            .map(|q| {
                self.per_type
                    .iter()
                    .map(|&(volume, count)| count * gaussian_sphere(volume, q))
                    .sum::<f64>()
                    / total
            })
            .collect()
    }
}

/// A sinc-like factor derived from a voxelised occupancy map (spec.md §4.3:
/// "grid"). The map itself is built by a hydration/grid collaborator; this
/// type only consumes its summary (occupied voxel count and voxel volume).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridExv {
    /// Volume of one voxel, Å³.
    pub voxel_volume: f64,
    /// Number of voxels marked occupied by the grid collaborator.
    pub occupied_voxels: usize,
}

impl ExvFormFactor for GridExv {
    fn form_factor(&self, q_axis: &AxisSpec) -> Vec<f64> {
        let volume = self.voxel_volume * self.occupied_voxels as f64;
        q_axis.values().into_iter().map(|q| gaussian_sphere(volume, q)).collect()
    }

    fn depends_on_c_x(&self) -> bool {
        true
    }
}

/// Voxel-to-surface-atom conversion the original implementation marks as
/// unimplemented (spec.md §9's second open question). Kept as an explicit,
/// clearly-stubbed collaborator interface: [`GridSurfaceExv`] falls back to
/// the plain grid curve whenever no population has been supplied.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceAtomPopulation {
    /// Number of atoms the (currently unimplemented) conversion identifies
    /// as solvent-exposed.
    pub count: usize,
    /// Average excluded volume attributed to one surface atom, Å³.
    pub volume_per_atom: f64,
}

/// Grid variant augmented with a separate surface-atom population
/// (spec.md §4.3: "grid-surface").
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSurfaceExv {
    /// The underlying voxel occupancy, as in [`GridExv`].
    pub grid: GridExv,
    /// Surface population, if the (stubbed) conversion has supplied one.
    pub surface: Option<SurfaceAtomPopulation>,
}

impl ExvFormFactor for GridSurfaceExv {
    fn form_factor(&self, q_axis: &AxisSpec) -> Vec<f64> {
        let base = self.grid.form_factor(q_axis);
        let Some(surface) = self.surface else {
            return base;
        };
        let surface_volume = surface.count as f64 * surface.volume_per_atom;
        q_axis
            .values()
            .into_iter()
            .zip(base)
            .map(|(q, base_f)| base_f + gaussian_sphere(surface_volume, q))
            .collect()
    }

    fn depends_on_c_x(&self) -> bool {
        true
    }
}

/// The excluded-volume strategy sum type (design note #3).
#[enum_dispatch(ExvFormFactor)]
#[derive(Clone, Debug)]
pub enum ExvVariant {
    /// See [`AverageExv`].
    Average(AverageExv),
    /// See [`ExplicitExv`].
    Explicit(ExplicitExv),
    /// See [`GridExv`].
    Grid(GridExv),
    /// See [`GridSurfaceExv`].
    GridSurface(GridSurfaceExv),
}

impl Default for ExvVariant {
    fn default() -> Self {
        Self::Average(AverageExv::default())
    }
}
