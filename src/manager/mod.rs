//! The histogram manager: turns a [`Molecule`] into packed point clouds, one
//! per body, and schedules pairwise evaluation across a rayon thread pool,
//! producing one [`PartitionedHistogram`] via a `K x K` per-body-pair
//! partial matrix (spec.md §4.6/§5).
//!
//! Partials are memoised: [`HistogramManager::evaluate`] only recomputes the
//! `(a, b)` cells touching a body marked dirty since the last call, then
//! re-merges the full matrix. This is what makes
//! [`HistogramManager::evaluate_incremental`] cheap for a single moved body
//! in an otherwise static molecule.

pub mod partial;

use crate::axis::AxisSpec;
use crate::error::Result;
use crate::histogram::{OverflowPolicy, PartitionedHistogram};
use crate::molecule::{resolve_form_factor_index, Body, Molecule, RigidTransform};
use crate::point::{FormFactorPoint, WeightedPoint};
use partial::{pair_partial, BodyPoints};
use rayon::prelude::*;

/// A body's asymmetric-unit point cloud plus its symmetry transforms. Only
/// the base copy (`transforms[0]`, conventionally the identity) is ever
/// packed and stored; the remaining copies are generated on demand — see
/// [`symmetric_self_partial`] and [`expand_body_points`] — so memory cost
/// never scales with `K`.
struct PackedBody {
    base: BodyPoints,
    transforms: Vec<RigidTransform>,
}

/// Packs one body's atoms and waters, positioned by its symmetry group's
/// base transform, into point clouds. `include_exv` controls whether an
/// excluded-volume pseudo-point is generated colocated with each atom: the
/// `average`/`explicit` exv variants want exactly that, but a caller using
/// [`crate::exv::ExvVariant`] to mean "no excluded-volume correction" should
/// pass `false` so `ax`/`xx`/`wx` stay identically zero.
fn pack_body(body: &Body, known_elements: &[&str], include_exv: bool) -> Result<PackedBody> {
    let base_transform = &body.symmetry.transforms[0];
    let mut points = BodyPoints::default();
    for atom in &body.atoms {
        let ff_index = resolve_form_factor_index(atom, known_elements)?;
        let (x, y, z) = base_transform.apply((atom.x, atom.y, atom.z));
        points.atoms.push(FormFactorPoint::new(x as f32, y as f32, z as f32, ff_index as i32));
        points.atom_weights.push(atom.occupancy as f32);
        if include_exv {
            points.exv.push(WeightedPoint::new(x as f32, y as f32, z as f32, atom.occupancy as f32));
        }
    }
    for water in &body.waters {
        let (x, y, z) = base_transform.apply((water.x, water.y, water.z));
        points.waters.push(WeightedPoint::new(x as f32, y as f32, z as f32, water.occupancy as f32));
    }
    Ok(PackedBody {
        base: points,
        transforms: body.symmetry.transforms.clone(),
    })
}

/// Re-applies `transform` to every point in `base`, producing the point
/// cloud of one symmetry mate without touching the others.
fn transform_body_points(base: &BodyPoints, transform: &RigidTransform) -> BodyPoints {
    let map_atom = |p: FormFactorPoint| {
        let (x, y, z) = transform.apply((f64::from(p.x), f64::from(p.y), f64::from(p.z)));
        FormFactorPoint::new(x as f32, y as f32, z as f32, p.ff_index)
    };
    let map_weighted = |p: WeightedPoint| {
        let (x, y, z) = transform.apply((f64::from(p.x), f64::from(p.y), f64::from(p.z)));
        WeightedPoint::new(x as f32, y as f32, z as f32, p.weight)
    };
    BodyPoints {
        atoms: base.atoms.iter().copied().map(map_atom).collect(),
        atom_weights: base.atom_weights.clone(),
        waters: base.waters.iter().copied().map(map_weighted).collect(),
        exv: base.exv.iter().copied().map(map_weighted).collect(),
    }
}

/// Materialises every symmetry copy of `base`, concatenated into one point
/// cloud. Used only transiently, for the cross-body term of a pair where the
/// other body is not itself symmetric (so the group-structure reduction in
/// [`symmetric_self_partial`] does not apply) — never stored permanently.
fn expand_body_points(base: &BodyPoints, transforms: &[RigidTransform]) -> BodyPoints {
    let mut out = BodyPoints::default();
    for transform in transforms {
        let mate = transform_body_points(base, transform);
        out.atoms.extend(mate.atoms);
        out.atom_weights.extend(mate.atom_weights);
        out.waters.extend(mate.waters);
        out.exv.extend(mate.exv);
    }
    out
}

/// Computes the full self-pair partial histogram of a `K`-fold symmetric
/// body without ever materialising all `K` copies (spec.md §4.6):
///
/// - Every copy's internal pairwise histogram is identical by rigid-body
///   congruence, so the self term contributes `K * self_hist(base)`.
/// - The cross-histogram between copy `u` and copy `v` depends only on their
///   relative transform (pairwise distance is rigid-transform invariant), and
///   for a genuine symmetry group each non-identity relative transform `g` is
///   realised by exactly `K` ordered copy pairs. Summed over unordered pairs
///   that is `(K / 2) * Σ_{g != e} cross_hist(base, g(base))`.
///
/// This needs only ever two point-cloud copies in memory at once (the base
/// and one transformed mate), and `K - 1` cross-histograms instead of
/// `K(K-1)/2`.
fn symmetric_self_partial(
    base: &BodyPoints,
    transforms: &[RigidTransform],
    num_types: usize,
    num_bins: usize,
    inv_bin_width: f32,
    overflow: OverflowPolicy,
) -> Result<PartitionedHistogram> {
    let k = transforms.len() as f64;
    let mut total = PartitionedHistogram::zeros(num_types, num_bins);

    let self_hist = pair_partial(base, base, true, num_types, num_bins, inv_bin_width, overflow)?;
    total.merge_scaled(&self_hist, k);

    for transform in &transforms[1..] {
        let mate = transform_body_points(base, transform);
        let cross = pair_partial(base, &mate, false, num_types, num_bins, inv_bin_width, overflow)?;
        total.merge_scaled(&cross, k / 2.0);
    }
    Ok(total)
}

/// Computes one body-pair's contribution, dispatching to the symmetry-aware
/// same-body reduction when the body has internal symmetry, or (for a
/// cross-body pair touching a symmetric body) transiently expanding that
/// body's copies — see [`expand_body_points`] — since the group-structure
/// shortcut only applies to a body's self-pairs, not to cross terms against
/// an independent body.
fn pair_contribution(
    a: &PackedBody,
    b: &PackedBody,
    same_body: bool,
    num_types: usize,
    num_bins: usize,
    inv_bin_width: f32,
    overflow: OverflowPolicy,
) -> Result<PartitionedHistogram> {
    if same_body {
        return if a.transforms.len() <= 1 {
            pair_partial(&a.base, &a.base, true, num_types, num_bins, inv_bin_width, overflow)
        } else {
            symmetric_self_partial(&a.base, &a.transforms, num_types, num_bins, inv_bin_width, overflow)
        };
    }

    if a.transforms.len() <= 1 && b.transforms.len() <= 1 {
        return pair_partial(&a.base, &b.base, false, num_types, num_bins, inv_bin_width, overflow);
    }
    let a_expanded = if a.transforms.len() > 1 { expand_body_points(&a.base, &a.transforms) } else { a.base.clone() };
    let b_expanded = if b.transforms.len() > 1 { expand_body_points(&b.base, &b.transforms) } else { b.base.clone() };
    pair_partial(&a_expanded, &b_expanded, false, num_types, num_bins, inv_bin_width, overflow)
}

/// Triangular (`a <= b`) index into the `K x K` partial matrix, stored as a
/// flat `Vec` to avoid a jagged `Vec<Vec<_>>`.
fn triangular_index(a: usize, b: usize, k: usize) -> usize {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    a * k - a * (a.saturating_sub(1)) / 2 - a + b
}

/// Owns one [`PackedBody`] per body and a cache of per-body-pair partial
/// histograms.
pub struct HistogramManager {
    r_axis: AxisSpec,
    num_types: usize,
    overflow: OverflowPolicy,
    include_exv: bool,
    bodies: Vec<PackedBody>,
    partials: Vec<Option<PartitionedHistogram>>,
    dirty: Vec<bool>,
}

impl HistogramManager {
    /// Packs `molecule` against `known_elements` (the ordered list of
    /// non-reserved form-factor type names) into a fresh manager, with
    /// every body initially marked dirty. `include_exv` selects whether an
    /// excluded-volume pseudo-point cloud is built alongside the atoms (see
    /// [`pack_body`]) — pass `false` when the caller's
    /// [`crate::exv::ExvVariant`] contributes no correction at all.
    pub fn new(
        molecule: &Molecule,
        known_elements: &[&str],
        r_axis: AxisSpec,
        overflow: OverflowPolicy,
        include_exv: bool,
    ) -> Result<Self> {
        let bodies = molecule
            .bodies
            .iter()
            .map(|b| pack_body(b, known_elements, include_exv))
            .collect::<Result<Vec<_>>>()?;
        let k = bodies.len();
        let num_pairs = k * (k + 1) / 2;
        Ok(Self {
            r_axis,
            num_types: known_elements.len(),
            overflow,
            include_exv,
            bodies,
            partials: vec![None; num_pairs],
            dirty: vec![true; k],
        })
    }

    /// Number of bodies.
    #[must_use]
    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Repacks `body_id` from new input geometry (e.g. after a rigid-body
    /// move) and marks it dirty. Atom count, order and form-factor types
    /// must stay unchanged; only positions/weights/symmetry may differ.
    pub fn replace_body(&mut self, body_id: usize, body: &Body, known_elements: &[&str]) -> Result<()> {
        self.bodies[body_id] = pack_body(body, known_elements, self.include_exv)?;
        self.mark_body_dirty(body_id);
        Ok(())
    }

    /// Marks `body_id`'s geometry as changed, invalidating every cached
    /// partial that involves it.
    pub fn mark_body_dirty(&mut self, body_id: usize) {
        let k = self.bodies.len();
        self.dirty[body_id] = true;
        for other in 0..k {
            let idx = triangular_index(body_id, other, k);
            self.partials[idx] = None;
        }
    }

    /// Recomputes every invalidated partial (in parallel) and merges the
    /// full `K x K` matrix into one [`PartitionedHistogram`]. Partials left
    /// over from a previous call that are still valid are reused unchanged.
    pub fn evaluate(&mut self) -> Result<PartitionedHistogram> {
        let k = self.bodies.len();
        let inv_bin_width = self.r_axis.inv_step() as f32;
        let num_bins = self.r_axis.n;
        let num_types = self.num_types;
        let overflow = self.overflow;

        let missing: Vec<(usize, usize)> = (0..k)
            .flat_map(|a| (a..k).map(move |b| (a, b)))
            .filter(|&(a, b)| self.partials[triangular_index(a, b, k)].is_none())
            .collect();

        let bodies = &self.bodies;
        let computed: Vec<((usize, usize), Result<PartitionedHistogram>)> = missing
            .into_par_iter()
            .map(|(a, b)| {
                let result =
                    pair_contribution(&bodies[a], &bodies[b], a == b, num_types, num_bins, inv_bin_width, overflow);
                ((a, b), result)
            })
            .collect();

        for ((a, b), result) in computed {
            let idx = triangular_index(a, b, k);
            self.partials[idx] = Some(result?);
        }
        self.dirty.iter_mut().for_each(|d| *d = false);

        let mut total = PartitionedHistogram::zeros(num_types, num_bins);
        for a in 0..k {
            for b in a..k {
                let idx = triangular_index(a, b, k);
                if let Some(partial) = &self.partials[idx] {
                    total.merge(partial);
                }
            }
        }
        Ok(total)
    }

    /// Marks every body in `dirty_bodies` dirty, then calls
    /// [`Self::evaluate`]. Bodies not listed keep their cached partials, so
    /// cost scales with the number of pairs touching a changed body, not
    /// with the total number of bodies.
    pub fn evaluate_incremental(&mut self, dirty_bodies: &[usize]) -> Result<PartitionedHistogram> {
        for &id in dirty_bodies {
            self.mark_body_dirty(id);
        }
        self.evaluate()
    }
}
