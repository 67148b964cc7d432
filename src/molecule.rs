//! External input types: the caller-facing shape of a molecule, independent
//! of the packed point records [`crate::manager`] turns it into.
//!
//! Parsing a structure file into these types (PDB/mmCIF, hydration placement,
//! a real Cromer-Mann form-factor table) is a collaborator's job and stays
//! out of this crate's scope; this module only defines the narrow interface
//! that collaborator feeds into [`crate::manager::HistogramManager`].

use crate::error::{Error, Result};

/// One heavy (non-water) atom.
#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    /// X coordinate, Å.
    pub x: f64,
    /// Y coordinate, Å.
    pub y: f64,
    /// Z coordinate, Å.
    pub z: f64,
    /// Scattering occupancy/weight, typically in `(0, 1]`.
    pub occupancy: f64,
    /// Element symbol, e.g. `"C"`.
    pub element: String,
    /// Residue name, e.g. `"ALA"`.
    pub residue: String,
    /// Atom name within the residue, e.g. `"CA"`.
    pub name: String,
}

/// One water oxygen (or other single-site solvent point).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Water {
    /// X coordinate, Å.
    pub x: f64,
    /// Y coordinate, Å.
    pub y: f64,
    /// Z coordinate, Å.
    pub z: f64,
    /// Scattering occupancy/weight.
    pub occupancy: f64,
}

/// A rigid rotation + translation, used to replicate a body under
/// crystallographic or point-group symmetry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidTransform {
    /// Row-major 3x3 rotation matrix.
    pub rotation: [[f64; 3]; 3],
    /// Translation vector, Å.
    pub translation: [f64; 3],
}

impl RigidTransform {
    /// The identity transform.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0, 0.0, 0.0],
        }
    }

    /// Applies this transform to a point.
    #[must_use]
    pub fn apply(&self, p: (f64, f64, f64)) -> (f64, f64, f64) {
        let r = self.rotation;
        (
            r[0][0] * p.0 + r[0][1] * p.1 + r[0][2] * p.2 + self.translation[0],
            r[1][0] * p.0 + r[1][1] * p.1 + r[1][2] * p.2 + self.translation[1],
            r[2][0] * p.0 + r[2][1] * p.1 + r[2][2] * p.2 + self.translation[2],
        )
    }

    /// Whether this transform is the identity (within `epsilon`), used by
    /// [`crate::manager::HistogramManager`] to skip replicating a body that
    /// has no real symmetry mates.
    #[must_use]
    pub fn is_identity(&self, epsilon: f64) -> bool {
        let ident = Self::identity();
        self.translation.iter().zip(&ident.translation).all(|(a, b)| (a - b).abs() < epsilon)
            && self
                .rotation
                .iter()
                .flatten()
                .zip(ident.rotation.iter().flatten())
                .all(|(a, b)| (a - b).abs() < epsilon)
    }
}

/// A body's symmetry group: the set of rigid transforms that generate its
/// symmetry mates, always including at least the identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Symmetry {
    /// Every transform, including the identity.
    pub transforms: Vec<RigidTransform>,
}

impl Symmetry {
    /// No symmetry: a single identity transform.
    #[must_use]
    pub fn trivial() -> Self {
        Self {
            transforms: vec![RigidTransform::identity()],
        }
    }

    /// Whether this symmetry is just the identity.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.transforms.len() == 1 && self.transforms[0].is_identity(1e-9)
    }
}

impl Default for Symmetry {
    fn default() -> Self {
        Self::trivial()
    }
}

/// One independently-movable unit: a set of atoms and waters, replicated by
/// its own [`Symmetry`].
#[derive(Clone, Debug, Default)]
pub struct Body {
    /// Heavy atoms belonging to this body.
    pub atoms: Vec<Atom>,
    /// Waters belonging to this body.
    pub waters: Vec<Water>,
    /// This body's symmetry group.
    pub symmetry: Symmetry,
}

/// A full molecule: an ordered collection of bodies.
#[derive(Clone, Debug, Default)]
pub struct Molecule {
    /// Every body, in a stable order matching
    /// [`crate::manager::HistogramManager`]'s body index space.
    pub bodies: Vec<Body>,
}

impl Molecule {
    /// Total number of heavy atoms across every body (symmetry mates
    /// excluded — this counts the asymmetric unit only).
    #[must_use]
    pub fn num_atoms(&self) -> usize {
        self.bodies.iter().map(|b| b.atoms.len()).sum()
    }

    /// Total number of waters across every body (asymmetric unit only).
    #[must_use]
    pub fn num_waters(&self) -> usize {
        self.bodies.iter().map(|b| b.waters.len()).sum()
    }
}

/// Resolves an atom's (element, residue, atom name) into a form-factor type
/// index by exact, case-sensitive element match against `known_elements`.
/// Finer-grained typing (element + hybridisation, united-atom grouping) is a
/// collaborator concern; this is the narrow interface this crate needs.
pub fn resolve_form_factor_index(atom: &Atom, known_elements: &[&str]) -> Result<usize> {
    known_elements.iter().position(|&e| e == atom.element).ok_or_else(|| Error::UnknownFormFactor {
        element: atom.element.clone(),
        residue: atom.residue.clone(),
        atom: atom.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_a_no_op() {
        let t = RigidTransform::identity();
        assert_eq!(t.apply((1.0, 2.0, 3.0)), (1.0, 2.0, 3.0));
        assert!(t.is_identity(1e-12));
    }

    #[test]
    fn trivial_symmetry_is_identity_only() {
        assert!(Symmetry::trivial().is_trivial());
    }

    #[test]
    fn resolve_known_and_unknown_elements() {
        let atom = Atom {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            occupancy: 1.0,
            element: "C".into(),
            residue: "ALA".into(),
            name: "CA".into(),
        };
        assert_eq!(resolve_form_factor_index(&atom, &["N", "C", "O"]).unwrap(), 1);
        let unknown = Atom {
            element: "Se".into(),
            ..atom
        };
        let err = resolve_form_factor_index(&unknown, &["N", "C", "O"]).unwrap_err();
        assert!(matches!(err, Error::UnknownFormFactor { .. }));
    }

    #[test]
    fn molecule_counts_atoms_and_waters() {
        let molecule = Molecule {
            bodies: vec![
                Body {
                    atoms: vec![
                        Atom {
                            x: 0.0,
                            y: 0.0,
                            z: 0.0,
                            occupancy: 1.0,
                            element: "C".into(),
                            residue: "ALA".into(),
                            name: "CA".into(),
                        };
                        3
                    ],
                    waters: vec![Water { x: 0.0, y: 0.0, z: 0.0, occupancy: 1.0 }],
                    symmetry: Symmetry::trivial(),
                },
                Body::default(),
            ],
        };
        assert_eq!(molecule.num_atoms(), 3);
        assert_eq!(molecule.num_waters(), 1);
    }
}
