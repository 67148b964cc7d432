//! Physical constants used to seed default excluded-volume and form-factor
//! parameters.
//!
//! Grounded in `original_source/source/data/constants.h`: residue volumes are
//! taken from Zamyatnin, *The amino acid composition of human and some other
//! proteins*, and are used only to seed [`crate::exv::ExvVariant::Explicit`]
//! and [`crate::exv::ExvVariant::Average`] when a caller does not supply its
//! own Gaussian widths.

/// The classical electron radius, in Å. Ties a form factor expressed in
/// electron units to an intensity in physical units; the core engine never
/// multiplies by it internally (form factors are taken to already be in the
/// caller's chosen units), it is exposed purely for convenience.
pub const ELECTRON_RADIUS: f64 = 0.0000281794;

/// Average volume of a non-hydrogen protein atom, in Å³. Seeds the single
/// shared Gaussian of [`crate::exv::ExvVariant::Average`].
pub const AVERAGE_ATOMIC_VOLUME: f64 = 13.93;

/// Per-residue side-chain + backbone volumes, in Å³, keyed by the three-letter
/// residue code. Seeds [`crate::exv::ExvVariant::Explicit`].
pub const RESIDUE_VOLUME: &[(&str, f64)] = &[
    ("GLY", 66.4),
    ("ALA", 91.5),
    ("VAL", 141.7),
    ("LEU", 167.9),
    ("ILE", 168.8),
    ("PHE", 203.5),
    ("TYR", 203.6),
    ("TRP", 237.6),
    ("ASP", 113.6),
    ("GLU", 140.6),
    ("SER", 99.1),
    ("THR", 122.1),
    ("ASN", 135.2),
    ("GLN", 161.1),
    ("LYS", 176.2),
    ("ARG", 180.8),
    ("HIS", 167.3),
    ("MET", 170.8),
    ("CYS", 105.6),
    ("PRO", 129.3),
];

/// Looks up the volume of a three-letter residue code, in Å³.
#[must_use]
pub fn residue_volume(residue: &str) -> Option<f64> {
    RESIDUE_VOLUME
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(residue))
        .map(|(_, volume)| *volume)
}

#[cfg(test)]
mod tests {
    use super::residue_volume;

    #[test]
    fn known_residue() {
        assert_eq!(residue_volume("GLY"), Some(66.4));
        assert_eq!(residue_volume("gly"), Some(66.4));
    }

    #[test]
    fn unknown_residue() {
        assert_eq!(residue_volume("XYZ"), None);
    }
}
