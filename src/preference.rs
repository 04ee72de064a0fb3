//! Preference vectors: which dimensions define a subspace cluster.
//!
//! A preference vector is a fixed-width bitset over the full dimensionality
//! `D` of the dataset. Bit `i` set means dimension `i` is constrained, i.e.
//! part of the subspace the cluster lives in. The fully unconstrained vector
//! (no bits set) denotes the full-space cluster at the top of a hierarchy.
//!
//! The subset relation between vectors induces the refinement partial order
//! used by the hierarchy builder:
//!
//! ```text
//! Vector      │ Subspace            │ Level (popcount)
//! ────────────┼─────────────────────┼─────────────────
//! 0, 0, 0     │ full space          │ 0
//! 1, 0, 0     │ axis 0              │ 1
//! 1, 1, 0     │ axes 0 and 1        │ 2
//! ```
//!
//! ## References
//!
//! Achtert et al. (2007). "Detection and Visualization of Subspace Cluster
//! Hierarchies." DASFAA 2007.

use core::cmp::Ordering;
use core::fmt;

use fixedbitset::FixedBitSet;

/// A fixed-width bitset over dataset dimensions marking which dimensions
/// constrain a subspace cluster.
///
/// Equality and hashing follow bit content, so two vectors with the same
/// constrained dimensions are interchangeable as identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreferenceVector {
    bits: FixedBitSet,
}

impl PreferenceVector {
    /// Create a fully unconstrained vector over `dimensionality` dimensions.
    pub fn unconstrained(dimensionality: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(dimensionality),
        }
    }

    /// Create a vector constraining the given dimensions.
    ///
    /// # Panics
    ///
    /// Panics if any dimension index is `>= dimensionality`.
    pub fn from_dims(dimensionality: usize, dims: &[usize]) -> Self {
        let mut bits = FixedBitSet::with_capacity(dimensionality);
        for &dim in dims {
            assert!(
                dim < dimensionality,
                "dimension {dim} out of range for dimensionality {dimensionality}"
            );
            bits.insert(dim);
        }
        Self { bits }
    }

    /// Full dimensionality `D` this vector ranges over.
    pub fn dimensionality(&self) -> usize {
        self.bits.len()
    }

    /// Number of constrained dimensions (popcount).
    pub fn level(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Whether no dimension is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.level() == 0
    }

    /// Whether dimension `dim` is constrained.
    pub fn constrains(&self, dim: usize) -> bool {
        self.bits.contains(dim)
    }

    /// Constrain dimension `dim`.
    ///
    /// # Panics
    ///
    /// Panics if `dim >= dimensionality`.
    pub fn constrain(&mut self, dim: usize) {
        assert!(
            dim < self.dimensionality(),
            "dimension {dim} out of range for dimensionality {}",
            self.dimensionality()
        );
        self.bits.insert(dim);
    }

    /// Iterate over the constrained dimensions in ascending order.
    pub fn dims(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.ones()
    }

    /// Whether every dimension constrained here is also constrained in
    /// `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.bits.is_subset(&other.bits)
    }

    /// Whether `other` constrains strictly more dimensions than `self` while
    /// covering all of `self`'s.
    pub fn is_strict_subset_of(&self, other: &Self) -> bool {
        self.bits.is_subset(&other.bits) && self.bits != other.bits
    }

    /// Whether `self` constrains strictly more dimensions than `other` while
    /// covering all of `other`'s.
    pub fn is_strict_superset_of(&self, other: &Self) -> bool {
        other.is_strict_subset_of(self)
    }

    /// Dimensionality-aware rendering: one `1`/`0` per dimension,
    /// comma-separated, in dimension order.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.dimensionality() * 3);
        for dim in 0..self.dimensionality() {
            if dim > 0 {
                out.push_str(", ");
            }
            out.push(if self.constrains(dim) { '1' } else { '0' });
        }
        out
    }

    /// Stable, path-safe identifier derived from the vector content.
    ///
    /// The unconstrained vector maps to `cluster_root`; any other vector
    /// maps to `cluster_l{level}` followed by `_d{dim}` for each constrained
    /// dimension. Vector identity is unique per cluster after merging, so
    /// the identifier is unique within a hierarchy and reproducible across
    /// builds from the same order.
    pub fn identifier(&self) -> String {
        if self.is_unconstrained() {
            return "cluster_root".to_string();
        }
        let mut id = format!("cluster_l{}", self.level());
        for dim in self.dims() {
            id.push_str(&format!("_d{dim}"));
        }
        id
    }
}

impl fmt::Display for PreferenceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

// Total order used wherever child or parent lists must be deterministic:
// coarser vectors first, ties broken by the ascending dimension lists.
impl Ord for PreferenceVector {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level()
            .cmp(&other.level())
            .then_with(|| self.bits.ones().cmp(other.bits.ones()))
    }
}

impl PartialOrd for PreferenceVector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
