//! Cluster orders: the linear walk produced by density-based subspace
//! clustering.
//!
//! A cluster order is a locality-ordered sequence of data-point references.
//! Each entry carries the reachability value at which the point was reached
//! and the point's local preference vector. The order is read-only input to
//! the hierarchy builder; this module only models it and writes its
//! transcript.
//!
//! ## References
//!
//! Ankerst et al. (1999). "OPTICS: Ordering Points To Identify the
//! Clustering Structure." SIGMOD 1999.

use std::io;

use crate::error::{Error, Result};
use crate::preference::PreferenceVector;

/// One entry of a cluster order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderEntry {
    object_id: usize,
    predecessor: Option<usize>,
    reachability: f64,
    preference: PreferenceVector,
}

impl OrderEntry {
    /// Create an entry.
    ///
    /// The first entry of a walk has no predecessor and infinite
    /// reachability; use [`OrderEntry::start`] for it.
    pub fn new(
        object_id: usize,
        predecessor: usize,
        reachability: f64,
        preference: PreferenceVector,
    ) -> Self {
        Self {
            object_id,
            predecessor: Some(predecessor),
            reachability,
            preference,
        }
    }

    /// Create the starting entry of a walk (no predecessor, infinite
    /// reachability).
    pub fn start(object_id: usize, preference: PreferenceVector) -> Self {
        Self {
            object_id,
            predecessor: None,
            reachability: f64::INFINITY,
            preference,
        }
    }

    /// Identifier of the data point.
    pub fn object_id(&self) -> usize {
        self.object_id
    }

    /// Identifier of the point this one was reached from, if any.
    pub fn predecessor(&self) -> Option<usize> {
        self.predecessor
    }

    /// Reachability value at which the point was reached.
    pub fn reachability(&self) -> f64 {
        self.reachability
    }

    /// The point's local preference vector.
    pub fn preference(&self) -> &PreferenceVector {
        &self.preference
    }
}

/// An ordered sequence of [`OrderEntry`] values over one dataset.
///
/// All entries share the order's dimensionality; [`ClusterOrder::push`]
/// rejects entries that disagree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterOrder {
    dimensionality: usize,
    entries: Vec<OrderEntry>,
}

impl ClusterOrder {
    /// Create an empty order over `dimensionality` dimensions.
    pub fn new(dimensionality: usize) -> Self {
        Self {
            dimensionality,
            entries: Vec::new(),
        }
    }

    /// Append an entry, enforcing the shared dimensionality.
    pub fn push(&mut self, entry: OrderEntry) -> Result<()> {
        let found = entry.preference.dimensionality();
        if found != self.dimensionality {
            return Err(Error::DimensionMismatch {
                expected: self.dimensionality,
                found,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Full dimensionality of the dataset.
    pub fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the order has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries, in walk order.
    pub fn entries(&self) -> &[OrderEntry] {
        &self.entries
    }

    /// Iterate over the entries in walk order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderEntry> {
        self.entries.iter()
    }

    /// Write the raw order transcript to `out`.
    ///
    /// One line per entry: object id, predecessor id (`-` for the walk
    /// start), reachability, then the rendered preference vector. An
    /// optional header block is written verbatim first.
    pub fn write_transcript<W: io::Write>(
        &self,
        out: &mut W,
        header: Option<&[String]>,
    ) -> io::Result<()> {
        if let Some(lines) = header {
            for line in lines {
                writeln!(out, "{line}")?;
            }
        }
        for entry in &self.entries {
            match entry.predecessor {
                Some(pred) => write!(out, "{} {}", entry.object_id, pred)?,
                None => write!(out, "{} -", entry.object_id)?,
            }
            writeln!(out, " {} {}", entry.reachability, entry.preference)?;
        }
        out.flush()
    }
}
