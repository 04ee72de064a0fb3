//! Refinement hierarchies of axis-parallel subspace clusters.
//!
//! # The Core Structure
//!
//! Subspace clusters are ordered by **refinement**: cluster `b` refines
//! cluster `a` when `b`'s preference vector strictly contains `a`'s. A
//! point can belong to several clusters along one refinement path, and one
//! refinement can be reached from several coarser clusters, so the result
//! is a rooted DAG rather than a tree:
//!
//! ```text
//!              root (full space)
//!               /            \
//!        {axis 0}           {axis 1}
//!               \            /
//!             {axes 0 and 1}
//! ```
//!
//! The hierarchy is stored as an arena ([`ClusterHierarchy`]) whose edges
//! are [`ClusterId`] indices; cluster identity follows preference-vector
//! content, which is what makes the convergent merge above well-defined.
//!
//! # Module Overview
//!
//! - [`HierarchyBuilder`]: extracts the DAG from a cluster order
//! - [`Cluster`]: one node — vector, members, edges, level bookkeeping
//! - [`ClusterHierarchy`]: the arena plus deterministic traversal
//! - [`validate_hierarchy`]: structural health check for built DAGs
//!
//! ## References
//!
//! Achtert et al. (2007). "Detection and Visualization of Subspace Cluster
//! Hierarchies." DASFAA 2007.

mod builder;
mod cluster;
mod hierarchy;
mod validate;

pub use builder::HierarchyBuilder;
pub use cluster::{Cluster, ClusterId};
pub use hierarchy::ClusterHierarchy;
pub use validate::{
    validate_hierarchy, Severity, ValidationIssue, ValidationReport,
};
