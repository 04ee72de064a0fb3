//! # axil
//!
//! Extraction and persistence of hierarchical axis-parallel subspace
//! clusters from density-based cluster orders.
//!
//! The upstream algorithm walks the dataset and emits a **cluster order**:
//! each point annotated with a reachability value and a **preference
//! vector** marking which dimensions are tight around it. This crate turns
//! that walk into a rooted refinement DAG and writes it out
//! deterministically:
//!
//! ```text
//! ClusterOrder ──► HierarchyBuilder ──► ClusterHierarchy ──► Materializer ──► OutputSink
//! ```
//!
//! Clusters group order entries sharing a preference vector; edges follow
//! strict bitset containment (a child constrains strictly more dimensions
//! than its parent); a cluster reachable from several parents is a single
//! node, written exactly once. Computing reachabilities and preference
//! vectors, loading data, and sequencing the outer workflow are the
//! caller's concern.
//!
//! ## References
//!
//! - Achtert et al. (2007). "Detection and Visualization of Subspace
//!   Cluster Hierarchies." DASFAA 2007.
//! - Ankerst et al. (1999). "OPTICS: Ordering Points To Identify the
//!   Clustering Structure." SIGMOD 1999.

/// Error types used across `axil`.
pub mod error;
pub mod hierarchy;
pub mod materialize;
pub mod order;
pub mod preference;


pub use error::{Error, Result};
pub use hierarchy::{
    validate_hierarchy, Cluster, ClusterHierarchy, ClusterId, HierarchyBuilder, Severity,
    ValidationIssue, ValidationReport,
};
pub use materialize::{
    FsSink, Materializer, MemberLookup, MemorySink, OutputSink, Restore, ScaleRestore, VectorTable,
};
pub use order::{ClusterOrder, OrderEntry};
pub use preference::PreferenceVector;
