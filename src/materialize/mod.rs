//! Persisting built hierarchies.
//!
//! A materialized hierarchy is a set of named output units under one
//! destination: one unit per distinct cluster plus a transcript of the raw
//! cluster order. Units are plain line-oriented text, so the destination
//! abstraction ([`OutputSink`]) stays minimal — create the destination,
//! create a named target, write lines.
//!
//! The [`Materializer`] owns the traversal and the unit format;
//! [`MemberLookup`] and [`Restore`] are the seams through which the caller
//! supplies raw values and undoes upstream normalization at write time.

mod sink;
mod writer;

pub use sink::{FsSink, MemorySink, MemoryTarget, OutputSink};
pub use writer::{
    Materializer, MemberLookup, Restore, ScaleRestore, VectorTable, CHILDREN, CLUSTER_ORDER_UNIT,
    LEVEL, LEVEL_INDEX, PARENTS, PREFERENCE_VECTOR,
};
