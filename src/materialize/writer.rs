//! Materialization: writing a built hierarchy to an output sink.
//!
//! One output unit is written per distinct cluster, named by the cluster's
//! stable identifier, plus one transcript unit for the raw cluster order.
//! The traversal is depth-first from the root with a visited set, so a
//! cluster reachable through several parents is still written exactly once
//! and the walk terminates under convergent structure.
//!
//! Each unit carries, in order: the caller's header block (verbatim, when
//! present), the preference-vector line, the child and parent
//! cross-reference lines, level and level-index lines, a rule line, then
//! one data row per member. Child order is deterministic, so repeated runs
//! over the same hierarchy produce byte-identical output.

use std::collections::HashSet;
use std::io::{self, Write};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::hierarchy::{Cluster, ClusterHierarchy, ClusterId};
use crate::materialize::sink::OutputSink;
use crate::order::ClusterOrder;

/// Marker for the preference-vector line of an output unit.
pub const PREFERENCE_VECTOR: &str = "preference vector: ";

/// Marker for the children line of an output unit.
pub const CHILDREN: &str = "children: ";

/// Marker for the parents line of an output unit.
pub const PARENTS: &str = "parents: ";

/// Marker for the level line of an output unit.
pub const LEVEL: &str = "level: ";

/// Marker for the level-index line of an output unit.
pub const LEVEL_INDEX: &str = "level index: ";

/// Name of the transcript unit holding the raw cluster order.
pub const CLUSTER_ORDER_UNIT: &str = "cluster_order";

/// Comment prefix for metadata lines.
const COMMENT: &str = "### ";

/// Separator between a data row's value and its label.
const SEPARATOR: &str = " ";

/// Rule line between unit metadata and data rows.
const RULE: &str =
    "################################################################################";

/// Resolves member object ids to values and optional labels at write time.
///
/// The hierarchy holds member identifiers only; raw vectors stay with the
/// caller and are dereferenced through this lookup while writing.
pub trait MemberLookup {
    /// The member's value, if known.
    fn value(&self, object_id: usize) -> Option<Vec<f64>>;

    /// The member's label, if any.
    fn label(&self, object_id: usize) -> Option<String>;
}

/// Simple in-memory [`MemberLookup`] backed by a map.
#[derive(Debug, Clone, Default)]
pub struct VectorTable {
    rows: std::collections::HashMap<usize, (Vec<f64>, Option<String>)>,
}

impl VectorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a member's value and label.
    pub fn insert(&mut self, object_id: usize, value: Vec<f64>, label: Option<String>) {
        let _ = self.rows.insert(object_id, (value, label));
    }

    /// Number of stored members.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl MemberLookup for VectorTable {
    fn value(&self, object_id: usize) -> Option<Vec<f64>> {
        self.rows.get(&object_id).map(|(value, _)| value.clone())
    }

    fn label(&self, object_id: usize) -> Option<String> {
        self.rows.get(&object_id).and_then(|(_, label)| label.clone())
    }
}

/// Restores a member's value to its pre-normalization representation.
///
/// Optional inverse of whatever normalization ran upstream. An input the
/// function cannot handle yields [`Error::IncompatibleRestoration`], which
/// aborts the remaining materialization; units already flushed are kept.
pub trait Restore {
    /// Restore one value.
    fn restore(&self, object_id: usize, value: &[f64]) -> Result<Vec<f64>>;
}

/// Componentwise affine restoration: `restored[i] = value[i] * scale[i] + shift[i]`.
///
/// The inverse of a min-max style normalization. Values whose width
/// disagrees with the configured factors are incompatible.
#[derive(Debug, Clone)]
pub struct ScaleRestore {
    scale: Vec<f64>,
    shift: Vec<f64>,
}

impl ScaleRestore {
    /// Create a restoration with per-dimension factors.
    ///
    /// # Panics
    ///
    /// Panics if `scale` and `shift` differ in length.
    pub fn new(scale: Vec<f64>, shift: Vec<f64>) -> Self {
        assert_eq!(
            scale.len(),
            shift.len(),
            "scale and shift must cover the same dimensions"
        );
        Self { scale, shift }
    }
}

impl Restore for ScaleRestore {
    fn restore(&self, object_id: usize, value: &[f64]) -> Result<Vec<f64>> {
        if value.len() != self.scale.len() {
            return Err(Error::IncompatibleRestoration {
                object_id,
                message: format!(
                    "expected {} components, found {}",
                    self.scale.len(),
                    value.len()
                ),
            });
        }
        Ok(value
            .iter()
            .zip(self.scale.iter().zip(self.shift.iter()))
            .map(|(v, (s, t))| v * s + t)
            .collect())
    }
}

/// Writes a built hierarchy and its order transcript to an output sink.
#[derive(Clone)]
pub struct Materializer<'a, L> {
    hierarchy: &'a ClusterHierarchy,
    order: &'a ClusterOrder,
    lookup: &'a L,
    restore: Option<&'a dyn Restore>,
    header: Option<Vec<String>>,
}

impl<'a, L: MemberLookup> Materializer<'a, L> {
    /// Create a materializer for `hierarchy`, resolving members through
    /// `lookup`.
    pub fn new(hierarchy: &'a ClusterHierarchy, order: &'a ClusterOrder, lookup: &'a L) -> Self {
        Self {
            hierarchy,
            order,
            lookup,
            restore: None,
            header: None,
        }
    }

    /// Prepend a header block to every unit, written verbatim.
    pub fn with_header(mut self, lines: Vec<String>) -> Self {
        self.header = Some(lines);
        self
    }

    /// Pass every member value through `restore` before writing.
    pub fn with_restore(mut self, restore: &'a dyn Restore) -> Self {
        self.restore = Some(restore);
        self
    }

    /// Write the transcript and one unit per cluster into `sink`.
    ///
    /// Synchronous and single-threaded; every sink call blocks until the
    /// write completes or fails. On failure the error is returned
    /// immediately and units already flushed remain in place.
    pub fn write_to<S: OutputSink>(&self, sink: &mut S) -> Result<()> {
        sink.create_dir()
            .map_err(|e| sink_error("<destination>", &e))?;

        let mut transcript = sink
            .create_target(CLUSTER_ORDER_UNIT)
            .map_err(|e| sink_error(CLUSTER_ORDER_UNIT, &e))?;
        self.order
            .write_transcript(&mut transcript, self.header.as_deref())
            .map_err(|e| sink_error(CLUSTER_ORDER_UNIT, &e))?;
        drop(transcript);

        let mut visited = HashSet::with_capacity(self.hierarchy.len());
        let mut stack = vec![self.hierarchy.root()];
        let mut written = 0usize;

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let cluster = self.hierarchy.cluster(id);
            self.write_unit(sink, cluster)?;
            written += 1;

            // Reverse push so the first child is written first.
            for &child in cluster.children().iter().rev() {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        }

        info!(clusters = written, "materialized hierarchy");
        Ok(())
    }

    fn write_unit<S: OutputSink>(&self, sink: &mut S, cluster: &Cluster) -> Result<()> {
        let name = cluster.identifier();
        let mut out = sink
            .create_target(&name)
            .map_err(|e| sink_error(&name, &e))?;
        self.write_unit_contents(&mut out, cluster, &name)?;
        out.flush().map_err(|e| sink_error(&name, &e))?;

        debug!(
            unit = %name,
            members = cluster.members().len(),
            children = cluster.children().len(),
            "wrote cluster unit"
        );
        Ok(())
    }

    fn write_unit_contents<W: Write>(
        &self,
        out: &mut W,
        cluster: &Cluster,
        name: &str,
    ) -> Result<()> {
        let ioerr = |e: io::Error| sink_error(name, &e);

        if let Some(lines) = &self.header {
            for line in lines {
                writeln!(out, "{line}").map_err(ioerr)?;
            }
        }

        writeln!(
            out,
            "{COMMENT}{PREFERENCE_VECTOR}{}",
            cluster.preference_vector()
        )
        .map_err(ioerr)?;
        writeln!(out, "{COMMENT}{CHILDREN}{}", self.edge_list(cluster.children()))
            .map_err(ioerr)?;
        writeln!(out, "{COMMENT}{PARENTS}{}", self.edge_list(cluster.parents())).map_err(ioerr)?;
        writeln!(out, "{COMMENT}{LEVEL}{}", cluster.level()).map_err(ioerr)?;
        writeln!(out, "{COMMENT}{LEVEL_INDEX}{}", cluster.level_index()).map_err(ioerr)?;
        writeln!(out, "{RULE}").map_err(ioerr)?;

        for &member in cluster.members() {
            let value = self
                .lookup
                .value(member)
                .ok_or_else(|| Error::MalformedOrder {
                    message: format!("no value for object {member}"),
                })?;
            let value = match self.restore {
                Some(restore) => restore.restore(member, &value)?,
                None => value,
            };
            let rendered = value
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            match self.lookup.label(member) {
                Some(label) => writeln!(out, "{rendered}{SEPARATOR}{label}").map_err(ioerr)?,
                None => writeln!(out, "{rendered}").map_err(ioerr)?,
            }
        }
        Ok(())
    }

    fn edge_list(&self, ids: &[ClusterId]) -> String {
        ids.iter()
            .map(|&id| self.hierarchy.cluster(id).identifier())
            .collect::<Vec<_>>()
            .join(":")
    }
}

fn sink_error(target: &str, err: &io::Error) -> Error {
    Error::SinkUnavailable {
        target: target.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyBuilder;
    use crate::materialize::sink::MemorySink;
    use crate::order::OrderEntry;
    use crate::preference::PreferenceVector;

    fn pv(dims: &[usize]) -> PreferenceVector {
        PreferenceVector::from_dims(3, dims)
    }

    fn chain_fixture() -> (ClusterOrder, VectorTable) {
        let mut order = ClusterOrder::new(3);
        order.push(OrderEntry::start(1, pv(&[0]))).unwrap();
        order.push(OrderEntry::new(2, 1, 0.5, pv(&[0]))).unwrap();
        order.push(OrderEntry::new(3, 2, 0.9, pv(&[0, 1]))).unwrap();

        let mut table = VectorTable::new();
        table.insert(1, vec![0.1, 0.2, 0.3], Some("p1".to_string()));
        table.insert(2, vec![0.4, 0.5, 0.6], Some("p2".to_string()));
        table.insert(3, vec![0.7, 0.8, 0.9], None);
        (order, table)
    }

    #[test]
    fn test_writes_one_unit_per_cluster_plus_transcript() {
        let (order, table) = chain_fixture();
        let hierarchy = HierarchyBuilder::new(&order).build().unwrap();

        let mut sink = MemorySink::new();
        Materializer::new(&hierarchy, &order, &table)
            .write_to(&mut sink)
            .unwrap();

        assert_eq!(sink.len(), hierarchy.len() + 1);
        assert!(sink.contents(CLUSTER_ORDER_UNIT).is_some());
        assert!(sink.contents("cluster_root").is_some());
        assert!(sink.contents("cluster_l1_d0").is_some());
        assert!(sink.contents("cluster_l2_d0_d1").is_some());
    }

    #[test]
    fn test_unit_layout() {
        let (order, table) = chain_fixture();
        let hierarchy = HierarchyBuilder::new(&order).build().unwrap();

        let mut sink = MemorySink::new();
        Materializer::new(&hierarchy, &order, &table)
            .write_to(&mut sink)
            .unwrap();

        let unit = sink.contents("cluster_l1_d0").unwrap();
        let lines: Vec<&str> = unit.lines().collect();
        assert_eq!(lines[0], "### preference vector: 1, 0, 0");
        assert_eq!(lines[1], "### children: cluster_l2_d0_d1");
        assert_eq!(lines[2], "### parents: cluster_root");
        assert_eq!(lines[3], "### level: 1");
        assert_eq!(lines[4], "### level index: 0");
        assert_eq!(lines[5], RULE);
        assert_eq!(lines[5].len(), 80);
        assert_eq!(lines[6], "0.1 0.2 0.3 p1");
        assert_eq!(lines[7], "0.4 0.5 0.6 p2");
        assert_eq!(lines.len(), 8);

        let root = sink.contents("cluster_root").unwrap();
        assert!(root.contains("### preference vector: 0, 0, 0"));
        assert!(root.contains("### children: cluster_l1_d0"));
        assert!(root.contains("### parents: \n"), "root has no parents");

        let leaf = sink.contents("cluster_l2_d0_d1").unwrap();
        assert!(leaf.contains("### children: \n"), "leaf has no children");
        assert!(leaf.contains("### parents: cluster_l1_d0"));
        assert!(leaf.contains("0.7 0.8 0.9\n"), "unlabeled row has no separator");
    }

    #[test]
    fn test_header_prepended_to_every_unit() {
        let (order, table) = chain_fixture();
        let hierarchy = HierarchyBuilder::new(&order).build().unwrap();

        let header = vec!["### epsilon: 0.1".to_string(), "### mu: 2".to_string()];
        let mut sink = MemorySink::new();
        Materializer::new(&hierarchy, &order, &table)
            .with_header(header)
            .write_to(&mut sink)
            .unwrap();

        for name in sink.unit_names() {
            let unit = sink.contents(&name).unwrap();
            assert!(
                unit.starts_with("### epsilon: 0.1\n### mu: 2\n"),
                "unit {name} missing header"
            );
        }
    }

    #[test]
    fn test_diamond_written_exactly_once() {
        let mut order = ClusterOrder::new(3);
        order.push(OrderEntry::start(1, pv(&[0]))).unwrap();
        order.push(OrderEntry::new(2, 1, 0.5, pv(&[1]))).unwrap();
        order.push(OrderEntry::new(3, 2, 0.7, pv(&[0, 1]))).unwrap();

        let mut table = VectorTable::new();
        for id in 1..=3 {
            table.insert(id, vec![id as f64, 0.0, 0.0], None);
        }

        let hierarchy = HierarchyBuilder::new(&order).build().unwrap();
        let mut sink = MemorySink::new();
        Materializer::new(&hierarchy, &order, &table)
            .write_to(&mut sink)
            .unwrap();

        // Four clusters plus the transcript; the shared child appears once
        // even though both parents reference it.
        assert_eq!(sink.len(), 5);
        let shared = sink.contents("cluster_l2_d0_d1").unwrap();
        assert!(shared.contains("### parents: cluster_l1_d0:cluster_l1_d1"));
        assert_eq!(shared.matches("### preference vector").count(), 1);
    }

    #[test]
    fn test_restoration_applied_to_rows() {
        let (order, table) = chain_fixture();
        let hierarchy = HierarchyBuilder::new(&order).build().unwrap();

        let restore = ScaleRestore::new(vec![10.0, 10.0, 10.0], vec![1.0, 1.0, 1.0]);
        let mut sink = MemorySink::new();
        Materializer::new(&hierarchy, &order, &table)
            .with_restore(&restore)
            .write_to(&mut sink)
            .unwrap();

        let unit = sink.contents("cluster_l1_d0").unwrap();
        assert!(unit.contains("2 3 4 p1"));
        assert!(unit.contains("5 6 7 p2"));
    }

    #[test]
    fn test_incompatible_restoration_aborts() {
        let (order, mut table) = chain_fixture();
        // The deepest cluster's member has a value the restoration cannot
        // handle.
        table.insert(3, vec![0.7, 0.8], None);
        let hierarchy = HierarchyBuilder::new(&order).build().unwrap();

        let restore = ScaleRestore::new(vec![1.0, 1.0, 1.0], vec![0.0, 0.0, 0.0]);
        let mut sink = MemorySink::new();
        let err = Materializer::new(&hierarchy, &order, &table)
            .with_restore(&restore)
            .write_to(&mut sink)
            .unwrap_err();

        assert!(matches!(err, Error::IncompatibleRestoration { object_id: 3, .. }));
        // Units flushed before the failure are kept; nothing beyond them.
        assert!(sink.contents("cluster_root").is_some());
        assert!(sink.contents("cluster_l1_d0").is_some());
    }

    #[test]
    fn test_missing_member_value_is_malformed() {
        let (order, _) = chain_fixture();
        let hierarchy = HierarchyBuilder::new(&order).build().unwrap();

        let empty = VectorTable::new();
        let mut sink = MemorySink::new();
        let err = Materializer::new(&hierarchy, &order, &empty)
            .write_to(&mut sink)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedOrder { .. }));
    }

    #[test]
    fn test_byte_identical_across_runs() {
        let (order, table) = chain_fixture();
        let hierarchy = HierarchyBuilder::new(&order).build().unwrap();
        let materializer = Materializer::new(&hierarchy, &order, &table);

        let mut first = MemorySink::new();
        materializer.write_to(&mut first).unwrap();
        let mut second = MemorySink::new();
        materializer.write_to(&mut second).unwrap();

        assert_eq!(first.unit_names(), second.unit_names());
        for name in first.unit_names() {
            assert_eq!(first.contents(&name), second.contents(&name));
        }
    }

    #[test]
    fn test_fs_sink_end_to_end() {
        let (order, table) = chain_fixture();
        let hierarchy = HierarchyBuilder::new(&order).build().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut sink = crate::materialize::FsSink::new(dir.path().join("result"));
        Materializer::new(&hierarchy, &order, &table)
            .write_to(&mut sink)
            .unwrap();

        let root = std::fs::read_to_string(dir.path().join("result").join("cluster_root")).unwrap();
        assert!(root.contains("### preference vector: 0, 0, 0"));
        let transcript =
            std::fs::read_to_string(dir.path().join("result").join(CLUSTER_ORDER_UNIT)).unwrap();
        assert!(transcript.starts_with("1 - inf 1, 0, 0\n"));
    }
}
