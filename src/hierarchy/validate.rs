//! Hierarchy validation and health checking utilities.
//!
//! Verifies the structural invariants of a built refinement DAG:
//! - every edge is a strict refinement (child vector strictly contains the
//!   parent's, child level strictly greater)
//! - the root is unconstrained and has no parents
//! - parent and child edge lists mirror each other
//! - every cluster is reachable from the root, with no cycles
//! - the vector index resolves each cluster's vector back to it
//! - member lists are duplicate-free, level indices unique per level
//!
//! # Example
//!
//! ```rust,ignore
//! let hierarchy = HierarchyBuilder::new(&order).build()?;
//! let report = validate_hierarchy(&hierarchy);
//! if !report.is_healthy() {
//!     for issue in report.issues {
//!         eprintln!("{}", issue);
//!     }
//! }
//! ```

use std::collections::{HashMap, HashSet};

use crate::hierarchy::cluster::ClusterId;
use crate::hierarchy::hierarchy::ClusterHierarchy;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, not a problem.
    Info,
    /// Something unusual but not necessarily wrong.
    Warning,
    /// A problem that should be fixed.
    Error,
    /// A critical issue that may cause failures.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single validation issue found during a health check.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Optional cluster involved.
    pub cluster: Option<ClusterId>,
    /// Optional additional context.
    pub context: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            cluster: None,
            context: None,
        }
    }

    /// Add the cluster this issue concerns.
    pub fn with_cluster(mut self, id: ClusterId) -> Self {
        self.cluster = Some(id);
        self
    }

    /// Add context to this issue.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(id) = self.cluster {
            write!(f, " (cluster {})", id)?;
        }
        if let Some(ctx) = &self.context {
            write!(f, " - {}", ctx)?;
        }
        Ok(())
    }
}

/// Report from a hierarchy health check.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Add a warning-level issue.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Warning, message));
    }

    /// Add an error-level issue.
    pub fn error(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Error, message));
    }

    /// Add a critical-level issue.
    pub fn critical(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Critical, message));
    }

    /// Check if the report contains no errors or critical issues.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// Check if there are any issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Get issues of a specific severity or higher.
    pub fn issues_at_level(&self, min_severity: Severity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= min_severity)
            .collect()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clean() {
            return write!(f, "Validation passed: no issues found");
        }

        let counts = self.counts();
        write!(f, "Validation report: ")?;

        let parts: Vec<String> = [
            (Severity::Critical, "critical"),
            (Severity::Error, "errors"),
            (Severity::Warning, "warnings"),
            (Severity::Info, "info"),
        ]
        .iter()
        .filter_map(|(sev, name)| counts.get(sev).map(|c| format!("{} {}", c, name)))
        .collect();

        writeln!(f, "{}", parts.join(", "))?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// Check a built hierarchy against its structural invariants.
pub fn validate_hierarchy(hierarchy: &ClusterHierarchy) -> ValidationReport {
    let mut report = ValidationReport::new();

    let root = hierarchy.root_cluster();
    if !root.preference_vector().is_unconstrained() {
        report.critical("root cluster constrains dimensions");
    }
    if !root.parents().is_empty() {
        report.add(
            ValidationIssue::new(Severity::Error, "root cluster has parents")
                .with_cluster(root.id()),
        );
    }

    for cluster in hierarchy.iter() {
        // Refinement direction on every edge, both containment and level.
        for &child_id in cluster.children() {
            let Some(child) = hierarchy.get(child_id) else {
                report.add(
                    ValidationIssue::new(Severity::Critical, "child id out of arena bounds")
                        .with_cluster(cluster.id())
                        .with_context(format!("missing child {child_id}")),
                );
                continue;
            };
            if !child
                .preference_vector()
                .is_strict_superset_of(cluster.preference_vector())
            {
                report.add(
                    ValidationIssue::new(Severity::Error, "child vector is not a strict refinement")
                        .with_cluster(cluster.id())
                        .with_context(format!("child {}", child.identifier())),
                );
            }
            if child.level() <= cluster.level() {
                report.add(
                    ValidationIssue::new(Severity::Error, "child level not above parent level")
                        .with_cluster(cluster.id())
                        .with_context(format!(
                            "parent level {}, child level {}",
                            cluster.level(),
                            child.level()
                        )),
                );
            }
            if !child.parents().contains(&cluster.id()) {
                report.add(
                    ValidationIssue::new(
                        Severity::Error,
                        "child does not list this cluster as parent",
                    )
                    .with_cluster(cluster.id())
                    .with_context(format!("child {}", child.identifier())),
                );
            }
        }

        for &parent_id in cluster.parents() {
            match hierarchy.get(parent_id) {
                Some(parent) if !parent.children().contains(&cluster.id()) => {
                    report.add(
                        ValidationIssue::new(
                            Severity::Error,
                            "parent does not list this cluster as child",
                        )
                        .with_cluster(cluster.id())
                        .with_context(format!("parent {}", parent.identifier())),
                    );
                }
                Some(_) => {}
                None => {
                    report.add(
                        ValidationIssue::new(Severity::Critical, "parent id out of arena bounds")
                            .with_cluster(cluster.id()),
                    );
                }
            }
        }

        // Vector identity must resolve back to this node.
        if hierarchy.lookup(cluster.preference_vector()) != Some(cluster.id()) {
            report.add(
                ValidationIssue::new(Severity::Error, "vector index does not resolve to cluster")
                    .with_cluster(cluster.id()),
            );
        }

        if cluster.level() != cluster.preference_vector().level() {
            report.add(
                ValidationIssue::new(Severity::Error, "stored level disagrees with popcount")
                    .with_cluster(cluster.id()),
            );
        }

        let unique: HashSet<usize> = cluster.members().iter().copied().collect();
        if unique.len() != cluster.members().len() {
            report.add(
                ValidationIssue::new(Severity::Error, "duplicate member ids")
                    .with_cluster(cluster.id()),
            );
        }
    }

    // Level indices unique within each level.
    let mut seen_level_index: HashSet<(usize, usize)> = HashSet::new();
    for cluster in hierarchy.iter() {
        if !seen_level_index.insert((cluster.level(), cluster.level_index())) {
            report.add(
                ValidationIssue::new(Severity::Error, "duplicate level index within level")
                    .with_cluster(cluster.id())
                    .with_context(format!(
                        "level {}, index {}",
                        cluster.level(),
                        cluster.level_index()
                    )),
            );
        }
    }

    // Reachability from the root.
    let mut reachable: HashSet<ClusterId> = HashSet::new();
    let mut stack = vec![hierarchy.root()];
    while let Some(id) = stack.pop() {
        if reachable.insert(id) {
            if let Some(cluster) = hierarchy.get(id) {
                stack.extend(cluster.children().iter().copied());
            }
        }
    }
    let orphans = hierarchy.len() - reachable.len();
    if orphans > 0 {
        report.error(format!("{orphans} clusters unreachable from the root"));
    }

    // Cycle check via DFS coloring. Strict containment rules cycles out by
    // construction, so any hit here is a corrupted arena.
    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    fn detect_cycle(
        id: ClusterId,
        hierarchy: &ClusterHierarchy,
        visited: &mut HashSet<ClusterId>,
        in_stack: &mut HashSet<ClusterId>,
    ) -> bool {
        if in_stack.contains(&id) {
            return true;
        }
        if visited.contains(&id) {
            return false;
        }
        let _ = visited.insert(id);
        let _ = in_stack.insert(id);
        if let Some(cluster) = hierarchy.get(id) {
            for &child in cluster.children() {
                if detect_cycle(child, hierarchy, visited, in_stack) {
                    return true;
                }
            }
        }
        let _ = in_stack.remove(&id);
        false
    }

    if detect_cycle(hierarchy.root(), hierarchy, &mut visited, &mut in_stack) {
        report.critical("cycle detected in refinement edges");
    }

    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unused_results)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyBuilder;
    use crate::order::{ClusterOrder, OrderEntry};
    use crate::preference::PreferenceVector;
    use proptest::prelude::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_validation_report_healthy() {
        let mut report = ValidationReport::new();
        report.warn("a warning");
        assert!(report.is_healthy());

        report.error("an error");
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue::new(Severity::Error, "something wrong")
            .with_cluster(ClusterId(42))
            .with_context("additional info");

        let s = format!("{}", issue);
        assert!(s.contains("ERROR"));
        assert!(s.contains("something wrong"));
        assert!(s.contains("42"));
        assert!(s.contains("additional info"));
    }

    #[test]
    fn test_built_hierarchy_is_healthy() {
        let mut order = ClusterOrder::new(4);
        order
            .push(OrderEntry::start(1, PreferenceVector::from_dims(4, &[0])))
            .unwrap();
        order
            .push(OrderEntry::new(
                2,
                1,
                0.4,
                PreferenceVector::from_dims(4, &[1]),
            ))
            .unwrap();
        order
            .push(OrderEntry::new(
                3,
                2,
                0.2,
                PreferenceVector::from_dims(4, &[0, 1]),
            ))
            .unwrap();

        let hierarchy = HierarchyBuilder::new(&order).build().unwrap();
        let report = validate_hierarchy(&hierarchy);
        assert!(report.is_healthy(), "{}", report);
    }

    // Orders drawn from arbitrary bitmasks: dimensionality 1..=5, up to 40
    // entries, object ids drawn from a small pool so duplicates occur.
    fn arb_order() -> impl Strategy<Value = ClusterOrder> {
        (1usize..=5).prop_flat_map(|dim| {
            proptest::collection::vec((0usize..20, 0u32..(1u32 << dim)), 1..40).prop_map(
                move |raw| {
                    let mut order = ClusterOrder::new(dim);
                    let mut prev: Option<usize> = None;
                    for (object_id, mask) in raw {
                        let dims: Vec<usize> =
                            (0..dim).filter(|d| mask & (1 << d) != 0).collect();
                        let pv = PreferenceVector::from_dims(dim, &dims);
                        let entry = match prev {
                            None => OrderEntry::start(object_id, pv),
                            Some(p) => OrderEntry::new(object_id, p, 0.5, pv),
                        };
                        order.push(entry).unwrap();
                        prev = Some(object_id);
                    }
                    order
                },
            )
        })
    }

    proptest! {
        #[test]
        fn built_hierarchies_are_healthy(order in arb_order()) {
            let hierarchy = HierarchyBuilder::new(&order).build().unwrap();
            let report = validate_hierarchy(&hierarchy);
            prop_assert!(report.is_healthy(), "{}", report);
        }

        #[test]
        fn visit_order_covers_each_cluster_once(order in arb_order()) {
            let hierarchy = HierarchyBuilder::new(&order).build().unwrap();
            let visits = hierarchy.visit_order();
            prop_assert_eq!(visits.len(), hierarchy.len());

            let distinct: std::collections::HashSet<_> = visits.iter().collect();
            prop_assert_eq!(distinct.len(), visits.len());
        }
    }
}
