//! Hierarchy extraction from a cluster order.
//!
//! The builder turns the linear walk into a rooted refinement DAG in four
//! passes:
//!
//! 1. **Group**: contiguous runs of entries sharing a preference vector
//!    become candidate clusters. Runs are merged globally by vector
//!    identity, so a subspace revisited later in the walk lands in the same
//!    cluster; members keep first-seen order and duplicates are dropped.
//! 2. **Link**: an edge `a → b` is added exactly when `a`'s vector is a
//!    strict subset of `b`'s and no third cluster lies strictly between
//!    them. Only covering relations of the subset partial order become
//!    edges, so the DAG encodes immediate refinements rather than the full
//!    transitive closure.
//! 3. **Root**: if no cluster owns the unconstrained vector, one is
//!    synthesized and attached as parent to every parentless cluster.
//! 4. **Finalize**: levels come from popcounts, level indices from
//!    discovery order, and all edge lists get a deterministic order.
//!
//! The result satisfies, for every edge, `child vector ⊋ parent vector` and
//! `child level > parent level`; acyclicity follows from strict containment.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Error, Result};
use crate::hierarchy::cluster::{Cluster, ClusterId};
use crate::hierarchy::hierarchy::ClusterHierarchy;
use crate::order::ClusterOrder;
use crate::preference::PreferenceVector;

/// Builds a [`ClusterHierarchy`] from a cluster order.
#[derive(Debug, Clone)]
pub struct HierarchyBuilder<'a> {
    order: &'a ClusterOrder,
}

impl<'a> HierarchyBuilder<'a> {
    /// Create a builder over `order`.
    pub fn new(order: &'a ClusterOrder) -> Self {
        Self { order }
    }

    /// Extract the hierarchy.
    ///
    /// Fails with [`Error::EmptyOrder`] on an empty order and
    /// [`Error::DimensionMismatch`] if an entry's vector width disagrees
    /// with the order's dimensionality.
    pub fn build(&self) -> Result<ClusterHierarchy> {
        if self.order.is_empty() {
            return Err(Error::EmptyOrder);
        }
        let dimensionality = self.order.dimensionality();

        let mut clusters: Vec<Cluster> = Vec::new();
        let mut index: HashMap<PreferenceVector, ClusterId> = HashMap::new();
        // Transient per-cluster member sets; the clusters keep ordered lists.
        let mut member_seen: Vec<HashSet<usize>> = Vec::new();

        for entry in self.order.iter() {
            let preference = entry.preference();
            if preference.dimensionality() != dimensionality {
                return Err(Error::DimensionMismatch {
                    expected: dimensionality,
                    found: preference.dimensionality(),
                });
            }

            let id = match index.get(preference) {
                Some(&id) => id,
                None => {
                    let id = ClusterId(clusters.len());
                    clusters.push(Cluster::new(id, preference.clone()));
                    member_seen.push(HashSet::new());
                    let _ = index.insert(preference.clone(), id);
                    id
                }
            };

            if member_seen[id.index()].insert(entry.object_id()) {
                clusters[id.index()].push_member(entry.object_id());
            }
        }

        let runs = 1 + self
            .order
            .entries()
            .windows(2)
            .filter(|w| w[0].preference() != w[1].preference())
            .count();
        debug!(
            entries = self.order.len(),
            runs,
            clusters = clusters.len(),
            "grouped cluster order"
        );

        let edges = Self::link_covering(&mut clusters);

        let unconstrained = PreferenceVector::unconstrained(dimensionality);
        let root = match index.get(&unconstrained) {
            Some(&id) => id,
            None => {
                let id = ClusterId(clusters.len());
                clusters.push(Cluster::new(id, unconstrained.clone()));
                let _ = index.insert(unconstrained, id);
                debug!("synthesized root cluster");
                id
            }
        };
        for i in 0..clusters.len() {
            let id = ClusterId(i);
            if id != root && clusters[i].parents().is_empty() {
                clusters[i].add_parent(root);
                clusters[root.index()].add_child(id);
            }
        }

        Self::finalize(&mut clusters);

        debug!(
            clusters = clusters.len(),
            edges,
            root = %clusters[root.index()].identifier(),
            "hierarchy built"
        );
        Ok(ClusterHierarchy::new(clusters, root, index, dimensionality))
    }

    /// Add an edge for every covering pair of the strict-subset order.
    ///
    /// Returns the number of edges added. Quadratic pair scan with a linear
    /// betweenness check; cluster counts are small relative to the order.
    fn link_covering(clusters: &mut [Cluster]) -> usize {
        let n = clusters.len();
        let mut edges = 0;
        for a in 0..n {
            for b in 0..n {
                if a == b {
                    continue;
                }
                let va = clusters[a].preference_vector();
                let vb = clusters[b].preference_vector();
                if !va.is_strict_subset_of(vb) {
                    continue;
                }
                let covered = !(0..n).any(|c| {
                    c != a && c != b && {
                        let vc = clusters[c].preference_vector();
                        va.is_strict_subset_of(vc) && vc.is_strict_subset_of(vb)
                    }
                });
                if covered {
                    clusters[a].add_child(ClusterId(b));
                    clusters[b].add_parent(ClusterId(a));
                    edges += 1;
                }
            }
        }
        edges
    }

    /// Assign level indices in discovery order and fix edge-list ordering.
    fn finalize(clusters: &mut [Cluster]) {
        let mut per_level: HashMap<usize, usize> = HashMap::new();
        for cluster in clusters.iter_mut() {
            let next = per_level.entry(cluster.level()).or_insert(0);
            cluster.set_level_index(*next);
            *next += 1;
        }

        for i in 0..clusters.len() {
            let mut children = clusters[i].children().to_vec();
            children.sort_by(|x, y| {
                clusters[x.index()]
                    .preference_vector()
                    .cmp(clusters[y.index()].preference_vector())
            });
            let mut parents = clusters[i].parents().to_vec();
            parents.sort_by(|x, y| {
                clusters[x.index()]
                    .preference_vector()
                    .cmp(clusters[y.index()].preference_vector())
            });
            clusters[i].set_children(children);
            clusters[i].set_parents(parents);
        }
    }
}
