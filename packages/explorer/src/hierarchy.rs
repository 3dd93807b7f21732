//! The two-level K=3 to K=6 cluster tree shown in the sidebar.

use cluster_map_place_models::{CharacteristicsDocument, ClusterLevel};
use serde::Serialize;

/// Name, size, and share of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub id: u32,
    pub name: String,
    pub size: u64,
    pub pct_of_total: f64,
}

impl ClusterSummary {
    fn describe(doc: &CharacteristicsDocument, level: ClusterLevel, id: u32) -> Self {
        let characteristics = doc.cluster(level, id).cloned().unwrap_or_default();
        Self {
            id,
            name: characteristics.name().to_string(),
            size: characteristics.size(),
            pct_of_total: characteristics.pct_of_total(),
        }
    }
}

/// A K=3 cluster and its K=6 subdivisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyBranch {
    pub cluster: ClusterSummary,
    pub children: Vec<ClusterSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyTree {
    pub branches: Vec<HierarchyBranch>,
}

impl HierarchyTree {
    /// One branch per K=3 id `0..3`, children in hierarchy-map order.
    /// Clusters the document does not describe still get a branch.
    #[must_use]
    pub fn from_document(doc: &CharacteristicsDocument) -> Self {
        let branches = (0..ClusterLevel::K3.cluster_count())
            .map(|k3| HierarchyBranch {
                cluster: ClusterSummary::describe(doc, ClusterLevel::K3, k3),
                children: doc
                    .k6_children(k3)
                    .iter()
                    .map(|&k6| ClusterSummary::describe(doc, ClusterLevel::K6, k6))
                    .collect(),
            })
            .collect();

        Self { branches }
    }

    /// The K=3 parent listing `k6`, if any.
    #[must_use]
    pub fn parent_of(&self, k6: u32) -> Option<&ClusterSummary> {
        self.branches
            .iter()
            .find(|b| b.children.iter().any(|c| c.id == k6))
            .map(|b| &b.cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn document() -> CharacteristicsDocument {
        serde_json::from_str(
            r#"{
                "k3_clusters": {
                    "0": {"descriptive_name": "Comercio", "size": 1200, "pct_of_total": 40.0},
                    "1": {"descriptive_name": "Servicios", "size": 900, "pct_of_total": 30.0},
                    "2": {"descriptive_name": "Educación", "size": 900, "pct_of_total": 30.0}
                },
                "k6_clusters": {
                    "0": {"descriptive_name": "Tiendas", "size": 700, "pct_of_total": 23.3},
                    "1": {"descriptive_name": "Mercados", "size": 500},
                    "2": {"descriptive_name": "Bancos"},
                    "3": {"descriptive_name": "Clínicas"},
                    "4": {"descriptive_name": "Escuelas"},
                    "5": {"descriptive_name": "Universidades"}
                },
                "hierarchy_map": {
                    "0": {"k6_children": [1, 0]},
                    "1": {"k6_children": [2, 3]},
                    "2": {"k6_children": [4, 5]}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn every_k6_cluster_has_exactly_one_parent() {
        let doc = document();
        let tree = HierarchyTree::from_document(&doc);
        assert!(doc.hierarchy_issues().is_empty());

        let listed: Vec<u32> = tree
            .branches
            .iter()
            .flat_map(|b| b.children.iter().map(|c| c.id))
            .collect();
        let unique: BTreeSet<u32> = listed.iter().copied().collect();
        assert_eq!(listed.len(), unique.len());
        assert_eq!(unique, doc.k6_ids());

        for k6 in doc.k6_ids() {
            assert!(tree.parent_of(k6).is_some());
        }
    }

    #[test]
    fn branches_carry_descriptions() {
        let tree = HierarchyTree::from_document(&document());
        assert_eq!(tree.branches.len(), 3);

        let first = &tree.branches[0];
        assert_eq!(first.cluster.name, "Comercio");
        assert_eq!(first.cluster.size, 1200);
        assert_eq!(
            first.children.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 0]
        );
        assert_eq!(first.children[1].name, "Tiendas");
        assert_eq!(tree.branches[1].children[0].size, 0);
        let parent = tree.parent_of(5).unwrap();
        assert_eq!((parent.id, parent.name.as_str()), (2, "Educación"));
        assert!(tree.parent_of(9).is_none());
    }

    #[test]
    fn empty_document_still_lists_three_parents() {
        let tree = HierarchyTree::from_document(&CharacteristicsDocument::default());
        assert_eq!(tree.branches.len(), 3);
        assert!(tree.branches.iter().all(|b| b.children.is_empty()));
        assert_eq!(tree.branches[2].cluster.name, "N/A");
    }
}
