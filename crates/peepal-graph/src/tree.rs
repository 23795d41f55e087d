//! Read-side projections over the kinship graph.
//!
//! Parents and children are read through the parental labels only
//! (`FATHER_OF`, `MOTHER_OF`, `PARENT_OF`). Because every declaration writes
//! a parental edge in one direction, a relation declared from either side
//! shows up here without a reverse lookup over `CHILD_OF`.

use tracing::instrument;

use crate::error::{GraphError, Result};
use crate::schema::{EdgeLabel, FamilyTree, Relative};
use crate::storage::GraphStore;

/// Builds family views from the stored edges.
#[derive(Clone)]
pub struct TreeProjection {
    store: GraphStore,
}

impl TreeProjection {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    /// Immediate family of a person: status, parents and children by name.
    #[instrument(skip(self))]
    pub async fn get_family_tree(&self, uid: &str) -> Result<FamilyTree> {
        let snapshot = match self.store.family_snapshot(uid).await? {
            Some(snapshot) if !snapshot.person.name.is_empty() => snapshot,
            _ => return Err(GraphError::person_not_found(uid)),
        };

        Ok(FamilyTree {
            name: snapshot.person.name,
            status: snapshot.person.status,
            parents: names(snapshot.parents),
            children: names(snapshot.children),
        })
    }

    /// One hop along a single canonical edge label.
    pub async fn get_relations_by_type(
        &self,
        uid: &str,
        label: EdgeLabel,
    ) -> Result<Vec<Relative>> {
        self.store.outgoing(uid, &[label]).await
    }

    /// Same as [`get_relations_by_type`](Self::get_relations_by_type) for an unparsed label.
    pub async fn get_relations_by_label(&self, uid: &str, label: &str) -> Result<Vec<Relative>> {
        let label: EdgeLabel = label.parse()?;
        self.get_relations_by_type(uid, label).await
    }
}

fn names(relatives: Vec<Relative>) -> Vec<String> {
    relatives.into_iter().map(|r| r.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships::RelationshipGraph;
    use crate::schema::{PersonStatus, RelationKind};
    use crate::storage::tests::{person, setup_test_store};

    async fn family() -> (RelationshipGraph, TreeProjection) {
        let store = setup_test_store().await;
        for (uid, name) in [
            ("p1", "Father Peepal"),
            ("p2", "Abhi"),
            ("m1", "Mother Peepal"),
            ("g1", "Grandpa Peepal"),
        ] {
            store.upsert_person(&person(uid, name)).await.unwrap();
        }
        (RelationshipGraph::new(store.clone()), TreeProjection::new(store))
    }

    #[tokio::test]
    async fn test_father_shows_up_on_both_sides() {
        let (graph, tree) = family().await;
        graph.declare_relation("p1", "p2", RelationKind::Father).await.unwrap();

        let child = tree.get_family_tree("p2").await.unwrap();
        assert_eq!(child.parents, vec!["Father Peepal".to_string()]);
        assert!(child.children.is_empty());

        let father = tree.get_family_tree("p1").await.unwrap();
        assert_eq!(father.children, vec!["Abhi".to_string()]);
    }

    #[tokio::test]
    async fn test_child_declaration_feeds_parents() {
        let (graph, tree) = family().await;
        graph.declare_relation("p1", "g1", RelationKind::Child).await.unwrap();
        graph.declare_relation("m1", "p2", RelationKind::Mother).await.unwrap();
        graph.declare_relation("p1", "p2", RelationKind::Father).await.unwrap();

        let dad = tree.get_family_tree("p1").await.unwrap();
        assert_eq!(dad.parents, vec!["Grandpa Peepal".to_string()]);
        assert_eq!(dad.children, vec!["Abhi".to_string()]);

        let kid = tree.get_family_tree("p2").await.unwrap();
        assert_eq!(
            kid.parents,
            vec!["Father Peepal".to_string(), "Mother Peepal".to_string()]
        );
    }

    #[tokio::test]
    async fn test_parents_deduplicated_by_identity() {
        let (graph, tree) = family().await;
        // Father declared by the father and confirmed by the child
        graph.declare_relation("p1", "p2", RelationKind::Father).await.unwrap();
        graph.declare_relation("p2", "p1", RelationKind::Child).await.unwrap();

        let kid = tree.get_family_tree("p2").await.unwrap();
        assert_eq!(kid.parents, vec!["Father Peepal".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_person_is_not_found() {
        let (_, tree) = family().await;
        let err = tree.get_family_tree("nobody").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_nameless_person_is_not_found() {
        let store = setup_test_store().await;
        store.upsert_person(&person("blank", "")).await.unwrap();
        let tree = TreeProjection::new(store);
        assert!(tree.get_family_tree("blank").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_lonely_person_has_empty_lists() {
        let (_, tree) = family().await;
        let view = tree.get_family_tree("g1").await.unwrap();
        assert_eq!(view.status, PersonStatus::Inactive);
        assert!(view.parents.is_empty());
        assert!(view.children.is_empty());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["parents"], serde_json::json!([]));
        assert_eq!(json["children"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_relations_by_type() {
        let (graph, tree) = family().await;
        graph.declare_relation("p1", "m1", RelationKind::Spouse).await.unwrap();
        graph.declare_relation("p1", "p2", RelationKind::Father).await.unwrap();

        let spouses = tree
            .get_relations_by_type("m1", EdgeLabel::SpouseOf)
            .await
            .unwrap();
        assert_eq!(
            spouses,
            vec![Relative {
                uid: "p1".into(),
                name: "Father Peepal".into()
            }]
        );

        let fathers_of = tree.get_relations_by_label("p1", "FATHER_OF").await.unwrap();
        assert_eq!(fathers_of.len(), 1);
        assert_eq!(fathers_of[0].uid, "p2");

        let child_of = tree
            .get_relations_by_type("p2", EdgeLabel::ChildOf)
            .await
            .unwrap();
        assert_eq!(child_of[0].uid, "p1");
    }

    #[tokio::test]
    async fn test_relations_reject_non_canonical_label() {
        let (_, tree) = family().await;
        let err = tree.get_relations_by_label("p1", "Spouses").await.unwrap_err();
        assert!(matches!(err, GraphError::InvalidFilterLabel(_)));
    }
}
