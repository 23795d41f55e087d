//! Reciprocal kinship edges.
//!
//! Kinship is stored in both directions: declaring that A is the father of B
//! writes `A -FATHER_OF-> B` and `B -CHILD_OF-> A` together. The pair is one
//! transaction and each edge is merged, so a retried or repeated declaration
//! converges to the same graph.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::schema::{KinshipEdge, RelationKind};
use crate::storage::GraphStore;

/// Confirmation returned for a declared relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationReceipt {
    pub kind: RelationKind,
    /// How many of the two edges did not exist before.
    pub edges_created: u64,
    pub message: String,
}

/// Declares kinship relations between persons.
#[derive(Clone)]
pub struct RelationshipGraph {
    store: GraphStore,
}

impl RelationshipGraph {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    /// The forward and reverse edge a declaration expands to.
    pub fn reciprocal_edges(
        subject_uid: &str,
        target_uid: &str,
        kind: RelationKind,
    ) -> [KinshipEdge; 2] {
        let (forward, reverse) = kind.edge_pair();
        [
            KinshipEdge::new(subject_uid, forward, target_uid),
            KinshipEdge::new(target_uid, reverse, subject_uid),
        ]
    }

    /// Declare `subject` to be `kind` of `target`.
    ///
    /// Both persons must exist. They are checked in the same transaction
    /// that writes the edges, so a missing one leaves the graph untouched.
    #[instrument(skip(self))]
    pub async fn declare_relation(
        &self,
        subject_uid: &str,
        target_uid: &str,
        kind: RelationKind,
    ) -> Result<RelationReceipt> {
        let edges = Self::reciprocal_edges(subject_uid, target_uid, kind);
        let edges_created = self.store.merge_edges(&edges).await?;

        if edges_created == 0 {
            debug!(
                "{} relation {} -> {} already recorded",
                kind, subject_uid, target_uid
            );
        } else {
            info!("{} relation {} -> {} recorded", kind, subject_uid, target_uid);
        }

        Ok(RelationReceipt {
            kind,
            edges_created,
            message: format!("Reciprocal {} relation established.", kind),
        })
    }

    /// Same as [`declare_relation`](Self::declare_relation) for an unparsed kind.
    ///
    /// Unknown kinds fail before the store is touched.
    pub async fn declare_relation_str(
        &self,
        subject_uid: &str,
        target_uid: &str,
        kind: &str,
    ) -> Result<RelationReceipt> {
        let kind: RelationKind = kind.parse()?;
        self.declare_relation(subject_uid, target_uid, kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::schema::EdgeLabel;
    use crate::storage::tests::{person, setup_test_store};

    async fn graph_with(uids: &[&str]) -> (GraphStore, RelationshipGraph) {
        let store = setup_test_store().await;
        for uid in uids {
            store.upsert_person(&person(uid, &uid.to_uppercase())).await.unwrap();
        }
        (store.clone(), RelationshipGraph::new(store))
    }

    #[tokio::test]
    async fn test_every_kind_writes_its_reverse_edge() {
        for kind in RelationKind::ALL {
            let (store, graph) = graph_with(&["a", "b"]).await;
            graph.declare_relation("a", "b", kind).await.unwrap();

            let (forward, reverse) = kind.edge_pair();
            assert_eq!(
                store.edges_from("a").await.unwrap(),
                vec![KinshipEdge::new("a", forward, "b")]
            );
            assert_eq!(
                store.edges_from("b").await.unwrap(),
                vec![KinshipEdge::new("b", reverse, "a")]
            );
        }
    }

    #[tokio::test]
    async fn test_declaring_twice_is_idempotent() {
        for kind in RelationKind::ALL {
            let (store, graph) = graph_with(&["a", "b"]).await;

            let first = graph.declare_relation("a", "b", kind).await.unwrap();
            let after_first = store.stats().await.unwrap();
            let second = graph.declare_relation("a", "b", kind).await.unwrap();

            assert_eq!(first.edges_created, 2);
            assert_eq!(second.edges_created, 0);
            assert_eq!(store.stats().await.unwrap(), after_first);
        }
    }

    #[tokio::test]
    async fn test_spouse_is_symmetric() {
        let (store, graph) = graph_with(&["a", "b"]).await;
        graph.declare_relation("a", "b", RelationKind::Spouse).await.unwrap();

        let from_a = store.outgoing("a", &[EdgeLabel::SpouseOf]).await.unwrap();
        let from_b = store.outgoing("b", &[EdgeLabel::SpouseOf]).await.unwrap();
        assert_eq!(from_a[0].uid, "b");
        assert_eq!(from_b[0].uid, "a");
    }

    #[tokio::test]
    async fn test_receipt_message_names_the_kind() {
        let (_, graph) = graph_with(&["p1", "p2"]).await;
        let receipt = graph
            .declare_relation("p1", "p2", RelationKind::Father)
            .await
            .unwrap();
        assert_eq!(receipt.kind, RelationKind::Father);
        assert_eq!(receipt.message, "Reciprocal FATHER relation established.");
    }

    #[tokio::test]
    async fn test_unknown_kind_writes_nothing() {
        let (store, graph) = graph_with(&["a", "b"]).await;
        let err = graph.declare_relation_str("a", "b", "UNCLE").await.unwrap_err();
        assert!(matches!(err, GraphError::InvalidRelationType(ref k) if k == "UNCLE"));
        assert_eq!(store.stats().await.unwrap().kinship_edges, 0);
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let (store, graph) = graph_with(&["a"]).await;
        let err = graph
            .declare_relation("a", "ghost", RelationKind::Mother)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::NotFound { ref key, .. } if key == "ghost"
        ));
        assert_eq!(store.stats().await.unwrap().kinship_edges, 0);
    }

    #[tokio::test]
    async fn test_missing_subject_is_not_found() {
        let (store, graph) = graph_with(&["b"]).await;
        let err = graph
            .declare_relation("ghost", "b", RelationKind::Spouse)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.edges_from("b").await.unwrap().is_empty());
    }
}
