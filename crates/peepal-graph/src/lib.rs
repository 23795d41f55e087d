//! Peepal Graph - kinship graph and legacy vouching.
//!
//! This crate provides the core of the Peepal family graph. It includes:
//!
//! - **Schema**: persons, legacy members, families and kinship edge labels
//! - **Storage**: SQLite-backed persistence with merge-on-write semantics
//! - **Components**: person registry, reciprocal relationships, vouch
//!   consensus, family groups and read-side tree projection
//!
//! # Example
//!
//! ```ignore
//! use peepal_graph::{GraphStore, Peepal, PeepalConfig, RelationKind};
//!
//! let store = GraphStore::open(&db_path, 4).await?;
//! let peepal = Peepal::new(store.clone(), &PeepalConfig::default());
//!
//! peepal.relations.declare_relation("p1", "p2", RelationKind::Father).await?;
//! let tree = peepal.tree.get_family_tree("p2").await?;
//! assert_eq!(tree.parents, vec!["Father Peepal"]);
//!
//! store.close().await;
//! ```

pub mod config;
pub mod error;
pub mod families;
pub mod people;
pub mod relationships;
pub mod schema;
pub mod storage;
pub mod tree;
pub mod vouch;

// Re-export commonly used types
pub use config::{DatabaseConfig, PeepalConfig, VouchConfig};
pub use error::{EntityKind, GraphError, Result};
pub use families::FamilyGroupRegistry;
pub use people::PersonRegistry;
pub use relationships::{RelationReceipt, RelationshipGraph};
pub use schema::{
    EdgeLabel, Family, FamilyTree, Gender, KinshipEdge, Legacy, NewPerson, Person, PersonStatus,
    RelationKind, Relative, VouchState,
};
pub use storage::{FamilyGroup, FamilySnapshot, GraphStats, GraphStore};
pub use tree::TreeProjection;
pub use vouch::VouchConsensus;

/// All components wired to one store.
#[derive(Clone)]
pub struct Peepal {
    pub people: PersonRegistry,
    pub relations: RelationshipGraph,
    pub vouches: VouchConsensus,
    pub families: FamilyGroupRegistry,
    pub tree: TreeProjection,
}

impl Peepal {
    pub fn new(store: GraphStore, config: &PeepalConfig) -> Self {
        Self {
            people: PersonRegistry::new(store.clone()),
            relations: RelationshipGraph::new(store.clone()),
            vouches: VouchConsensus::with_config(store.clone(), config.vouch),
            families: FamilyGroupRegistry::new(store.clone()),
            tree: TreeProjection::new(store),
        }
    }
}
