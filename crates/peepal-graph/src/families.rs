//! Family groups and membership.

use std::collections::BTreeSet;

use tracing::{info, instrument, warn};

use crate::error::{GraphError, Result};
use crate::schema::{Family, Relative};
use crate::storage::GraphStore;

/// Manages family groups.
#[derive(Clone)]
pub struct FamilyGroupRegistry {
    store: GraphStore,
}

impl FamilyGroupRegistry {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    /// Create a family containing `creator_uid` and every listed member.
    ///
    /// The creator is always a member and must exist. Listed uids that do
    /// not match a person are skipped and logged; duplicates collapse.
    #[instrument(skip(self, member_uids))]
    pub async fn create_family_group(
        &self,
        creator_uid: &str,
        family_name: &str,
        member_uids: &[String],
    ) -> Result<String> {
        if !self.store.person_exists(creator_uid).await? {
            return Err(GraphError::person_not_found(creator_uid));
        }

        let mut uids: BTreeSet<String> = member_uids.iter().cloned().collect();
        uids.insert(creator_uid.to_string());

        let group = self.store.insert_family(family_name, &uids).await?;
        if !group.skipped.is_empty() {
            warn!(
                "Family {} skipped unknown members: {}",
                group.family.fid,
                group.skipped.join(", ")
            );
        }
        info!(
            "Family {} ({}) created with {} members",
            group.family.fid,
            family_name,
            group.members.len()
        );

        Ok(group.family.fid)
    }

    /// Everyone who shares a family with `uid`, including `uid` itself.
    pub async fn list_family_members(&self, uid: &str) -> Result<Vec<Relative>> {
        self.store.family_members_of(uid).await
    }

    pub async fn families_of(&self, uid: &str) -> Result<Vec<Family>> {
        self.store.families_of(uid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{person, setup_test_store};

    fn uids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_smiths_share_membership() {
        let store = setup_test_store().await;
        for (uid, name) in [("u1", "Ann"), ("u2", "Bob"), ("u3", "Cat")] {
            store.upsert_person(&person(uid, name)).await.unwrap();
        }
        let registry = FamilyGroupRegistry::new(store);

        registry
            .create_family_group("u1", "Smiths", &uids(&["u2", "u3"]))
            .await
            .unwrap();

        let members = registry.list_family_members("u2").await.unwrap();
        let member_uids: Vec<_> = members.iter().map(|m| m.uid.as_str()).collect();
        assert_eq!(member_uids, vec!["u1", "u2", "u3"]);
    }

    #[tokio::test]
    async fn test_creator_and_duplicates_collapse() {
        let store = setup_test_store().await;
        store.upsert_person(&person("u1", "Ann")).await.unwrap();
        store.upsert_person(&person("u2", "Bob")).await.unwrap();
        let registry = FamilyGroupRegistry::new(store.clone());

        registry
            .create_family_group("u1", "Smiths", &uids(&["u1", "u2", "u2"]))
            .await
            .unwrap();

        assert_eq!(store.stats().await.unwrap().memberships, 2);
    }

    #[tokio::test]
    async fn test_members_across_families_listed_once() {
        let store = setup_test_store().await;
        for (uid, name) in [("u1", "Ann"), ("u2", "Bob")] {
            store.upsert_person(&person(uid, name)).await.unwrap();
        }
        let registry = FamilyGroupRegistry::new(store);

        let first = registry
            .create_family_group("u1", "Smiths", &uids(&["u2"]))
            .await
            .unwrap();
        let second = registry
            .create_family_group("u2", "Joneses", &uids(&["u1"]))
            .await
            .unwrap();
        assert_ne!(first, second);

        assert_eq!(registry.list_family_members("u1").await.unwrap().len(), 2);
        assert_eq!(registry.families_of("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_creator_creates_nothing() {
        let store = setup_test_store().await;
        let registry = FamilyGroupRegistry::new(store.clone());

        let err = registry
            .create_family_group("ghost", "Nobodies", &[])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.stats().await.unwrap().families, 0);
    }

    #[tokio::test]
    async fn test_person_without_family_has_no_members() {
        let store = setup_test_store().await;
        store.upsert_person(&person("u1", "Ann")).await.unwrap();
        let registry = FamilyGroupRegistry::new(store);

        assert!(registry.list_family_members("u1").await.unwrap().is_empty());
    }
}
