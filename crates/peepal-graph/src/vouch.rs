//! Vouch consensus for legacy members.
//!
//! A legacy member is a provisional person added by an existing member. It
//! becomes verified once enough distinct members vouch for it. Each voter
//! counts at most once and verification never reverts.

use tracing::{debug, info, instrument};

use crate::config::VouchConfig;
use crate::error::{GraphError, Result};
use crate::schema::{Gender, Legacy};
use crate::storage::GraphStore;

/// Manages legacy members and their vouch quorum.
#[derive(Clone)]
pub struct VouchConsensus {
    store: GraphStore,
    config: VouchConfig,
}

impl VouchConsensus {
    /// Create with the default quorum.
    pub fn new(store: GraphStore) -> Self {
        Self::with_config(store, VouchConfig::default())
    }

    pub fn with_config(store: GraphStore, config: VouchConfig) -> Self {
        Self { store, config }
    }

    pub fn threshold(&self) -> u32 {
        self.config.threshold
    }

    /// Create a legacy member. The creator is its first vouch.
    #[instrument(skip(self))]
    pub async fn create_legacy_member(
        &self,
        name: &str,
        gender: Gender,
        voter_uid: &str,
    ) -> Result<String> {
        let uid = self
            .store
            .insert_legacy(name, gender, voter_uid, self.config.threshold)
            .await?;
        info!("Legacy member {} created by {}", uid, voter_uid);
        Ok(uid)
    }

    /// Vouch for a legacy member and return whether it is now verified.
    ///
    /// A repeated vouch from the same voter changes nothing.
    #[instrument(skip(self))]
    pub async fn add_vouch(&self, legacy_uid: &str, voter_uid: &str) -> Result<bool> {
        let state = self
            .store
            .record_vouch(legacy_uid, voter_uid, self.config.threshold)
            .await?
            .ok_or_else(|| GraphError::legacy_not_found(legacy_uid))?;

        if !state.counted {
            debug!("{} already vouched for {}", voter_uid, legacy_uid);
        } else if state.verified && state.vouch_count == self.config.threshold {
            info!(
                "Legacy member {} verified with {} vouches",
                legacy_uid, state.vouch_count
            );
        }

        Ok(state.verified)
    }

    pub async fn get_legacy(&self, uid: &str) -> Result<Option<Legacy>> {
        self.store.get_legacy(uid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::setup_test_store;

    #[tokio::test]
    async fn test_amara_reaches_quorum() {
        let consensus = VouchConsensus::new(setup_test_store().await);

        let amara = consensus
            .create_legacy_member("Amara", Gender::Female, "u1")
            .await
            .unwrap();
        let legacy = consensus.get_legacy(&amara).await.unwrap().unwrap();
        assert_eq!(legacy.vouch_count, 1);
        assert!(!legacy.verified);

        assert!(!consensus.add_vouch(&amara, "u2").await.unwrap());

        // u1 already vouched when creating
        assert!(!consensus.add_vouch(&amara, "u1").await.unwrap());
        let legacy = consensus.get_legacy(&amara).await.unwrap().unwrap();
        assert_eq!(legacy.vouch_count, 2);

        assert!(consensus.add_vouch(&amara, "u3").await.unwrap());
        let legacy = consensus.get_legacy(&amara).await.unwrap().unwrap();
        assert_eq!(legacy.vouch_count, 3);
        assert!(legacy.verified);
        let voters: Vec<_> = legacy.vouched_by.iter().map(String::as_str).collect();
        assert_eq!(voters, vec!["u1", "u2", "u3"]);
    }

    #[tokio::test]
    async fn test_verified_is_monotonic() {
        let consensus = VouchConsensus::new(setup_test_store().await);
        let uid = consensus
            .create_legacy_member("Ravi", Gender::Male, "u1")
            .await
            .unwrap();

        for voter in ["u2", "u3", "u4", "u5", "u3"] {
            consensus.add_vouch(&uid, voter).await.unwrap();
            let legacy = consensus.get_legacy(&uid).await.unwrap().unwrap();
            assert_eq!(legacy.vouch_count as usize, legacy.vouched_by.len());
            assert_eq!(legacy.verified, legacy.vouch_count >= 3);
        }

        let legacy = consensus.get_legacy(&uid).await.unwrap().unwrap();
        assert_eq!(legacy.vouch_count, 5);
        assert!(legacy.verified);
    }

    #[tokio::test]
    async fn test_repeat_voter_leaves_state_unchanged() {
        let consensus = VouchConsensus::new(setup_test_store().await);
        let uid = consensus
            .create_legacy_member("Mira", Gender::Female, "u1")
            .await
            .unwrap();
        consensus.add_vouch(&uid, "u2").await.unwrap();
        let before = consensus.get_legacy(&uid).await.unwrap().unwrap();

        assert!(!consensus.add_vouch(&uid, "u2").await.unwrap());
        let after = consensus.get_legacy(&uid).await.unwrap().unwrap();
        assert_eq!(before.vouch_count, after.vouch_count);
        assert_eq!(before.vouched_by, after.vouched_by);
        assert_eq!(before.verified, after.verified);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_vouches_count_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::open(&dir.path().join("peepal.db"), 4)
            .await
            .unwrap();
        let consensus = VouchConsensus::new(store.clone());
        let uid = consensus
            .create_legacy_member("Amara", Gender::Female, "u1")
            .await
            .unwrap();

        let mut handles = Vec::new();
        for voter in ["u2", "u2", "u3", "u3", "u1"] {
            let consensus = consensus.clone();
            let uid = uid.clone();
            handles.push(tokio::spawn(async move {
                consensus.add_vouch(&uid, voter).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let legacy = consensus.get_legacy(&uid).await.unwrap().unwrap();
        assert_eq!(legacy.vouch_count, 3);
        assert_eq!(legacy.vouched_by.len(), 3);
        assert!(legacy.verified);
        store.close().await;
    }

    #[tokio::test]
    async fn test_unknown_legacy_is_not_found() {
        let consensus = VouchConsensus::new(setup_test_store().await);
        let err = consensus.add_vouch("missing", "u1").await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::NotFound { kind: crate::error::EntityKind::Legacy, .. }
        ));
    }

    #[tokio::test]
    async fn test_threshold_is_configurable() {
        let consensus =
            VouchConsensus::with_config(setup_test_store().await, VouchConfig { threshold: 2 });
        let uid = consensus
            .create_legacy_member("Sita", Gender::Female, "u1")
            .await
            .unwrap();
        assert!(consensus.add_vouch(&uid, "u2").await.unwrap());

        let solo =
            VouchConsensus::with_config(consensus.store.clone(), VouchConfig { threshold: 1 });
        let uid = solo
            .create_legacy_member("Hari", Gender::Male, "u1")
            .await
            .unwrap();
        assert!(solo.get_legacy(&uid).await.unwrap().unwrap().verified);
    }
}
