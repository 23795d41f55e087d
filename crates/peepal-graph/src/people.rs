//! Person registry: signup, activation and lookups.

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::schema::{NewPerson, Person};
use crate::storage::GraphStore;

/// Creates and looks up persons.
#[derive(Clone)]
pub struct PersonRegistry {
    store: GraphStore,
}

impl PersonRegistry {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    /// Upsert a profile by uid. New persons start out inactive.
    #[instrument(skip(self, data), fields(uid = %data.uid))]
    pub async fn create_profile(&self, data: &NewPerson) -> Result<()> {
        self.store.upsert_person(data).await?;
        debug!("Profile stored");
        Ok(())
    }

    /// Mark a person active. Unknown uids are not an error.
    ///
    /// Returns whether the person transitioned just now.
    #[instrument(skip(self))]
    pub async fn activate(&self, uid: &str) -> Result<bool> {
        let transitioned = self.store.activate_person(uid).await?;
        if transitioned {
            info!("Person {} activated", uid);
        } else {
            debug!("Activation of {} had no effect", uid);
        }
        Ok(transitioned)
    }

    pub async fn exists(&self, uid: &str) -> Result<bool> {
        self.store.person_exists(uid).await
    }

    pub async fn get(&self, uid: &str) -> Result<Option<Person>> {
        self.store.get_person(uid).await
    }
}
