pub mod family;
pub mod legacy;
pub mod person;
pub mod relate;
pub mod status;
pub mod tree;

use anyhow::{Context, Result};
use peepal_graph::{GraphStore, Peepal, PeepalConfig};
use serde::Serialize;
use tracing::debug;

use crate::paths::{get_config_path, get_db_path};

/// An open graph for the duration of one command.
pub struct Session {
    pub peepal: Peepal,
    store: GraphStore,
}

impl Session {
    pub async fn open() -> Result<Self> {
        let config = PeepalConfig::load(&get_config_path())?;
        let db_path = get_db_path();
        debug!("Opening {} with {:?}", db_path.display(), config);

        let store = GraphStore::open(&db_path, config.database.max_connections)
            .await
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        Ok(Self {
            peepal: Peepal::new(store.clone(), &config),
            store,
        })
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub async fn close(self) {
        self.store.close().await;
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
