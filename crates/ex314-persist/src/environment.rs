use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dbs::{FileStore, MemoryStore};
use crate::error::Result;
use crate::trait_client::PersistenceClient;

/// Where conversation data lives for this process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageEnvironment {
    /// Survives restarts; backed by JSON documents under `path`
    Durable { path: PathBuf },
    /// Lives only as long as the process
    Ephemeral,
}

impl Default for StorageEnvironment {
    fn default() -> Self {
        Self::Durable {
            path: PathBuf::from("data"),
        }
    }
}

/// Open the store matching `environment`
pub async fn open_store(environment: &StorageEnvironment) -> Result<Arc<dyn PersistenceClient>> {
    match environment {
        StorageEnvironment::Durable { path } => Ok(Arc::new(FileStore::open(path.clone()).await?)),
        StorageEnvironment::Ephemeral => {
            tracing::info!("Using in-memory store; nothing will be persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
