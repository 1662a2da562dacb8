//! Application state wiring the memory graph to its storage backend.
//!
//! The graph is generic over its `KvStore`; `AppState` pins it to
//! [`StoreBackend`], which is SQLite in normal runs and an in-memory map
//! under `--ephemeral`.

use std::path::PathBuf;
use std::sync::Arc;

use relmem_core::graph::MemoryGraph;
use relmem_core::storage::kv_store::KvStore;
use relmem_core::storage::memory_kv::InMemoryKvStore;
use relmem_infra::config::load_memory_config;
use relmem_infra::filesystem::resolve_data_dir;
use relmem_infra::sqlite::kv::SqliteKvStore;
use relmem_infra::sqlite::pool::DatabasePool;
use relmem_types::error::RepositoryError;

/// Storage chosen at startup.
pub enum StoreBackend {
    Sqlite(SqliteKvStore),
    Memory(InMemoryKvStore),
}

impl KvStore for StoreBackend {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, RepositoryError> {
        match self {
            StoreBackend::Sqlite(store) => store.get(key).await,
            StoreBackend::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), RepositoryError> {
        match self {
            StoreBackend::Sqlite(store) => store.set(key, value).await,
            StoreBackend::Memory(store) => store.set(key, value).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        match self {
            StoreBackend::Sqlite(store) => store.delete(key).await,
            StoreBackend::Memory(store) => store.delete(key).await,
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>, RepositoryError> {
        match self {
            StoreBackend::Sqlite(store) => store.list_keys().await,
            StoreBackend::Memory(store) => store.list_keys().await,
        }
    }
}

pub type ConcreteMemoryGraph = MemoryGraph<StoreBackend>;

/// Shared application state used by every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<ConcreteMemoryGraph>,
    pub data_dir: PathBuf,
    pub ephemeral: bool,
}

impl AppState {
    /// Resolve the data directory, load `config.toml`, open storage and
    /// load the graph.
    pub async fn init(ephemeral: bool) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_memory_config(&data_dir).await;

        let backend = if ephemeral {
            tracing::info!("Running with in-memory storage; nothing will be saved");
            StoreBackend::Memory(InMemoryKvStore::new())
        } else {
            let pool = DatabasePool::open_in(&data_dir).await?;
            StoreBackend::Sqlite(SqliteKvStore::new(pool))
        };

        let graph = MemoryGraph::load(backend, config).await;

        Ok(Self {
            graph: Arc::new(graph),
            data_dir,
            ephemeral,
        })
    }
}
