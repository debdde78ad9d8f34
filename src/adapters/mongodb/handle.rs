//! Handle to an activated storage plugin's database

use super::config::OPERATION_TIMEOUT;
use crate::domain::context::OpContext;
use crate::domain::errors::SvckitError;
use crate::domain::ids::PluginId;
use crate::domain::Result;
use mongodb::bson::Document;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use serde::Serialize;

/// Database operations of a connected storage plugin
///
/// Only [`MongoStore::activate`](super::MongoStore) hands these out, so every
/// handle refers to a client that answered a ping at activation time. Clones
/// share the driver's connection pool.
#[derive(Debug, Clone)]
pub struct MongoHandle {
    plugin_id: PluginId,
    database: Database,
}

impl MongoHandle {
    pub(super) fn new(plugin_id: PluginId, database: Database) -> Self {
        Self {
            plugin_id,
            database,
        }
    }

    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.database.collection(name)
    }

    /// Creates an index on `collection`, creating the collection if needed
    ///
    /// Bounded by a fixed five second timeout. Failures are logged and
    /// reported as `false`; an index that already exists with the same
    /// definition counts as success.
    pub async fn create_index(&self, collection: &str, keys: Document, unique: bool) -> bool {
        let model = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(unique).build())
            .build();

        let coll = self.database.collection::<Document>(collection);
        match tokio::time::timeout(OPERATION_TIMEOUT, coll.create_index(model)).await {
            Ok(Ok(created)) => {
                tracing::info!(
                    plugin = %self.plugin_id,
                    collection,
                    index = %created.index_name,
                    unique,
                    "Index created"
                );
                true
            }
            Ok(Err(e)) => {
                tracing::error!(
                    plugin = %self.plugin_id,
                    collection,
                    error = %e,
                    "Failed to create index"
                );
                false
            }
            Err(_) => {
                tracing::error!(
                    plugin = %self.plugin_id,
                    collection,
                    timeout_secs = OPERATION_TIMEOUT.as_secs(),
                    "Index creation timed out"
                );
                false
            }
        }
    }

    /// Inserts one document
    ///
    /// # Errors
    ///
    /// Returns the driver error unchanged ([`SvckitError::Operation`]),
    /// or `Cancelled`/`DeadlineExceeded` from `ctx`.
    pub async fn insert_one<T>(&self, ctx: &OpContext, collection: &str, document: &T) -> Result<()>
    where
        T: Serialize + Send + Sync,
    {
        let coll = self.collection::<T>(collection);
        ctx.run(async {
            coll.insert_one(document).await?;
            Ok::<(), SvckitError>(())
        })
        .await
        .inspect_err(|e| {
            tracing::error!(plugin = %self.plugin_id, collection, error = %e, "Insert failed");
        })
    }

    /// Inserts a batch of documents
    ///
    /// An empty batch succeeds without contacting the server.
    ///
    /// # Errors
    ///
    /// Same as [`insert_one`](Self::insert_one).
    pub async fn insert_many<T>(&self, ctx: &OpContext, collection: &str, documents: &[T]) -> Result<()>
    where
        T: Serialize + Send + Sync,
    {
        if documents.is_empty() {
            tracing::debug!(plugin = %self.plugin_id, collection, "Empty batch, nothing to insert");
            return Ok(());
        }

        let coll = self.collection::<T>(collection);
        ctx.run(async {
            let result = coll.insert_many(documents).await?;
            tracing::debug!(
                plugin = %self.plugin_id,
                collection,
                inserted = result.inserted_ids.len(),
                "Batch inserted"
            );
            Ok::<(), SvckitError>(())
        })
        .await
        .inspect_err(|e| {
            tracing::error!(
                plugin = %self.plugin_id,
                collection,
                count = documents.len(),
                error = %e,
                "Batch insert failed"
            );
        })
    }
}
