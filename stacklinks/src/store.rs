//! LinkStore - CRUD over the SQLite document store
//!
//! Every successful write is mirrored into the shared `WorkingSet`, so the
//! search controller sees it on its next pass without a refetch. The store
//! is also the `WorkingSetSource` that fills the working set in the first place.
//!
//! Blocking SQLite reads for the bulk fetch run on `spawn_blocking` threads of
//! the current runtime, or the global fallback runtime outside of one.

use crate::config::SearchConfig;
use crate::controller::{runtime_handle, SearchController};
use crate::database::Database;
use crate::interface::{Collection, Link, StacklinksError, Visibility, WorkingSetSource};
use crate::models::{CollectionPatch, LinkPatch, NewCollection, NewLink};
use crate::working_set::WorkingSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Thread-safe link store with SQLite + an in-memory working set
///
/// Concurrency Model:
/// - Database uses r2d2 connection pool (concurrent reads, no mutex blocking)
/// - Working set readers get `Arc` snapshots; writes copy-on-write
pub struct LinkStore {
    db: Arc<Database>,
    working_set: Arc<WorkingSet>,
}

impl LinkStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StacklinksError> {
        let db = Database::open(path)?;
        Ok(Self::from_database(db))
    }

    /// Create a store with an in-memory database (for testing)
    #[cfg(test)]
    pub(crate) fn new_in_memory() -> Result<Self, StacklinksError> {
        let db = Database::open_in_memory()?;
        Ok(Self::from_database(db))
    }

    fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(db),
            working_set: Arc::new(WorkingSet::new()),
        }
    }

    pub fn working_set(&self) -> &Arc<WorkingSet> {
        &self.working_set
    }

    /// Fill the working set for `owner_id` (fetch-once)
    pub async fn load(&self, owner_id: &str) -> Result<(), StacklinksError> {
        self.working_set.load(owner_id, self).await
    }

    /// A search controller over this store's working set
    pub fn controller(&self, config: SearchConfig) -> SearchController {
        SearchController::new(Arc::clone(&self.working_set), config)
    }

    /// Mirror only records belonging to the owner currently loaded
    fn is_loaded_owner(&self, owner_id: &str) -> bool {
        self.working_set.owner_id().as_deref() == Some(owner_id)
    }

    fn owned_collection(&self, caller_id: &str, id: &str) -> Result<Collection, StacklinksError> {
        let collection = self
            .db
            .fetch_collection(id)?
            .ok_or_else(|| StacklinksError::NotFound(format!("collection {id}")))?;
        if collection.owner_id != caller_id {
            return Err(StacklinksError::Forbidden(format!("collection {id}")));
        }
        Ok(collection)
    }

    fn owned_link(&self, caller_id: &str, id: &str) -> Result<Link, StacklinksError> {
        let link = self
            .db
            .fetch_link(id)?
            .ok_or_else(|| StacklinksError::NotFound(format!("link {id}")))?;
        if link.owner_id != caller_id {
            return Err(StacklinksError::Forbidden(format!("link {id}")));
        }
        Ok(link)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Collections
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn create_collection(&self, input: NewCollection) -> Result<Collection, StacklinksError> {
        let collection = input.into_collection()?;
        self.db.insert_collection(&collection)?;
        trace!(collection_id = %collection.id, "collection created");

        if self.is_loaded_owner(&collection.owner_id) {
            self.working_set.upsert_collection(collection.clone());
        }
        Ok(collection)
    }

    pub fn update_collection(
        &self,
        caller_id: &str,
        id: &str,
        patch: CollectionPatch,
    ) -> Result<Collection, StacklinksError> {
        let mut collection = self.owned_collection(caller_id, id)?;
        patch.apply(&mut collection)?;
        if !self.db.update_collection(&collection)? {
            return Err(StacklinksError::NotFound(format!("collection {id}")));
        }

        if self.is_loaded_owner(&collection.owner_id) {
            self.working_set.upsert_collection(collection.clone());
        }
        Ok(collection)
    }

    /// Delete a collection and every link in it
    pub fn delete_collection(&self, caller_id: &str, id: &str) -> Result<(), StacklinksError> {
        let collection = self.owned_collection(caller_id, id)?;
        self.db.delete_collection(id)?;
        debug!(collection_id = id, "collection deleted");

        if self.is_loaded_owner(&collection.owner_id) {
            self.working_set.remove_collection(id);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Links
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn add_link(&self, input: NewLink) -> Result<Link, StacklinksError> {
        let link = input.into_link()?;
        let collection = self
            .db
            .fetch_collection(&link.collection_id)?
            .ok_or_else(|| StacklinksError::NotFound(format!("collection {}", link.collection_id)))?;
        if collection.visibility == Visibility::Private && collection.owner_id != link.owner_id {
            return Err(StacklinksError::Forbidden(format!("collection {}", collection.id)));
        }

        self.db.insert_link(&link)?;
        trace!(link_id = %link.id, collection_id = %link.collection_id, "link added");

        if self.is_loaded_owner(&link.owner_id) {
            self.working_set.upsert_link(link.clone());
        }
        Ok(link)
    }

    pub fn update_link(&self, caller_id: &str, id: &str, patch: LinkPatch) -> Result<Link, StacklinksError> {
        let mut link = self.owned_link(caller_id, id)?;
        patch.apply(&mut link)?;
        if !self.db.update_link(&link)? {
            return Err(StacklinksError::NotFound(format!("link {id}")));
        }

        if self.is_loaded_owner(&link.owner_id) {
            self.working_set.upsert_link(link.clone());
        }
        Ok(link)
    }

    /// Flip a link between public and private
    pub fn toggle_link_visibility(&self, caller_id: &str, id: &str) -> Result<Link, StacklinksError> {
        let link = self.owned_link(caller_id, id)?;
        self.update_link(caller_id, id, LinkPatch::toggle_visibility(&link))
    }

    pub fn set_pinned(&self, caller_id: &str, id: &str, pinned: bool) -> Result<Link, StacklinksError> {
        self.update_link(
            caller_id,
            id,
            LinkPatch {
                pinned: Some(pinned),
                ..LinkPatch::default()
            },
        )
    }

    pub fn delete_link(&self, caller_id: &str, id: &str) -> Result<(), StacklinksError> {
        let link = self.owned_link(caller_id, id)?;
        self.db.delete_link(id)?;
        trace!(link_id = id, "link deleted");

        if self.is_loaded_owner(&link.owner_id) {
            self.working_set.remove_link(id);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl WorkingSetSource for LinkStore {
    async fn fetch_all_links_for_owner(&self, owner_id: &str) -> Result<Vec<Link>, StacklinksError> {
        let db = Arc::clone(&self.db);
        let owner_id = owner_id.to_string();
        let handle = runtime_handle().spawn_blocking(move || db.fetch_links_for_owner(&owner_id));
        match handle.await {
            Ok(Ok(links)) => Ok(links),
            Ok(Err(e)) => Err(StacklinksError::Fetch(e.to_string())),
            Err(_join_error) => Err(StacklinksError::Cancelled),
        }
    }

    async fn fetch_all_collections_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Collection>, StacklinksError> {
        let db = Arc::clone(&self.db);
        let owner_id = owner_id.to_string();
        let handle = runtime_handle().spawn_blocking(move || db.fetch_collections_for_owner(&owner_id));
        match handle.await {
            Ok(Ok(collections)) => Ok(collections),
            Ok(Err(e)) => Err(StacklinksError::Fetch(e.to_string())),
            Err(_join_error) => Err(StacklinksError::Cancelled),
        }
    }
}
