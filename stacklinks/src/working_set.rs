//! The user's working set: every link and collection they own, held in memory.
//!
//! Fetched once per owner and kept in sync by local mutations afterwards, so
//! typing in the search box never touches the document store. Readers get
//! `Arc` snapshots; writers copy-on-write and bump a revision counter that the
//! search controller watches.

use crate::interface::{Collection, Link, StacklinksError, WorkingSetSource};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, trace, warn};

#[derive(Debug, Default)]
struct State {
    owner_id: Option<String>,
    links: Arc<Vec<Link>>,
    collections: Arc<Vec<Collection>>,
    loading: bool,
    error: Option<String>,
    has_fetched: bool,
}

/// Point-in-time view of the working set
#[derive(Debug, Clone, Default)]
pub struct WorkingSetView {
    pub owner_id: Option<String>,
    pub links: Arc<Vec<Link>>,
    pub collections: Arc<Vec<Collection>>,
    pub loading: bool,
    pub error: Option<String>,
    pub has_fetched: bool,
}

#[derive(Debug)]
pub struct WorkingSet {
    state: RwLock<State>,
    revision: watch::Sender<u64>,
}

impl Default for WorkingSet {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkingSet {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(State::default()),
            revision,
        }
    }

    /// Fetch the owner's links and collections, both at once.
    ///
    /// A no-op if this owner's data is already loaded. A call made while a
    /// load for the same owner is in flight waits for that load and shares its
    /// outcome. Switching owners discards the previous owner's data first. On
    /// failure the error is recorded and the next call retries.
    pub async fn load(
        &self,
        owner_id: &str,
        source: &dyn WorkingSetSource,
    ) -> Result<(), StacklinksError> {
        let in_flight = {
            let mut state = self.state.write();
            let same_owner = state.owner_id.as_deref() == Some(owner_id);
            if same_owner && state.has_fetched {
                return Ok(());
            }
            if same_owner && state.loading {
                Some(self.revision.subscribe())
            } else {
                if !same_owner {
                    *state = State::default();
                    state.owner_id = Some(owner_id.to_string());
                }
                state.loading = true;
                state.error = None;
                None
            }
        };
        if let Some(rx) = in_flight {
            return self.wait_for_load(owner_id, rx).await;
        }
        self.bump();

        let result = futures::try_join!(
            source.fetch_all_links_for_owner(owner_id),
            source.fetch_all_collections_for_owner(owner_id),
        );

        let outcome = {
            let mut state = self.state.write();
            if state.owner_id.as_deref() != Some(owner_id) || !state.loading {
                // Invalidated while the fetch was in flight
                return Err(StacklinksError::Cancelled);
            }
            state.loading = false;
            match result {
                Ok((links, collections)) => {
                    info!(
                        owner_id,
                        links = links.len(),
                        collections = collections.len(),
                        "working set loaded"
                    );
                    state.links = Arc::new(links);
                    state.collections = Arc::new(collections);
                    state.has_fetched = true;
                    Ok(())
                }
                Err(e) => {
                    warn!(owner_id, error = %e, "working set fetch failed");
                    state.error = Some(e.to_string());
                    Err(e)
                }
            }
        };
        self.bump();
        outcome
    }

    async fn wait_for_load(
        &self,
        owner_id: &str,
        mut revision: watch::Receiver<u64>,
    ) -> Result<(), StacklinksError> {
        loop {
            {
                let state = self.state.read();
                if state.owner_id.as_deref() != Some(owner_id) {
                    return Err(StacklinksError::Cancelled);
                }
                if !state.loading {
                    return match (&state.error, state.has_fetched) {
                        (Some(error), _) => Err(StacklinksError::Fetch(error.clone())),
                        (None, true) => Ok(()),
                        (None, false) => Err(StacklinksError::Cancelled),
                    };
                }
            }
            if revision.changed().await.is_err() {
                return Err(StacklinksError::Cancelled);
            }
        }
    }

    /// Replace the contents outright, as if a fetch for `owner_id` had succeeded
    pub fn replace(&self, owner_id: &str, links: Vec<Link>, collections: Vec<Collection>) {
        {
            let mut state = self.state.write();
            *state = State {
                owner_id: Some(owner_id.to_string()),
                links: Arc::new(links),
                collections: Arc::new(collections),
                loading: false,
                error: None,
                has_fetched: true,
            };
        }
        self.bump();
    }

    /// Drop everything, e.g. on logout. The next `load` fetches again.
    pub fn invalidate(&self) {
        {
            let mut state = self.state.write();
            if let Some(owner_id) = state.owner_id.as_deref() {
                info!(owner_id, "working set invalidated");
            }
            *state = State::default();
        }
        self.bump();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn view(&self) -> WorkingSetView {
        let state = self.state.read();
        WorkingSetView {
            owner_id: state.owner_id.clone(),
            links: Arc::clone(&state.links),
            collections: Arc::clone(&state.collections),
            loading: state.loading,
            error: state.error.clone(),
            has_fetched: state.has_fetched,
        }
    }

    pub fn links(&self) -> Arc<Vec<Link>> {
        Arc::clone(&self.state.read().links)
    }

    pub fn collections(&self) -> Arc<Vec<Collection>> {
        Arc::clone(&self.state.read().collections)
    }

    pub fn owner_id(&self) -> Option<String> {
        self.state.read().owner_id.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn has_fetched(&self) -> bool {
        self.state.read().has_fetched
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    pub fn find_link(&self, id: &str) -> Option<Link> {
        self.state.read().links.iter().find(|l| l.id == id).cloned()
    }

    pub fn find_collection(&self, id: &str) -> Option<Collection> {
        self.state.read().collections.iter().find(|c| c.id == id).cloned()
    }

    /// Links of one collection, pinned first, otherwise in fetch order
    pub fn links_in_collection(&self, collection_id: &str) -> Vec<Link> {
        let mut links: Vec<Link> = self
            .state
            .read()
            .links
            .iter()
            .filter(|l| l.collection_id == collection_id)
            .cloned()
            .collect();
        links.sort_by_key(|l| !l.pinned);
        links
    }

    /// Receiver that observes every change to the working set
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Local mutations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Insert a new link at the end, or replace the one with the same id in place
    pub fn upsert_link(&self, link: Link) {
        {
            let mut state = self.state.write();
            let links = Arc::make_mut(&mut state.links);
            trace!(link_id = %link.id, "working set upsert link");
            match links.iter_mut().find(|l| l.id == link.id) {
                Some(existing) => *existing = link,
                None => links.push(link),
            }
        }
        self.bump();
    }

    pub fn remove_link(&self, id: &str) -> Option<Link> {
        let removed = {
            let mut state = self.state.write();
            let position = state.links.iter().position(|l| l.id == id)?;
            trace!(link_id = id, "working set remove link");
            Arc::make_mut(&mut state.links).remove(position)
        };
        self.bump();
        Some(removed)
    }

    pub fn upsert_collection(&self, collection: Collection) {
        {
            let mut state = self.state.write();
            let collections = Arc::make_mut(&mut state.collections);
            trace!(collection_id = %collection.id, "working set upsert collection");
            match collections.iter_mut().find(|c| c.id == collection.id) {
                Some(existing) => *existing = collection,
                None => collections.push(collection),
            }
        }
        self.bump();
    }

    /// Remove a collection together with the links it holds
    pub fn remove_collection(&self, id: &str) -> Option<Collection> {
        let removed = {
            let mut state = self.state.write();
            let position = state.collections.iter().position(|c| c.id == id)?;
            trace!(collection_id = id, "working set remove collection");
            let removed = Arc::make_mut(&mut state.collections).remove(position);
            if state.links.iter().any(|l| l.collection_id == id) {
                Arc::make_mut(&mut state.links).retain(|l| l.collection_id != id);
            }
            removed
        };
        self.bump();
        Some(removed)
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }
}
