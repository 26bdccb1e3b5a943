//! Shared fixtures for unit tests. Only compiled when running tests.

use crate::interface::{Collection, Link, StacklinksError, Visibility, WorkingSetSource};
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A public link in collection `c1` owned by `u1`
pub fn link(id: &str, title: &str) -> Link {
    Link {
        id: id.into(),
        collection_id: "c1".into(),
        owner_id: "u1".into(),
        url: format!("https://example.com/{id}"),
        title: title.into(),
        description: None,
        image_url: None,
        tags: Vec::new(),
        visibility: Visibility::Public,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        updated_at: None,
        pinned: false,
    }
}

pub fn link_in(id: &str, title: &str, collection_id: &str) -> Link {
    Link {
        collection_id: collection_id.into(),
        ..link(id, title)
    }
}

/// A public collection owned by `u1`
pub fn collection(id: &str, name: &str) -> Collection {
    Collection {
        id: id.into(),
        owner_id: "u1".into(),
        name: name.into(),
        description: None,
        image_url: None,
        tags: Vec::new(),
        visibility: Visibility::Public,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        updated_at: None,
    }
}

/// In-memory document store that counts how often it is asked for data.
#[derive(Default)]
pub struct FakeSource {
    pub links: Vec<Link>,
    pub collections: Vec<Collection>,
    pub fail: bool,
    pub delay: Option<Duration>,
    pub link_fetches: AtomicUsize,
    pub collection_fetches: AtomicUsize,
}

impl FakeSource {
    pub fn new(links: Vec<Link>, collections: Vec<Collection>) -> Self {
        Self { links, collections, ..Self::default() }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn fetches(&self) -> usize {
        self.link_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl WorkingSetSource for FakeSource {
    async fn fetch_all_links_for_owner(&self, owner_id: &str) -> Result<Vec<Link>, StacklinksError> {
        self.link_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(StacklinksError::Fetch("store unavailable".into()));
        }
        Ok(self.links.iter().filter(|l| l.owner_id == owner_id).cloned().collect())
    }

    async fn fetch_all_collections_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Collection>, StacklinksError> {
        self.collection_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(StacklinksError::Fetch("store unavailable".into()));
        }
        Ok(self.collections.iter().filter(|c| c.owner_id == owner_id).cloned().collect())
    }
}
