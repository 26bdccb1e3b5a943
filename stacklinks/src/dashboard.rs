//! Dashboard summary computed from the working set.

use crate::interface::{Collection, Link, Visibility};
use crate::working_set::WorkingSet;
use std::collections::HashMap;

pub const RECENT_LINKS: usize = 4;
pub const TOP_COLLECTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionCount {
    pub collection: Collection,
    pub links: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total_links: usize,
    pub total_collections: usize,
    pub public_links: usize,
    pub private_links: usize,
    /// Newest first
    pub recent_links: Vec<Link>,
    /// Most links first; ties keep fetch order
    pub top_collections: Vec<CollectionCount>,
}

impl DashboardStats {
    pub fn from_working_set(working_set: &WorkingSet) -> Self {
        let view = working_set.view();
        Self::compute(&view.links, &view.collections)
    }

    pub fn compute(links: &[Link], collections: &[Collection]) -> Self {
        let count_with = |v: Visibility| links.iter().filter(|l| l.visibility == v).count();

        let mut recent: Vec<&Link> = links.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let recent_links = recent.into_iter().take(RECENT_LINKS).cloned().collect();

        let mut per_collection: HashMap<&str, usize> = HashMap::new();
        for link in links {
            *per_collection.entry(link.collection_id.as_str()).or_default() += 1;
        }
        let mut top_collections: Vec<CollectionCount> = collections
            .iter()
            .map(|c| CollectionCount {
                collection: c.clone(),
                links: per_collection.get(c.id.as_str()).copied().unwrap_or(0),
            })
            .collect();
        top_collections.sort_by(|a, b| b.links.cmp(&a.links));
        top_collections.truncate(TOP_COLLECTIONS);

        Self {
            total_links: links.len(),
            total_collections: collections.len(),
            public_links: count_with(Visibility::Public),
            private_links: count_with(Visibility::Private),
            recent_links,
            top_collections,
        }
    }
}
