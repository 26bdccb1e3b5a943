//! Stacklinks Public Interface
//!
//! Record types consumed by the search engine, the result types it publishes,
//! the crate error type, and the collaborator trait that supplies the working set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Who can see a link or collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Unlisted,
}

impl Visibility {
    /// Value stored in the `visibility` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Unlisted => "unlisted",
        }
    }

    /// Public flips to private; private and unlisted flip to public
    pub fn toggled(self) -> Self {
        match self {
            Visibility::Public => Visibility::Private,
            Visibility::Private | Visibility::Unlisted => Visibility::Public,
        }
    }

    pub fn from_database(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            "unlisted" => Some(Visibility::Unlisted),
            _ => None,
        }
    }
}

/// Lifecycle of the debounced search controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    /// Empty query, no results
    #[default]
    Idle,
    /// Query changed, timer pending
    Debouncing,
    /// Timer fired, ranking in progress
    Searching,
    /// Results reflect the latest query
    Settled,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// A saved link. `title` and `url` are always present on a stored link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub collection_id: String,
    pub owner_id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
}

/// A named group of links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Ranked links and collections for one query, descending by score.
/// Rebuilt wholesale on every settled query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResultSet {
    pub links: Vec<Link>,
    pub collections: Vec<Collection>,
}

impl SearchResultSet {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.collections.is_empty()
    }
}

/// What the rendering layer observes from the controller
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot {
    pub phase: SearchPhase,
    /// Query text as last typed (untrimmed)
    pub query: String,
    pub results: Arc<SearchResultSet>,
    /// True from the moment the query changes until the debounce timer fires
    pub searching: bool,
    /// Working set fetch in flight
    pub loading: bool,
    /// Last working set fetch failure
    pub error: Option<String>,
}

/// Error type for Stacklinks operations
#[derive(Debug, Error)]
pub enum StacklinksError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Fetch failed: {0}")]
    Fetch(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Operation cancelled")]
    Cancelled,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLABORATOR INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// Bulk source of a user's working set (the external document store).
///
/// Both fetches are one-shot and unpaginated. The search engine never calls
/// them while the user types; `WorkingSet::load` calls them once per session.
#[async_trait::async_trait]
pub trait WorkingSetSource: Send + Sync {
    /// Every link owned by the user, regardless of collection
    async fn fetch_all_links_for_owner(&self, owner_id: &str) -> Result<Vec<Link>, StacklinksError>;

    /// Every collection owned by the user
    async fn fetch_all_collections_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Collection>, StacklinksError>;
}

impl From<crate::database::DatabaseError> for StacklinksError {
    fn from(e: crate::database::DatabaseError) -> Self {
        StacklinksError::Database(e.to_string())
    }
}

impl From<validator::ValidationErrors> for StacklinksError {
    fn from(e: validator::ValidationErrors) -> Self {
        StacklinksError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_database_roundtrip() {
        for v in [Visibility::Public, Visibility::Private, Visibility::Unlisted] {
            assert_eq!(Visibility::from_database(v.as_str()), Some(v));
        }
        assert_eq!(Visibility::from_database("secret"), None);
    }

    #[test]
    fn test_link_deserializes_with_missing_optional_fields() {
        let json = r#"{
            "id": "l1",
            "collectionId": "c1",
            "ownerId": "u1",
            "url": "https://react.dev",
            "title": "React Tutorial",
            "visibility": "unlisted",
            "createdAt": "2024-05-01T10:00:00Z"
        }"#;
        let link: Link = serde_json::from_str(json).unwrap();
        assert_eq!(link.visibility, Visibility::Unlisted);
        assert!(link.tags.is_empty());
        assert!(link.description.is_none());
        assert!(!link.pinned);
    }
}
