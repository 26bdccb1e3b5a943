//! Inputs for creating and editing links and collections.
//!
//! Validation happens here, before anything reaches the store or the working
//! set, so a stored link always has a title and a parseable url.

use crate::interface::{Collection, Link, StacklinksError, Visibility};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Drop `Some("")` so optional text fields are either meaningful or absent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Trim tags, drop empty ones, and remove case-insensitive duplicates.
/// The first spelling of a tag wins.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// LINKS
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewLink {
    #[validate(custom = "not_blank")]
    pub owner_id: String,
    #[validate(custom = "not_blank")]
    pub collection_id: String,
    #[validate(custom = "not_blank")]
    pub title: String,
    #[validate(url)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl NewLink {
    pub fn new(
        owner_id: impl Into<String>,
        collection_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            collection_id: collection_id.into(),
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    /// Validate and build the stored record with a fresh id and timestamp
    pub fn into_link(mut self) -> Result<Link, StacklinksError> {
        self.description = non_empty(self.description);
        self.image_url = non_empty(self.image_url);
        self.validate()?;

        Ok(Link {
            id: new_id(),
            collection_id: self.collection_id,
            owner_id: self.owner_id,
            url: self.url.trim().to_string(),
            title: self.title.trim().to_string(),
            description: self.description,
            image_url: self.image_url,
            tags: normalize_tags(self.tags),
            visibility: self.visibility,
            created_at: Utc::now(),
            updated_at: None,
            pinned: self.pinned,
        })
    }
}

/// Partial link update. Fields left `None` (or set to an empty string) keep
/// their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LinkPatch {
    pub title: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    pub description: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub visibility: Option<Visibility>,
    pub pinned: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl LinkPatch {
    /// Flip between public and private
    pub fn toggle_visibility(link: &Link) -> Self {
        Self {
            visibility: Some(link.visibility.toggled()),
            ..Self::default()
        }
    }

    pub fn apply(self, link: &mut Link) -> Result<(), StacklinksError> {
        let patch = LinkPatch {
            title: non_empty(self.title),
            url: non_empty(self.url),
            description: non_empty(self.description),
            image_url: non_empty(self.image_url),
            ..self
        };
        patch.validate()?;

        if let Some(title) = patch.title {
            link.title = title.trim().to_string();
        }
        if let Some(url) = patch.url {
            link.url = url.trim().to_string();
        }
        if let Some(description) = patch.description {
            link.description = Some(description);
        }
        if let Some(image_url) = patch.image_url {
            link.image_url = Some(image_url);
        }
        if let Some(visibility) = patch.visibility {
            link.visibility = visibility;
        }
        if let Some(pinned) = patch.pinned {
            link.pinned = pinned;
        }
        if let Some(tags) = patch.tags {
            link.tags = normalize_tags(tags);
        }
        link.updated_at = Some(Utc::now());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// COLLECTIONS
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCollection {
    #[validate(custom = "not_blank")]
    pub owner_id: String,
    #[validate(custom = "not_blank")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewCollection {
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn into_collection(mut self) -> Result<Collection, StacklinksError> {
        self.description = non_empty(self.description);
        self.image_url = non_empty(self.image_url);
        self.validate()?;

        Ok(Collection {
            id: new_id(),
            owner_id: self.owner_id,
            name: self.name.trim().to_string(),
            description: self.description,
            image_url: self.image_url,
            tags: normalize_tags(self.tags),
            visibility: self.visibility,
            created_at: Utc::now(),
            updated_at: None,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub visibility: Option<Visibility>,
    pub tags: Option<Vec<String>>,
}

impl CollectionPatch {
    pub fn apply(self, collection: &mut Collection) -> Result<(), StacklinksError> {
        if let Some(name) = non_empty(self.name) {
            collection.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            // Collections may clear their description explicitly
            collection.description = non_empty(Some(description));
        }
        if let Some(image_url) = self.image_url {
            collection.image_url = non_empty(Some(image_url));
        }
        if let Some(visibility) = self.visibility {
            collection.visibility = visibility;
        }
        if let Some(tags) = self.tags {
            collection.tags = normalize_tags(tags);
        }
        collection.updated_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_link_defaults() {
        let link = NewLink::new("u1", "c1", "  React Tutorial ", "https://react.dev")
            .into_link()
            .unwrap();
        assert_eq!(link.title, "React Tutorial");
        assert_eq!(link.visibility, Visibility::Public);
        assert!(link.description.is_none());
        assert!(link.tags.is_empty());
        assert!(!link.pinned);
        assert!(Uuid::parse_str(&link.id).is_ok());
    }

    #[test]
    fn test_new_link_requires_title_and_url() {
        let err = NewLink::new("u1", "c1", "   ", "https://react.dev").into_link();
        assert!(matches!(err, Err(StacklinksError::Validation(_))));

        let err = NewLink::new("u1", "c1", "React", "not a url").into_link();
        assert!(matches!(err, Err(StacklinksError::Validation(_))));

        let err = NewLink::new("", "c1", "React", "https://react.dev").into_link();
        assert!(matches!(err, Err(StacklinksError::Validation(_))));
    }

    #[test]
    fn test_new_link_empty_image_url_is_absent() {
        let mut input = NewLink::new("u1", "c1", "React", "https://react.dev");
        input.image_url = Some(String::new());
        let link = input.into_link().unwrap();
        assert!(link.image_url.is_none());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(vec![
            " Rust ".into(),
            "".into(),
            "rust".into(),
            "async".into(),
            "   ".into(),
        ]);
        assert_eq!(tags, vec!["Rust", "async"]);
    }

    #[test]
    fn test_link_patch_ignores_empty_strings() {
        let mut link = NewLink::new("u1", "c1", "React", "https://react.dev")
            .with_description("docs")
            .into_link()
            .unwrap();
        LinkPatch {
            title: Some(String::new()),
            url: Some("".into()),
            description: Some("Official docs".into()),
            pinned: Some(true),
            ..LinkPatch::default()
        }
        .apply(&mut link)
        .unwrap();

        assert_eq!(link.title, "React");
        assert_eq!(link.url, "https://react.dev");
        assert_eq!(link.description.as_deref(), Some("Official docs"));
        assert!(link.pinned);
        assert!(link.updated_at.is_some());
    }

    #[test]
    fn test_link_patch_rejects_bad_url() {
        let mut link = NewLink::new("u1", "c1", "React", "https://react.dev").into_link().unwrap();
        let result = LinkPatch { url: Some("::nope".into()), ..LinkPatch::default() }.apply(&mut link);
        assert!(matches!(result, Err(StacklinksError::Validation(_))));
        assert_eq!(link.url, "https://react.dev");
    }

    #[test]
    fn test_toggle_visibility() {
        let mut link = NewLink::new("u1", "c1", "React", "https://react.dev").into_link().unwrap();
        LinkPatch::toggle_visibility(&link).apply(&mut link).unwrap();
        assert_eq!(link.visibility, Visibility::Private);
        LinkPatch::toggle_visibility(&link).apply(&mut link).unwrap();
        assert_eq!(link.visibility, Visibility::Public);
    }

    #[test]
    fn test_new_collection() {
        let collection = NewCollection::new("u1", "Recipes")
            .with_description("")
            .with_tags(["food", "Food"])
            .with_visibility(Visibility::Unlisted)
            .into_collection()
            .unwrap();
        assert_eq!(collection.name, "Recipes");
        assert!(collection.description.is_none());
        assert_eq!(collection.tags, vec!["food"]);

        assert!(NewCollection::new("u1", " ").into_collection().is_err());
    }

    #[test]
    fn test_collection_patch() {
        let mut collection = NewCollection::new("u1", "Recipes")
            .with_description("weeknight meals")
            .into_collection()
            .unwrap();
        assert!(collection.image_url.is_none());
        CollectionPatch {
            name: Some("".into()),
            description: Some("".into()),
            image_url: Some("https://example.com/cover.png".into()),
            visibility: Some(Visibility::Private),
            tags: Some(vec!["dinner".into()]),
        }
        .apply(&mut collection)
        .unwrap();
        assert_eq!(collection.name, "Recipes");
        assert!(collection.description.is_none());
        assert_eq!(collection.image_url.as_deref(), Some("https://example.com/cover.png"));
        assert_eq!(collection.visibility, Visibility::Private);
        assert_eq!(collection.tags, vec!["dinner"]);
    }
}
