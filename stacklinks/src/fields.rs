//! Typed field accessors for scoring.
//!
//! Each searchable record type exposes a fixed table of `(name, weight, accessor)`
//! triples, resolved at compile time instead of looking fields up by name.

use crate::interface::{Collection, Link};

/// Value of one searchable field on one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    /// Missing or empty; skipped by the scorer
    Absent,
}

impl<'a> FieldValue<'a> {
    fn text(value: &'a str) -> Self {
        if value.is_empty() {
            FieldValue::Absent
        } else {
            FieldValue::Text(value)
        }
    }

    fn optional_text(value: Option<&'a str>) -> Self {
        value.map_or(FieldValue::Absent, Self::text)
    }

    fn list(values: &'a [String]) -> Self {
        if values.is_empty() {
            FieldValue::Absent
        } else {
            FieldValue::List(values)
        }
    }
}

/// A weighted field descriptor. Weight is in (0, 1].
pub struct FieldSpec<R> {
    pub name: &'static str,
    pub weight: f64,
    pub accessor: for<'a> fn(&'a R) -> FieldValue<'a>,
}

impl<R> FieldSpec<R> {
    pub fn value<'a>(&self, record: &'a R) -> FieldValue<'a> {
        (self.accessor)(record)
    }
}

impl<R> std::fmt::Debug for FieldSpec<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Records the ranker can score
pub trait Searchable: Sized + 'static {
    fn search_fields() -> &'static [FieldSpec<Self>];
}

fn link_title(link: &Link) -> FieldValue<'_> {
    FieldValue::text(&link.title)
}

fn link_description(link: &Link) -> FieldValue<'_> {
    FieldValue::optional_text(link.description.as_deref())
}

fn link_url(link: &Link) -> FieldValue<'_> {
    FieldValue::text(&link.url)
}

fn link_tags(link: &Link) -> FieldValue<'_> {
    FieldValue::list(&link.tags)
}

fn collection_name(collection: &Collection) -> FieldValue<'_> {
    FieldValue::text(&collection.name)
}

fn collection_description(collection: &Collection) -> FieldValue<'_> {
    FieldValue::optional_text(collection.description.as_deref())
}

fn collection_tags(collection: &Collection) -> FieldValue<'_> {
    FieldValue::list(&collection.tags)
}

/// Title matters most, then tags, description, url.
pub const LINK_FIELDS: &[FieldSpec<Link>] = &[
    FieldSpec { name: "title", weight: 1.0, accessor: link_title },
    FieldSpec { name: "description", weight: 0.8, accessor: link_description },
    FieldSpec { name: "url", weight: 0.7, accessor: link_url },
    FieldSpec { name: "tags", weight: 0.9, accessor: link_tags },
];

pub const COLLECTION_FIELDS: &[FieldSpec<Collection>] = &[
    FieldSpec { name: "name", weight: 1.0, accessor: collection_name },
    FieldSpec { name: "description", weight: 0.8, accessor: collection_description },
    FieldSpec { name: "tags", weight: 0.9, accessor: collection_tags },
];

impl Searchable for Link {
    fn search_fields() -> &'static [FieldSpec<Self>] {
        LINK_FIELDS
    }
}

impl Searchable for Collection {
    fn search_fields() -> &'static [FieldSpec<Self>] {
        COLLECTION_FIELDS
    }
}
