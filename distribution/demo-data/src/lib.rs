//! Sample links and collections for seeding a local store.
//!
//! The data lives in CSV files embedded at compile time. Tags are `;`
//! separated; visibility is `public`, `private` or `unlisted`.

use once_cell::sync::Lazy;
use serde::Deserialize;

const COLLECTIONS_CSV: &str = include_str!("../data/collections.csv");
const LINKS_CSV: &str = include_str!("../data/links.csv");

#[derive(Debug, Clone, Deserialize)]
pub struct DemoCollection {
    /// Referenced by `DemoLink::collection`
    pub key: String,
    pub name: String,
    pub description: String,
    tags: String,
    pub visibility: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoLink {
    pub collection: String,
    pub title: String,
    pub url: String,
    pub description: String,
    tags: String,
    pub visibility: String,
    pub pinned: bool,
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl DemoCollection {
    pub fn tags(&self) -> Vec<String> {
        split_tags(&self.tags)
    }
}

impl DemoLink {
    pub fn tags(&self) -> Vec<String> {
        split_tags(&self.tags)
    }
}

fn parse<T: for<'de> Deserialize<'de>>(data: &str) -> Result<Vec<T>, csv::Error> {
    csv::Reader::from_reader(data.as_bytes()).deserialize().collect()
}

static COLLECTIONS: Lazy<Result<Vec<DemoCollection>, String>> =
    Lazy::new(|| parse(COLLECTIONS_CSV).map_err(|e| e.to_string()));
static LINKS: Lazy<Result<Vec<DemoLink>, String>> =
    Lazy::new(|| parse(LINKS_CSV).map_err(|e| e.to_string()));

pub fn collections() -> Result<&'static [DemoCollection], String> {
    COLLECTIONS.as_deref().map_err(Clone::clone)
}

pub fn links() -> Result<&'static [DemoLink], String> {
    LINKS.as_deref().map_err(Clone::clone)
}
