//! Weighted multi-field relevance scoring and result ranking.
//!
//! Every field on a record is scored in tiers: exact equality, word-boundary
//! match, substring containment, then fuzzy subsequence. Tier ceilings never
//! overlap, so a stronger tier always outranks a weaker one on the same field.
//! Field scores are multiplied by the field weight and summed.

use crate::candidate::ScoredCandidate;
use crate::config::SearchConfig;
use crate::fields::{FieldSpec, FieldValue, Searchable};
use crate::interface::{Collection, Link, SearchResultSet};
use crate::matching::{char_offset, fuzzy_match_normalized, tokenize_query, word_boundary_pattern};
use regex::Regex;

/// Field value equals the term
pub const EXACT_MATCH_SCORE: f64 = 100.0;
/// Term delimited by word boundaries inside the field
pub const WORD_BOUNDARY_SCORE: f64 = 80.0;
/// Term contained anywhere; scaled down by position
pub const SUBSTRING_SCORE: f64 = 50.0;
/// A substring at the very end keeps 70% of `SUBSTRING_SCORE`
pub const SUBSTRING_POSITION_PENALTY: f64 = 0.3;
/// Multiplier for a fuzzy score on a text field
pub const FUZZY_TEXT_SCORE: f64 = 30.0;
/// Fuzzy matching only runs while the term scores below this
pub const FUZZY_FALLBACK_BELOW: f64 = 30.0;

pub const TAG_EXACT_SCORE: f64 = 100.0;
/// Tag contains the term
pub const TAG_CONTAINS_SCORE: f64 = 70.0;
/// Term contains the tag
pub const TAG_WITHIN_TERM_SCORE: f64 = 50.0;
pub const TAG_FUZZY_SCORE: f64 = 40.0;

/// One lowercased query term with its precompiled boundary pattern
#[derive(Debug, Clone)]
struct QueryTerm {
    text: String,
    boundary: Option<Regex>,
}

impl QueryTerm {
    fn new(text: String) -> Self {
        let boundary = word_boundary_pattern(&text);
        Self { text, boundary }
    }

    fn matches_word_boundary(&self, value: &str) -> bool {
        self.boundary.as_ref().map_or(false, |re| re.is_match(value))
    }
}

/// A parsed search query: lowercase, whitespace-split, empty terms dropped.
///
/// Parsing compiles each term's boundary pattern once so scoring a whole
/// working set does not recompile it per record.
#[derive(Debug, Clone)]
pub struct Query {
    terms: Vec<QueryTerm>,
}

impl Query {
    pub fn parse(input: &str) -> Self {
        Self {
            terms: tokenize_query(input).into_iter().map(QueryTerm::new).collect(),
        }
    }

    /// No terms: the search is a no-op
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.text.as_str())
    }
}

/// Score a record against a raw search string using its default field table.
pub fn relevance_score<R: Searchable>(record: &R, search_term: &str) -> f64 {
    score_record(
        record,
        &Query::parse(search_term),
        R::search_fields(),
        &SearchConfig::default(),
    )
}

/// Weighted sum of field scores. Zero when nothing matched or the query is empty.
pub fn score_record<R>(
    record: &R,
    query: &Query,
    fields: &[FieldSpec<R>],
    config: &SearchConfig,
) -> f64 {
    if query.is_empty() {
        return 0.0;
    }

    fields
        .iter()
        .map(|field| {
            let score = match field.value(record) {
                FieldValue::Text(value) => score_text_field(value, query, config),
                FieldValue::List(values) => score_list_field(values, query),
                FieldValue::Absent => 0.0,
            };
            score * field.weight
        })
        .sum()
}

/// Average of per-term scores, with a bonus when every term matched well.
fn score_text_field(value: &str, query: &Query, config: &SearchConfig) -> f64 {
    let normalized = value.to_lowercase();
    let value_len = normalized.chars().count() as f64;

    let term_scores: Vec<f64> = query
        .terms
        .iter()
        .map(|term| score_text_term(&normalized, value_len, term))
        .collect();
    if term_scores.is_empty() {
        return 0.0;
    }

    let mut field_score = term_scores.iter().sum::<f64>() / term_scores.len() as f64;
    if term_scores.iter().all(|&s| s > config.good_match_threshold) {
        field_score *= config.all_terms_bonus;
    }
    field_score
}

/// Best tier for one term on one lowercased text value. Tiers take the max,
/// they are never summed.
fn score_text_term(value: &str, value_len: f64, term: &QueryTerm) -> f64 {
    if value == term.text {
        return EXACT_MATCH_SCORE;
    }

    let mut score: f64 = 0.0;
    if term.matches_word_boundary(value) {
        score = WORD_BOUNDARY_SCORE;
    }

    if let Some(byte_pos) = value.find(term.text.as_str()) {
        let position = char_offset(value, byte_pos) as f64;
        let position_factor = 1.0 - (position / value_len) * SUBSTRING_POSITION_PENALTY;
        score = score.max(SUBSTRING_SCORE * position_factor);
    }

    if score < FUZZY_FALLBACK_BELOW {
        let fuzzy = fuzzy_match_normalized(value, &term.text);
        if fuzzy.matched {
            score = score.max(FUZZY_TEXT_SCORE * fuzzy.score);
        }
    }

    score
}

/// Best score of any tag against any term. Empty tags are ignored.
fn score_list_field(values: &[String], query: &Query) -> f64 {
    values
        .iter()
        .filter(|tag| !tag.is_empty())
        .map(|tag| {
            let tag = tag.to_lowercase();
            query
                .terms
                .iter()
                .map(|term| score_tag_term(&tag, &term.text))
                .fold(0.0, f64::max)
        })
        .fold(0.0, f64::max)
}

fn score_tag_term(tag: &str, term: &str) -> f64 {
    if tag == term {
        TAG_EXACT_SCORE
    } else if tag.contains(term) {
        TAG_CONTAINS_SCORE
    } else if term.contains(tag) {
        TAG_WITHIN_TERM_SCORE
    } else {
        let fuzzy = fuzzy_match_normalized(tag, term);
        if fuzzy.matched {
            TAG_FUZZY_SCORE * fuzzy.score
        } else {
            0.0
        }
    }
}

/// Score every record, drop non-matches, sort descending.
/// Equal scores keep fetch order.
pub fn rank<'a, R: Searchable>(
    records: &'a [R],
    query: &Query,
    config: &SearchConfig,
) -> Vec<ScoredCandidate<'a, R>> {
    if query.is_empty() {
        return Vec::new();
    }

    let fields = R::search_fields();
    let mut candidates: Vec<ScoredCandidate<'a, R>> = records
        .iter()
        .enumerate()
        .map(|(position, record)| {
            ScoredCandidate::new(record, score_record(record, query, fields, config), position)
        })
        .filter(ScoredCandidate::is_match)
        .collect();

    candidates.sort_by(|a, b| a.rank_cmp(b));
    if let Some(limit) = config.max_results.filter(|&n| n > 0) {
        candidates.truncate(limit);
    }
    candidates
}

/// Rank links and collections independently into a result set.
pub fn rank_working_set(
    links: &[Link],
    collections: &[Collection],
    query: &Query,
    config: &SearchConfig,
) -> SearchResultSet {
    #[cfg(feature = "perf-log")]
    let t0 = std::time::Instant::now();

    let ranked_links: Vec<Link> = rank(links, query, config)
        .into_iter()
        .map(|c| c.record.clone())
        .collect();
    let ranked_collections: Vec<Collection> = rank(collections, query, config)
        .into_iter()
        .map(|c| c.record.clone())
        .collect();

    #[cfg(feature = "perf-log")]
    eprintln!(
        "[perf] rank={:.2}ms links={}/{} collections={}/{}",
        t0.elapsed().as_secs_f64() * 1000.0,
        ranked_links.len(),
        links.len(),
        ranked_collections.len(),
        collections.len(),
    );

    SearchResultSet {
        links: ranked_links,
        collections: ranked_collections,
    }
}
