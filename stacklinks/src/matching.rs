//! Character-level matchers used by the relevance scorer.
//!
//! Score ranges are tiered so they never overlap: an exact match scores 1.0,
//! a contiguous substring lands in (0.8, 0.9], and a scattered subsequence is
//! capped at 0.8. The field scorer relies on that ordering being monotonic.

use regex::{Regex, RegexBuilder};

/// Highest score a scattered (non-substring) subsequence can reach
pub const FUZZY_SCORE_CAP: f64 = 0.8;

/// Score of a substring match found at position 0
const SUBSTRING_BASE: f64 = 0.9;
/// How much a late substring position can cost
const SUBSTRING_POSITION_WEIGHT: f64 = 0.1;

/// Proximity score when only one character was matched
const SINGLE_CHAR_PROXIMITY: f64 = 0.1;
/// Largest fraction of proximity a gap penalty may remove
const MAX_GAP_PENALTY: f64 = 0.9;
const PROXIMITY_WEIGHT: f64 = 0.7;
const LENGTH_RATIO_WEIGHT: f64 = 0.3;

/// Characters that delimit a word besides whitespace
const BOUNDARY_CLASS: &str = r"[\s.,;:!?-]";

/// Outcome of a fuzzy comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch {
    pub matched: bool,
    pub score: f64,
}

impl FuzzyMatch {
    const NONE: FuzzyMatch = FuzzyMatch { matched: false, score: 0.0 };
    const PERFECT: FuzzyMatch = FuzzyMatch { matched: true, score: 1.0 };
}

/// Split a raw query into lowercase, whitespace-delimited terms.
pub fn tokenize_query(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Fuzzy-match `term` against `text`, ignoring case.
///
/// Convenience entry point; the scoring pipeline lowercases once up front and
/// calls [`fuzzy_match_normalized`] directly.
pub fn fuzzy_match(text: &str, term: &str) -> FuzzyMatch {
    fuzzy_match_normalized(&text.to_lowercase(), &term.to_lowercase())
}

/// Fuzzy-match over inputs that are already lowercased.
pub fn fuzzy_match_normalized(text: &str, term: &str) -> FuzzyMatch {
    if term.is_empty() || text == term {
        return FuzzyMatch::PERFECT;
    }

    let text_chars: Vec<char> = text.chars().collect();
    let term_chars: Vec<char> = term.chars().collect();
    let text_len = text_chars.len();

    if term_chars.len() > text_len {
        return FuzzyMatch::NONE;
    }

    if let Some(byte_pos) = text.find(term) {
        let position = char_offset(text, byte_pos) as f64;
        let position_penalty = position / text_len as f64;
        return FuzzyMatch {
            matched: true,
            score: SUBSTRING_BASE - position_penalty * SUBSTRING_POSITION_WEIGHT,
        };
    }

    // Single pass: record how many text chars were skipped between matches.
    let mut term_idx = 0;
    let mut gap = 0usize;
    let mut total_gap = 0usize;
    let mut match_count = 0usize;

    for &c in &text_chars {
        if term_idx == term_chars.len() {
            break;
        }
        if c == term_chars[term_idx] {
            if match_count > 0 {
                total_gap += gap;
            }
            gap = 0;
            match_count += 1;
            term_idx += 1;
        } else {
            gap += 1;
        }
    }

    if term_idx < term_chars.len() {
        return FuzzyMatch::NONE;
    }

    let proximity = if match_count > 1 {
        1.0 - (total_gap as f64 / (text_len as f64 * 2.0)).min(MAX_GAP_PENALTY)
    } else {
        SINGLE_CHAR_PROXIMITY
    };
    let length_ratio = term_chars.len() as f64 / text_len as f64;
    let score = proximity * PROXIMITY_WEIGHT + length_ratio * LENGTH_RATIO_WEIGHT;

    FuzzyMatch {
        matched: true,
        score: score.min(FUZZY_SCORE_CAP),
    }
}

/// True if `term` occurs in `text` delimited on both sides by the start/end of
/// the string, whitespace, or one of `. , ; : ! ? -`. Case-insensitive.
pub fn is_word_boundary_match(text: &str, term: &str) -> bool {
    word_boundary_pattern(term).map_or(false, |re| re.is_match(text))
}

/// Compile the boundary pattern for one term. The term is escaped so regex
/// metacharacters in it match literally.
pub(crate) fn word_boundary_pattern(term: &str) -> Option<Regex> {
    let pattern = format!(
        "(^|{class}){term}($|{class})",
        class = BOUNDARY_CLASS,
        term = regex::escape(term)
    );
    RegexBuilder::new(&pattern).case_insensitive(true).build().ok()
}

/// Convert a byte offset into a char offset.
pub(crate) fn char_offset(text: &str, byte_pos: usize) -> usize {
    text[..byte_pos].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_tokenize_query() {
        assert_eq!(tokenize_query("  React   Hooks\tGuide "), vec!["react", "hooks", "guide"]);
        assert!(tokenize_query("   ").is_empty());
    }

    #[test]
    fn test_fuzzy_empty_term_is_perfect() {
        assert_eq!(fuzzy_match("anything", ""), FuzzyMatch::PERFECT);
    }

    #[test]
    fn test_fuzzy_identical_ignores_case() {
        let m = fuzzy_match("Rust Book", "rust BOOK");
        assert!(m.matched);
        assert!(approx(m.score, 1.0));
    }

    #[test]
    fn test_fuzzy_term_longer_than_text() {
        assert_eq!(fuzzy_match("abc", "abcd"), FuzzyMatch::NONE);
    }

    #[test]
    fn test_fuzzy_substring_at_start() {
        let m = fuzzy_match_normalized("react tutorial", "react");
        assert!(m.matched);
        assert!(approx(m.score, 0.9));
    }

    #[test]
    fn test_fuzzy_substring_position_penalty() {
        // "tut" at char 6 of 14 → 0.9 - (6/14)*0.1
        let m = fuzzy_match_normalized("react tutorial", "tut");
        assert!(approx(m.score, 0.9 - (6.0 / 14.0) * 0.1));
        assert!(m.score > FUZZY_SCORE_CAP);
    }

    #[test]
    fn test_fuzzy_subsequence_scoring() {
        // "rct" in "react": r(0) e a c(3) t(4); gaps after first match: 2 + 0
        let m = fuzzy_match_normalized("react", "rct");
        assert!(m.matched);
        let proximity = 1.0 - (2.0_f64 / 10.0).min(0.9);
        let expected = (proximity * 0.7 + (3.0 / 5.0) * 0.3).min(0.8);
        assert!(approx(m.score, expected));
    }

    #[test]
    fn test_fuzzy_subsequence_is_capped() {
        // Tight subsequence that would exceed the cap without it
        let m = fuzzy_match_normalized("abxcd", "abcd");
        assert!(m.matched);
        assert!(m.score <= FUZZY_SCORE_CAP);
        assert!(approx(m.score, 0.8));
    }

    #[test]
    fn test_fuzzy_no_subsequence() {
        assert_eq!(fuzzy_match_normalized("react", "xyz"), FuzzyMatch::NONE);
        assert_eq!(fuzzy_match_normalized("react", "tr"), FuzzyMatch::NONE);
    }

    #[test]
    fn test_substring_tier_beats_fuzzy_tier() {
        let substring = fuzzy_match_normalized("zzzzzzzzzzzzzzzzzzzzzzzzzzzz abc", "abc");
        let scattered = fuzzy_match_normalized("axbxc", "abc");
        assert!(substring.matched && scattered.matched);
        assert!(substring.score > scattered.score);
    }

    #[test]
    fn test_fuzzy_multibyte_positions() {
        let m = fuzzy_match_normalized("café münchen", "münchen");
        assert!(m.matched);
        assert!(approx(m.score, 0.9 - (5.0 / 12.0) * 0.1));
    }

    #[test]
    fn test_word_boundary_basic() {
        assert!(is_word_boundary_match("react tutorial", "react"));
        assert!(is_word_boundary_match("learn react, fast", "react"));
        assert!(is_word_boundary_match("hooks-react", "react"));
        assert!(!is_word_boundary_match("preact tutorial", "react"));
        assert!(!is_word_boundary_match("reactive", "react"));
    }

    #[test]
    fn test_word_boundary_case_insensitive() {
        assert!(is_word_boundary_match("Intro To RUST", "rust"));
    }

    #[test]
    fn test_word_boundary_escapes_metacharacters() {
        assert!(is_word_boundary_match("node.js guide", "node.js"));
        assert!(!is_word_boundary_match("nodexjs guide", "node.js"));
        assert!(is_word_boundary_match("use c++ today", "c++"));
        assert!(!is_word_boundary_match("anything", "a*"));
    }

    #[test]
    fn test_word_boundary_phrase() {
        assert!(is_word_boundary_match("the rust book!", "rust book"));
    }
}
