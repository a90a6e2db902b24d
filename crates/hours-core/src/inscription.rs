//! Normalisation and fuzzy comparison of sign-up inscriptions.
//!
//! An inscription is the free-text name a volunteer types when signing up to
//! a shift, e.g. `"SG-M Jean Dupont 1234"`. Comparisons never look at the raw
//! string: both sides are first reduced to *standardized tokens*
//! (see [`standardize`]) and the token lists are compared with
//! [`compare_standardized`].

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Division;
use crate::similarity::similarity_ratio;

/// Rank prefixes that carry no identity information.
pub const KEYWORD_STOPLIST: &[&str] = &["sg", "pr", "sgm", "sg-m", "prm", "pr-m"];

/// Minimum token ratio for [`find_similar`] to report a match.
pub const TOKEN_MATCH_THRESHOLD: f64 = 0.8;

/// Minimum inscription score for [`compare_inscriptions`] to report a match.
pub const INSCRIPTION_MATCH_THRESHOLD: f64 = 0.8;

/// Only the first few positions of the shorter inscription are scored.
const MAX_SCORED_TOKENS: usize = 4;

/// A matched token may drift this many positions and still count as aligned.
const MAX_POSITION_DRIFT: usize = 2;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z-]{2,}").expect("static regex"))
}

fn division_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]{3,4}").expect("static regex"))
}

fn provisional_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)prov").expect("static regex"))
}

// ── Standardisation ───────────────────────────────────────────────────────────

/// Lowercase `text` and strip its diacritics.
///
/// # Examples
///
/// ```
/// use hours_core::inscription::normalize;
///
/// assert_eq!(normalize("Hélène CÔTÉ"), "helene cote");
/// ```
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Extract maximal runs of lowercase ASCII letters and hyphens of length ≥ 2.
pub fn tokenize(text: &str) -> Vec<String> {
    token_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Drop rank-prefix tokens listed in [`KEYWORD_STOPLIST`].
pub fn filter_keywords(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .filter(|t| !KEYWORD_STOPLIST.contains(&t.as_str()))
        .collect()
}

/// Canonical token list for an inscription: normalise, tokenise, filter.
///
/// # Examples
///
/// ```
/// use hours_core::inscription::standardize;
///
/// assert_eq!(standardize("SG-M Jean-Marc Léger 1234"), vec!["jean-marc", "leger"]);
/// ```
pub fn standardize(inscription: &str) -> Vec<String> {
    filter_keywords(tokenize(&normalize(inscription)))
}

// ── Comparison ────────────────────────────────────────────────────────────────

/// Index of the candidate most similar to `token`, if it scores above
/// [`TOKEN_MATCH_THRESHOLD`].
///
/// Ties go to the lowest index. An empty candidate list never matches.
pub fn find_similar(token: &str, candidates: &[String]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let ratio = similarity_ratio(token, candidate);
        match best {
            Some((_, best_ratio)) if ratio <= best_ratio => {}
            _ => best = Some((idx, ratio)),
        }
    }

    best.filter(|(_, ratio)| *ratio > TOKEN_MATCH_THRESHOLD)
        .map(|(idx, _)| idx)
}

/// Score in `[0, 1]` saying how alike two standardized inscriptions are.
///
/// Every token of the shorter list (first four only) is looked up in the
/// longer list. A match found within two positions of where it sits in the
/// shorter list earns 2 points; a distant match or no match earns 1.
/// The sum is divided by twice the number of scored positions.
///
/// When both lists are the same length the lexicographically smaller one is
/// scored against the other, so `compare_standardized(a, b)` always equals
/// `compare_standardized(b, a)`. An empty list on either side scores `0.0`.
pub fn compare_standardized(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (shorter, longer) = match a.len().cmp(&b.len()) {
        Ordering::Less => (a, b),
        Ordering::Greater => (b, a),
        Ordering::Equal if a <= b => (a, b),
        Ordering::Equal => (b, a),
    };

    let scored = shorter.len().min(MAX_SCORED_TOKENS);
    let points: usize = shorter
        .iter()
        .take(scored)
        .enumerate()
        .map(|(position, token)| match find_similar(token, longer) {
            Some(found) if found.abs_diff(position) <= MAX_POSITION_DRIFT => 2,
            _ => 1,
        })
        .sum();

    points as f64 / (2 * scored) as f64
}

/// `true` when two raw inscriptions designate the same person.
///
/// An inscription that standardizes to no tokens at all (for example only
/// rank prefixes) never matches anything, itself included.
pub fn compare_inscriptions(a: &str, b: &str) -> bool {
    let std_a = standardize(a);
    let std_b = standardize(b);

    if std_a.is_empty() || std_b.is_empty() {
        debug!(
            left = a,
            right = b,
            "inscription has no usable tokens; treating as no match"
        );
        return false;
    }

    compare_standardized(&std_a, &std_b) > INSCRIPTION_MATCH_THRESHOLD
}

// ── Division ──────────────────────────────────────────────────────────────────

/// Guess the division code embedded in an inscription.
///
/// The first run of 3–4 digits wins; otherwise a case-insensitive `prov`
/// (kept as written); otherwise [`Division::Unknown`].
pub fn extract_division(inscription: &str) -> Division {
    division_code_regex()
        .find(inscription)
        .or_else(|| provisional_regex().find(inscription))
        .map(|m| Division::Code(m.as_str().to_string()))
        .unwrap_or(Division::Unknown)
}
