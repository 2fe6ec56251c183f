//! Name resolution with fuzzy matching.

use strsim::jaro_winkler;

/// Minimum similarity score for a fuzzy match (0.0-1.0).
const FUZZY_THRESHOLD: f64 = 0.8;

/// Minimum similarity score for a "did you mean" suggestion.
const SUGGEST_THRESHOLD: f64 = 0.6;

/// Something a player can refer to: its id and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Entity id.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Candidate {
    /// Pair an id with its display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Drop a leading article so "the key" finds "Key".
fn strip_article(input: &str) -> &str {
    let trimmed = input.trim();
    for article in ["the ", "a ", "an "] {
        if trimmed.len() > article.len()
            && trimmed
                .get(..article.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(article))
        {
            return trimmed[article.len()..].trim_start();
        }
    }
    trimmed
}

/// Exact match on id or name, ignoring case and a leading article.
pub fn resolve_exact<'a>(candidates: &'a [Candidate], input: &str) -> Option<&'a Candidate> {
    let wanted = strip_article(input);
    candidates
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(wanted) || c.name.eq_ignore_ascii_case(wanted))
}

/// Resolve a typed name to a candidate: exact first, then the closest fuzzy
/// match above the threshold.
pub fn resolve<'a>(candidates: &'a [Candidate], input: &str) -> Option<&'a Candidate> {
    if let Some(exact) = resolve_exact(candidates, input) {
        return Some(exact);
    }
    fuzzy_match(candidates, input, FUZZY_THRESHOLD)
        .first()
        .map(|(candidate, _)| *candidate)
}

/// Candidates scoring at or above `threshold`, best first.
pub fn fuzzy_match<'a>(candidates: &'a [Candidate], input: &str, threshold: f64) -> Vec<(&'a Candidate, f64)> {
    let input_lower = strip_article(input).to_lowercase();
    let mut matches: Vec<(&Candidate, f64)> = candidates
        .iter()
        .filter_map(|c| {
            let score = jaro_winkler(&input_lower, &c.name.to_lowercase())
                .max(jaro_winkler(&input_lower, &c.id.to_lowercase()));
            (score >= threshold).then_some((c, score))
        })
        .collect();

    matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    matches
}

/// Display names resembling the partial input, best first.
pub fn suggest(candidates: &[Candidate], partial: &str, limit: usize) -> Vec<String> {
    let partial_lower = strip_article(partial).to_lowercase();
    let mut suggestions: Vec<(&str, f64)> = candidates
        .iter()
        .filter_map(|c| {
            let name_lower = c.name.to_lowercase();
            if name_lower.starts_with(&partial_lower) {
                Some((c.name.as_str(), 2.0))
            } else if name_lower.contains(&partial_lower) {
                Some((c.name.as_str(), 1.0))
            } else {
                let score = jaro_winkler(&partial_lower, &name_lower);
                (score >= SUGGEST_THRESHOLD).then_some((c.name.as_str(), score))
            }
        })
        .collect();

    suggestions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    suggestions
        .into_iter()
        .take(limit)
        .map(|(name, _)| name.to_string())
        .collect()
}
