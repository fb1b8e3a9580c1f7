//! Distinctness filter — lexical gate between raw oracle output and the
//! candidate-facing question stream.
//!
//! A generated question is accepted only if its token-set similarity to every
//! recently asked question stays strictly below the threshold. Also extracts
//! topic keywords from recent questions so generation prompts can steer away
//! from repeats.

use std::collections::{HashMap, HashSet};

/// Accept a candidate question iff similarity to every recent question is
/// strictly below this. One policy everywhere (see DESIGN.md).
pub const SIMILARITY_THRESHOLD: f64 = 0.45;

/// Size of the recently-asked window fed to `accept`.
pub const RECENT_WINDOW: usize = 5;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "your", "with", "can", "what", "when",
    "where", "which", "how", "why", "does", "did", "would", "could", "should", "about", "that",
    "this", "these", "those", "have", "has", "had", "was", "were", "will", "been", "being",
    "from", "into", "them", "they", "their", "its", "one", "two", "any", "all", "some", "such",
    "use", "used", "using", "please", "tell", "describe", "explain",
];

/// Prefixes of lines that are meta-commentary rather than questions. The
/// adaptive prompt asks the model to assess silently, but models leak; these
/// lines are discarded before similarity checks.
const META_LINE_PREFIXES: &[&str] = &[
    "the candidate",
    "strength",
    "weakness",
    "assessment",
    "analysis",
    "based on",
    "note:",
    "understanding:",
];

/// Lowercased content tokens: alphanumeric runs longer than 2 chars, minus
/// stopwords.
pub fn tokenize(text: &str) -> HashSet<String> {
    token_counts(text).into_keys().collect()
}

fn token_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for raw in text.split(|c: char| !c.is_alphanumeric()) {
        let token = raw.to_lowercase();
        if token.len() > 2 && !STOPWORDS.contains(&token.as_str()) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    counts
}

/// Asymmetric Jaccard-like similarity: `|A ∩ B| / max(|A|, |B|)`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let ta = tokenize(a);
    let tb = tokenize(b);
    let denom = ta.len().max(tb.len());
    if denom == 0 {
        return 0.0;
    }
    let inter = ta.intersection(&tb).count();
    inter as f64 / denom as f64
}

/// True iff `candidate` is sufficiently dissimilar from every entry in
/// `recent`. Character-identical repeats are always rejected.
pub fn accept(candidate: &str, recent: &[String], threshold: f64) -> bool {
    let candidate = candidate.trim();
    for prior in recent {
        if candidate == prior.trim() {
            return false;
        }
        if similarity(candidate, prior) >= threshold {
            return false;
        }
    }
    true
}

/// Frequency-ranked, length-weighted keywords across recent questions. Used
/// to tell the oracle which topics to avoid.
pub fn topics(recent: &[String], n: usize) -> Vec<String> {
    let mut combined: HashMap<String, usize> = HashMap::new();
    for q in recent {
        for (token, count) in token_counts(q) {
            *combined.entry(token).or_insert(0) += count;
        }
    }
    let mut ranked: Vec<(String, usize)> = combined
        .into_iter()
        .map(|(token, count)| {
            let weight = count * token.len();
            (token, weight)
        })
        .collect();
    // Deterministic order for equal weights
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(n).map(|(t, _)| t).collect()
}

/// Normalizes a question: trims wrapping quotes, collapses repeated `?`, and
/// guarantees exactly one trailing `?` for anything long enough to be a
/// question.
pub fn normalize_question(q: &str) -> String {
    let mut q = q.trim().trim_matches(['"', '\'']).to_string();
    while q.contains("??") {
        q = q.replace("??", "?");
    }
    q = q.replace("?\"", "?").replace("?'", "?");
    let trimmed = q.trim_end_matches('?').trim_end().to_string();
    if trimmed.len() > 8 {
        format!("{trimmed}?")
    } else if q.ends_with('?') {
        format!("{trimmed}?")
    } else {
        q
    }
}

/// Scans raw oracle output for the first line that looks like a question,
/// skipping blanks, bullets, and meta-commentary lines.
pub fn first_question_line(raw: &str) -> Option<String> {
    for line in raw.lines() {
        let line = line.trim().trim_start_matches(['-', '•', '*', ' ']).trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if META_LINE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            continue;
        }
        return Some(normalize_question(line));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recent(qs: &[&str]) -> Vec<String> {
        qs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_question_is_rejected() {
        let prior = recent(&["How does Python manage memory allocation?"]);
        assert!(!accept(
            "How does Python manage memory allocation?",
            &prior,
            SIMILARITY_THRESHOLD
        ));
    }

    #[test]
    fn test_unrelated_question_is_accepted() {
        let prior = recent(&["How does Python manage memory allocation?"]);
        assert!(accept(
            "Walk me through designing a rate limiter for an API gateway?",
            &prior,
            SIMILARITY_THRESHOLD
        ));
    }

    #[test]
    fn test_near_duplicate_is_rejected() {
        let prior = recent(&["How does Python manage memory allocation internally?"]);
        assert!(!accept(
            "How does Python manage memory allocation in practice?",
            &prior,
            SIMILARITY_THRESHOLD
        ));
    }

    #[test]
    fn test_accept_checks_every_recent_question() {
        let prior = recent(&[
            "Walk me through designing a rate limiter?",
            "How does Python manage memory allocation?",
        ]);
        assert!(!accept(
            "How does Python handle memory allocation?",
            &prior,
            SIMILARITY_THRESHOLD
        ));
    }

    #[test]
    fn test_empty_recent_accepts_anything() {
        assert!(accept("Anything at all?", &[], SIMILARITY_THRESHOLD));
    }

    #[test]
    fn test_similarity_of_disjoint_texts_is_zero() {
        assert_eq!(similarity("alpha beta gamma", "delta epsilon zeta"), 0.0);
    }

    #[test]
    fn test_similarity_identical_token_sets_is_one() {
        let s = similarity(
            "indexing strategy database",
            "database indexing strategy",
        );
        assert!((s - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tokenize_drops_short_tokens_and_stopwords() {
        let tokens = tokenize("How do you use an index in SQL databases?");
        assert!(tokens.contains("index"));
        assert!(tokens.contains("sql"));
        assert!(tokens.contains("databases"));
        assert!(!tokens.contains("you"));
        assert!(!tokens.contains("an"));
        assert!(!tokens.contains("use"));
    }

    #[test]
    fn test_topics_ranked_by_weighted_frequency() {
        let prior = recent(&[
            "How does replication work in PostgreSQL?",
            "What replication lag issues have you debugged?",
        ]);
        let top = topics(&prior, 3);
        assert_eq!(top.first().unwrap(), "replication");
    }

    #[test]
    fn test_normalize_collapses_question_marks() {
        assert_eq!(
            normalize_question("What is a closure???"),
            "What is a closure?"
        );
    }

    #[test]
    fn test_normalize_adds_missing_question_mark() {
        assert_eq!(
            normalize_question("Explain ownership in Rust"),
            "Explain ownership in Rust?"
        );
    }

    #[test]
    fn test_normalize_strips_wrapping_quotes() {
        assert_eq!(
            normalize_question("\"What is a mutex?\""),
            "What is a mutex?"
        );
    }

    #[test]
    fn test_first_question_line_skips_meta_commentary() {
        let raw = "The candidate shows a shallow grasp of indexing.\n\
                   Weakness: query planning.\n\
                   - What trade-offs drive choosing a composite index?";
        assert_eq!(
            first_question_line(raw).unwrap(),
            "What trade-offs drive choosing a composite index?"
        );
    }

    #[test]
    fn test_first_question_line_empty_input() {
        assert_eq!(first_question_line("   \n\n"), None);
    }
}
