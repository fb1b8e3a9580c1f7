//! Deterministic lexical scoring.
//!
//! The introduction answer is always scored here (no LLM involved); project
//! and skill answers land here when the rubric LLM call fails or times out,
//! so the interview never stalls on the scorer.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::session::Level;

/// Common technical skills/technologies (phrases or single tokens).
const TECH_SKILLS: &[&str] = &[
    // Languages
    "python", "java", "javascript", "typescript", "golang", "rust", "kotlin", "scala", "c++",
    "c#", "ruby", "php", "swift",
    // Web / frameworks
    "react", "nextjs", "node", "express", "django", "flask", "fastapi", "spring", "graphql",
    "rest", "grpc",
    // Data / ML
    "sql", "postgres", "postgresql", "mysql", "sqlite", "mongodb", "redis", "kafka", "spark",
    "pandas", "numpy", "tensorflow", "pytorch",
    // DevOps / cloud
    "docker", "kubernetes", "k8s", "terraform", "jenkins", "github actions", "aws", "azure",
    "gcp", "ci/cd",
    // Misc
    "linux", "git", "microservices", "api", "oop",
];

const SOFT_SKILLS: &[&str] = &[
    "communication",
    "leadership",
    "teamwork",
    "collaboration",
    "problem solving",
    "problem-solving",
    "analytical",
    "time management",
    "ownership",
    "accountability",
    "adaptability",
    "mentorship",
    "mentoring",
    "stakeholder",
    "presentation",
];

const OWNERSHIP_VERBS: &[&str] = &["led", "owned", "architected", "designed", "delivered", "implemented"];

const IMPACT_MARKERS: &[&str] = &[
    "%", "impact", "improved", "reduced", "increased", "users", "latency", "throughput", "rps",
    "ms",
];

fn years_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)\b").unwrap())
}

/// Case-insensitive presence check with non-alphanumeric boundaries on both
/// sides; supports multi-word phrases. `text` must already be lowercased.
fn phrase_present(text: &str, phrase: &str) -> bool {
    let mut from = 0;
    while let Some(pos) = text[from..].find(phrase) {
        let start = from + pos;
        let end = start + phrase.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = text[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = start + 1;
    }
    false
}

fn count_unique(text: &str, vocab: &[&str]) -> usize {
    vocab.iter().filter(|p| phrase_present(text, p)).count()
}

fn experience_score(text: &str) -> u32 {
    let mut score = 0u32;
    if let Some(caps) = years_regex().captures(text) {
        if let Ok(yrs) = caps[1].parse::<f64>() {
            score += ((yrs * 2.0).round() as u32).min(12);
        }
    }
    if phrase_present(text, "intern") || phrase_present(text, "internship") {
        score += 4;
    }
    if phrase_present(text, "project") || phrase_present(text, "projects") {
        score += 4;
    }
    score.min(20)
}

fn length_bonus(text: &str) -> u32 {
    match text.trim().len() {
        n if n >= 150 => 10,
        n if n >= 100 => 8,
        n if n >= 60 => 6,
        n if n >= 30 => 4,
        _ => 2,
    }
}

/// Rule-based introduction scoring (0–100): technical vocabulary, soft
/// skills, experience signals, length bonus, with damping for very short
/// answers. Feedback lists what was detected and what is missing.
pub fn score_intro(answer: &str) -> (f64, String) {
    let text = answer.to_lowercase();
    if text.trim().is_empty() {
        return (0.0, "No answer captured.".to_string());
    }

    let tech_unique = count_unique(&text, TECH_SKILLS);
    let tech_score = tech_unique.min(7) as u32 * 7;

    let soft_unique = count_unique(&text, SOFT_SKILLS);
    let soft_score = soft_unique.min(5) as u32 * 7;

    let exp_score = experience_score(&text);
    let len_bonus = length_bonus(&text);

    let mut total = tech_score + soft_score + exp_score + len_bonus;
    if text.split_whitespace().count() < 8 {
        total = total.min(25);
    }
    let final_score = total.min(100) as f64;

    let found_tech: Vec<&str> = TECH_SKILLS
        .iter()
        .filter(|p| phrase_present(&text, p))
        .copied()
        .collect();
    let found_soft: Vec<&str> = SOFT_SKILLS
        .iter()
        .filter(|p| phrase_present(&text, p))
        .copied()
        .collect();
    let has_years = years_regex().is_match(&text);
    let has_projects = phrase_present(&text, "project") || phrase_present(&text, "projects");

    let mut positives = Vec::new();
    if !found_tech.is_empty() {
        let shown = found_tech.iter().take(5).copied().collect::<Vec<_>>().join(", ");
        let more = if found_tech.len() > 5 { "…" } else { "" };
        positives.push(format!("mentioned tech: {shown}{more}"));
    }
    if !found_soft.is_empty() {
        let shown = found_soft.iter().take(3).copied().collect::<Vec<_>>().join(", ");
        positives.push(format!("soft skills: {shown}"));
    }
    if has_years {
        positives.push("stated years of experience".to_string());
    }
    if has_projects {
        positives.push("referenced projects/work".to_string());
    }

    let mut lacks = Vec::new();
    if !has_years {
        lacks.push("stated years of experience");
    }
    if found_tech.len() < 3 {
        lacks.push("specific technologies/frameworks (name 2-3)");
    }
    if !has_projects {
        lacks.push("mention of 1-2 key projects or responsibilities");
    }
    if !IMPACT_MARKERS.iter().any(|m| text.contains(m)) {
        lacks.push("impact metric or outcome (e.g. % improvement)");
    }

    let mut parts = Vec::new();
    if !positives.is_empty() {
        parts.push(format!("Good: {}", positives.join("; ")));
    }
    if !lacks.is_empty() {
        let shown = lacks.iter().take(3).copied().collect::<Vec<_>>().join("; ");
        parts.push(format!("Lacks: {shown}"));
    }
    let feedback = if parts.is_empty() {
        "Insufficient information on skills, experience, projects, and impact.".to_string()
    } else {
        parts.join(" | ")
    };

    (final_score, feedback)
}

/// Last-resort project answer scoring: tech density, ownership verbs, impact
/// markers, testing signals, length.
pub fn score_project(answer: &str) -> f64 {
    let a = answer.to_lowercase();
    let mut score = count_unique(&a, TECH_SKILLS).min(10) as u32 * 5;
    if OWNERSHIP_VERBS.iter().any(|v| phrase_present(&a, v)) {
        score += 10;
    }
    if IMPACT_MARKERS.iter().any(|m| a.contains(m)) {
        score += 10;
    }
    if ["unit test", "integration test", "pipeline", "ci/cd", "jenkins"]
        .iter()
        .any(|t| a.contains(t))
    {
        score += 10;
    }
    score += match a.split_whitespace().count() {
        n if n > 120 => 10,
        n if n > 60 => 8,
        n if n > 30 => 6,
        n if n > 15 => 4,
        _ => 0,
    };
    score.min(100) as f64
}

/// Coverage aspects a strong project answer should touch; the missing ones
/// are appended to feedback as hints.
pub fn missing_aspects(answer: &str) -> Vec<&'static str> {
    let a = answer.to_lowercase();
    let aspects: [(&str, bool); 5] = [
        (
            "architecture/design",
            ["architecture", "design", "pattern", "microservice", "monolith", "scalab"]
                .iter()
                .any(|x| a.contains(x)),
        ),
        (
            "trade-offs/decisions",
            ["trade-off", "tradeoff", "chose", "decided", "because"]
                .iter()
                .any(|x| a.contains(x)),
        ),
        (
            "testing/quality",
            ["test", "unit", "integration", "e2e", "qa"].iter().any(|x| a.contains(x)),
        ),
        (
            "metrics/impact",
            ["%", "latency", "rps", "throughput", "p95", "users", "ms"]
                .iter()
                .any(|x| a.contains(x)),
        ),
        (
            "ownership",
            OWNERSHIP_VERBS.iter().any(|v| phrase_present(&a, v)),
        ),
    ];
    aspects
        .into_iter()
        .filter_map(|(name, covered)| (!covered).then_some(name))
        .collect()
}

const ANSWER_STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "then", "is", "are", "to", "of", "in", "on",
    "for", "with", "as", "by", "at", "from",
];

fn content_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty() && !ANSWER_STOPWORDS.contains(t))
        .map(String::from)
        .collect()
}

/// Question-type weight: harder levels are worth proportionally more.
fn level_weight(level: Level) -> f64 {
    match level {
        Level::Basic => 0.8,
        Level::Intermediate => 1.0,
        Level::Advanced => 1.2,
    }
}

/// Last-resort skill answer scoring: content richness penalized by overlap
/// with the question wording (restatement detection), weighted by level.
pub fn score_skill(question: &str, answer: &str, level: Level) -> (f64, String) {
    if answer.trim().is_empty() {
        return (0.0, "No answer captured.".to_string());
    }

    let q_tokens: std::collections::HashSet<String> =
        content_tokens(question).into_iter().collect();
    let a_tokens_vec = content_tokens(answer);
    let a_tokens: std::collections::HashSet<String> = a_tokens_vec.iter().cloned().collect();

    let overlap = q_tokens.intersection(&a_tokens).count();
    let overlap_ratio = overlap as f64 / a_tokens.len().max(1) as f64;
    let restatement_penalty = overlap_ratio.min(1.0);

    // Content signal: distinct non-question tokens plus tech vocabulary.
    let fresh_tokens = a_tokens.difference(&q_tokens).count();
    let lower = answer.to_lowercase();
    let tech = count_unique(&lower, TECH_SKILLS);
    let base = (fresh_tokens.min(40) as f64 * 1.5) + (tech.min(6) as f64 * 6.0);

    let mut score = base * (1.0 - restatement_penalty) * level_weight(level);
    score = score.clamp(0.0, 100.0);

    let mut fragments = Vec::new();
    if a_tokens_vec.len() < 5 {
        fragments.push("very brief answer length");
    }
    if overlap_ratio >= 0.5 {
        fragments.push("high overlap with question wording (possible restatement)");
    }
    if score >= 60.0 {
        fragments.push("good coverage of the question's topic");
    } else if score >= 30.0 {
        fragments.push("partial coverage of key points");
    } else {
        fragments.push("low relevance/coverage for the question");
    }

    (score, fragments.join("; "))
}
