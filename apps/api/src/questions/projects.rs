//! Project question selector.
//!
//! Picks the first project the candidate has not yet been asked about (else
//! round-robins), builds a focused generation prompt from the project summary
//! and the candidate's recent answers, and post-processes the oracle output so
//! the question always references the real project. Oracle failure falls back
//! to a deterministic question bank, so this selector never errors.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::llm_client::prompts::INTERVIEWER_SYSTEM;
use crate::llm_client::LlmClient;
use crate::models::session::ProjectSummary;
use crate::questions::distinct::{first_question_line, normalize_question};
use crate::questions::prompts::{FOCUS_AREAS, PROJECT_QUESTION_TEMPLATE};

/// Titles that carry no information; they force topic derivation from the summary.
const GENERIC_TITLES: &[&str] = &["", "project", "your project", "n/a", "na"];

/// Tokens stripped when deriving a topic from free text.
const NOISE_TOKENS: &[&str] = &["audio", "transcription", "unavailable", "received", "kb"];

/// Leading tokens too generic to open a topic with.
const GENERIC_STARTS: &[&str] = &["worked", "working", "work", "project", "projects", "recent"];

/// Selects the next project: first unasked, else round-robin over all of them.
pub fn select_project<'a>(
    projects: &'a [ProjectSummary],
    asked_titles: &[String],
    rotation: usize,
) -> Option<&'a ProjectSummary> {
    if projects.is_empty() {
        return None;
    }
    projects
        .iter()
        .find(|p| {
            !p.project_title.is_empty() && !asked_titles.contains(&p.project_title)
        })
        .or_else(|| projects.get(rotation % projects.len()))
}

/// Builds a pseudo-project from recent answer text when no resume projects
/// exist, so the question still lands on something concrete.
pub fn synthesize_project(recent_answers: &[String]) -> ProjectSummary {
    ProjectSummary {
        project_title: String::new(),
        summary: derive_topic(&recent_answers.join(" "), 6),
    }
}

/// Removes bracketed placeholders and noise tokens, then keeps the leading
/// content words as a topic seed.
fn sanitize_topic(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace()
        .map(|w| w.trim_matches([',', '.', ';', ':']))
        .filter(|w| w.len() >= 3 && !NOISE_TOKENS.contains(&w.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn derive_topic(text: &str, max_words: usize) -> String {
    let sanitized = sanitize_topic(text);
    let mut words: Vec<&str> = sanitized.split_whitespace().collect();
    while words
        .first()
        .is_some_and(|w| GENERIC_STARTS.contains(&w.to_lowercase().as_str()))
    {
        words.remove(0);
    }
    let topic = words
        .into_iter()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ");
    if topic.is_empty() {
        "recent work".to_string()
    } else {
        topic
    }
}

fn is_generic_title(title: &str) -> bool {
    GENERIC_TITLES.contains(&title.trim().to_lowercase().as_str())
}

/// Contextual prefix used when the oracle output (or a fallback) does not
/// mention the real project.
fn title_prefix(title: &str, display_title: &str) -> String {
    if !title.is_empty() && !is_generic_title(title) {
        format!("In {title}, ")
    } else {
        format!("Regarding your work on {display_title}, ")
    }
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            first.to_lowercase().collect::<String>() + chars.as_str()
        }
        _ => s.to_string(),
    }
}

/// Generates one project question. Infallible: oracle failures fall back to a
/// pseudo-randomly chosen deterministic question referencing the project.
pub async fn generate_question(
    oracle: &LlmClient,
    project: &ProjectSummary,
    recent_answers: &[String],
) -> String {
    let title_raw = project.project_title.trim();
    let summary = if project.summary.trim().is_empty() {
        "No summary available"
    } else {
        project.summary.trim()
    };

    let generic = is_generic_title(title_raw);
    let display_title = if generic {
        derive_topic(summary, 6)
    } else {
        title_raw.to_string()
    };

    let last_answers = if recent_answers.is_empty() {
        "None".to_string()
    } else {
        let start = recent_answers.len().saturating_sub(2);
        recent_answers[start..].join("\n")
    };

    let focus = FOCUS_AREAS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FOCUS_AREAS[0]);

    let prompt = PROJECT_QUESTION_TEMPLATE
        .replace("{title}", if title_raw.is_empty() { "[unknown]" } else { title_raw })
        .replace("{summary}", summary)
        .replace("{last_answers}", &last_answers)
        .replace("{focus}", focus);

    match oracle.generate(&prompt, INTERVIEWER_SYSTEM).await {
        Ok(raw) => {
            if let Some(line) = first_question_line(&raw) {
                // Keep as-is when the real title is already mentioned
                if !title_raw.is_empty() && line.to_lowercase().contains(&title_raw.to_lowercase())
                {
                    return line;
                }
                let prefix = title_prefix(title_raw, &display_title);
                return normalize_question(&format!("{prefix}{}", lowercase_first(&line)));
            }
            warn!("project question generation returned no usable line; using fallback");
            fallback_question(title_raw, &display_title, summary)
        }
        Err(e) => {
            warn!("project question generation failed: {e}; using fallback");
            fallback_question(title_raw, &display_title, summary)
        }
    }
}

/// Deterministic question bank used when the oracle is unavailable.
fn fallback_question(title_raw: &str, display_title: &str, summary: &str) -> String {
    let prefix = title_prefix(title_raw, display_title);
    let topic = {
        let t = derive_topic(summary, 6);
        if t == "recent work" && !display_title.is_empty() {
            display_title.to_string()
        } else {
            t
        }
    };
    let bank = [
        format!("{prefix}how did you implement the core feature around {topic}?"),
        format!("{prefix}which tools or libraries did you choose for {topic}, and why?"),
        format!("{prefix}can you walk me through the architecture you used for {topic}?"),
        format!("{prefix}how did you deploy and run {topic} in your environment?"),
        format!("{prefix}how did you test {topic} to make sure it worked as expected?"),
        format!("{prefix}what performance bottleneck did you hit in {topic}, and how did you fix it?"),
    ];
    let idx = rand::thread_rng().gen_range(0..bank.len());
    normalize_question(&bank[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(title: &str, summary: &str) -> ProjectSummary {
        ProjectSummary {
            project_title: title.to_string(),
            summary: summary.to_string(),
        }
    }

    #[test]
    fn test_select_first_unasked_project() {
        let projects = vec![project("Alpha", ""), project("Beta", "")];
        let asked = vec!["Alpha".to_string()];
        let selected = select_project(&projects, &asked, 0).unwrap();
        assert_eq!(selected.project_title, "Beta");
    }

    #[test]
    fn test_select_round_robins_once_exhausted() {
        let projects = vec![project("Alpha", ""), project("Beta", "")];
        let asked = vec!["Alpha".to_string(), "Beta".to_string()];
        assert_eq!(
            select_project(&projects, &asked, 3).unwrap().project_title,
            "Beta"
        );
        assert_eq!(
            select_project(&projects, &asked, 4).unwrap().project_title,
            "Alpha"
        );
    }

    #[test]
    fn test_select_none_when_no_projects() {
        assert!(select_project(&[], &[], 0).is_none());
    }

    #[test]
    fn test_sanitize_topic_strips_brackets_and_noise() {
        let topic = sanitize_topic("[Audio received ~12 KB; transcription unavailable] payment gateway");
        assert_eq!(topic, "payment gateway");
    }

    #[test]
    fn test_derive_topic_drops_generic_leading_words() {
        assert_eq!(
            derive_topic("worked on recent inventory forecasting pipeline", 6),
            "inventory forecasting pipeline"
        );
    }

    #[test]
    fn test_derive_topic_defaults_when_empty() {
        assert_eq!(derive_topic("", 6), "recent work");
        assert_eq!(derive_topic("[all placeholder]", 6), "recent work");
    }

    #[test]
    fn test_synthesize_project_from_answers() {
        let answers = vec!["I built a realtime chat service with websockets".to_string()];
        let p = synthesize_project(&answers);
        assert!(p.project_title.is_empty());
        assert!(p.summary.contains("realtime"));
    }

    #[test]
    fn test_fallback_question_references_title() {
        let q = fallback_question("Ledger", "Ledger", "double-entry bookkeeping engine");
        assert!(q.starts_with("In Ledger, "));
        assert!(q.ends_with('?'));
    }

    #[test]
    fn test_fallback_question_generic_title_uses_topic_prefix() {
        let q = fallback_question("", "billing pipeline", "billing pipeline for invoices");
        assert!(q.starts_with("Regarding your work on billing pipeline, "));
    }

    #[test]
    fn test_lowercase_first_only_touches_leading_char() {
        assert_eq!(lowercase_first("How did you"), "how did you");
        assert_eq!(lowercase_first("sql tuning"), "sql tuning");
    }
}
