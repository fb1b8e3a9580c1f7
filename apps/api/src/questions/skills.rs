//! Skill question selector — hybrid adaptive/diversity generation with
//! distinctness enforcement.
//!
//! Strategy ladder, in order:
//! 1. three hybrid attempts — adaptive mode with probability 0.7 (probe the
//!    weak area of recent answers or raise difficulty), diversity mode
//!    otherwise (fresh subtopic);
//! 2. two direct-distinct attempts — the prompt enumerates the exact prior
//!    questions to avoid;
//! 3. one deterministic per-level template.
//! Every candidate, template included, must pass the distinctness filter.
//! Exhausting the ladder is the only error this module produces; the caller
//! surfaces it without touching session state.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::prompts::INTERVIEWER_SYSTEM;
use crate::llm_client::LlmClient;
use crate::models::session::Level;
use crate::questions::distinct::{
    accept, first_question_line, normalize_question, topics, SIMILARITY_THRESHOLD,
};
use crate::questions::prompts::{
    level_guidance, SKILL_ADAPTIVE_TEMPLATE, SKILL_DIRECT_DISTINCT_TEMPLATE,
    SKILL_DIVERSITY_TEMPLATE,
};

const HYBRID_ATTEMPTS: u32 = 3;
const DIRECT_ATTEMPTS: u32 = 2;
/// Probability of adaptive mode on a hybrid attempt.
const ADAPTIVE_PROBABILITY: f64 = 0.7;

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("no distinct question produced after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Produces one ready-to-ask question for `(skill, level)` that is distinct
/// from the recently asked window.
pub async fn generate_distinct_question(
    oracle: &LlmClient,
    skill: &str,
    level: Level,
    recent_questions: &[String],
    recent_answers: &[String],
) -> Result<String, SelectError> {
    let avoid = topics(recent_questions, 6).join(", ");
    let mut attempts = 0u32;

    for _ in 0..HYBRID_ATTEMPTS {
        attempts += 1;
        let adaptive = rand::thread_rng().gen::<f64>() < ADAPTIVE_PROBABILITY;
        let mode = if adaptive { "adaptive" } else { "diversity" };
        let prompt = if adaptive {
            adaptive_prompt(skill, level, recent_answers, &avoid)
        } else {
            diversity_prompt(skill, level, &avoid)
        };
        if let Some(q) = try_oracle(oracle, &prompt, recent_questions).await {
            debug!(mode, %skill, %level, "skill question accepted");
            return Ok(q);
        }
    }

    let prior_list = recent_questions
        .iter()
        .map(|q| format!("- {q}"))
        .collect::<Vec<_>>()
        .join("\n");
    for _ in 0..DIRECT_ATTEMPTS {
        attempts += 1;
        let prompt = SKILL_DIRECT_DISTINCT_TEMPLATE
            .replace("{skill}", skill)
            .replace("{level}", level.as_str())
            .replace("{guidance}", level_guidance(level))
            .replace("{prior_questions}", &prior_list);
        if let Some(q) = try_oracle(oracle, &prompt, recent_questions).await {
            debug!(mode = "direct", %skill, %level, "skill question accepted");
            return Ok(q);
        }
    }

    // Deterministic template, still distinctness-checked: a repeat of an
    // already-asked template question must not reach the candidate.
    attempts += 1;
    let template = template_question(skill, level);
    if accept(&template, recent_questions, SIMILARITY_THRESHOLD) {
        warn!(%skill, %level, "falling back to templated skill question");
        return Ok(template);
    }

    Err(SelectError::Exhausted { attempts })
}

async fn try_oracle(
    oracle: &LlmClient,
    prompt: &str,
    recent_questions: &[String],
) -> Option<String> {
    match oracle.generate(prompt, INTERVIEWER_SYSTEM).await {
        Ok(raw) => {
            let line = first_question_line(&raw)?;
            if accept(&line, recent_questions, SIMILARITY_THRESHOLD) {
                Some(line)
            } else {
                debug!("candidate question rejected by distinctness filter");
                None
            }
        }
        Err(e) => {
            warn!("skill question oracle call failed: {e}");
            None
        }
    }
}

fn adaptive_prompt(skill: &str, level: Level, recent_answers: &[String], avoid: &str) -> String {
    let last_answers = if recent_answers.is_empty() {
        "None".to_string()
    } else {
        let start = recent_answers.len().saturating_sub(2);
        recent_answers[start..].join("\n")
    };
    SKILL_ADAPTIVE_TEMPLATE
        .replace("{skill}", skill)
        .replace("{level}", level.as_str())
        .replace("{guidance}", level_guidance(level))
        .replace("{last_answers}", &last_answers)
        .replace("{avoid_topics}", if avoid.is_empty() { "none" } else { avoid })
}

fn diversity_prompt(skill: &str, level: Level, avoid: &str) -> String {
    SKILL_DIVERSITY_TEMPLATE
        .replace("{skill}", skill)
        .replace("{level}", level.as_str())
        .replace("{guidance}", level_guidance(level))
        .replace("{avoid_topics}", if avoid.is_empty() { "none" } else { avoid })
}

/// Deterministic last-resort question per level.
fn template_question(skill: &str, level: Level) -> String {
    let q = match level {
        Level::Basic => format!("Define {skill} in one sentence?"),
        Level::Intermediate => {
            format!("Give a real-world use case for {skill} and the key trade-offs?")
        }
        Level::Advanced => {
            format!("Design decision: how would you scale {skill} under high load?")
        }
    };
    normalize_question(&q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_question_per_level() {
        assert_eq!(
            template_question("sql", Level::Basic),
            "Define sql in one sentence?"
        );
        assert!(template_question("sql", Level::Intermediate).contains("trade-offs"));
        assert!(template_question("sql", Level::Advanced).contains("scale sql"));
    }

    #[test]
    fn test_adaptive_prompt_includes_last_two_answers_only() {
        let answers = vec![
            "first".to_string(),
            "second answer about indexes".to_string(),
            "third answer about joins".to_string(),
        ];
        let prompt = adaptive_prompt("sql", Level::Intermediate, &answers, "indexes");
        assert!(!prompt.contains("first"));
        assert!(prompt.contains("second answer about indexes"));
        assert!(prompt.contains("third answer about joins"));
        assert!(prompt.contains("Avoid these already-covered topics: indexes"));
    }

    #[test]
    fn test_adaptive_prompt_handles_no_history() {
        let prompt = adaptive_prompt("go", Level::Basic, &[], "");
        assert!(prompt.contains("None"));
        assert!(prompt.contains("none"));
    }

    #[test]
    fn test_diversity_prompt_names_skill_and_level() {
        let prompt = diversity_prompt("kubernetes", Level::Advanced, "scheduling, etcd");
        assert!(prompt.contains("Skill: kubernetes"));
        assert!(prompt.contains("Level: advanced"));
        assert!(prompt.contains("scheduling, etcd"));
    }
}
