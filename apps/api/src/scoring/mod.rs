//! Answer scoring — pluggable, trait-based scorer behind `Arc<dyn AnswerScorer>`.
//!
//! Default: `RubricScorer` — LLM rubric for project and skill answers with a
//! deterministic lexical fallback, pure lexical scoring for the introduction.
//! Scoring never fails: a scorer outage degrades to the heuristic instead of
//! surfacing an error, so the interview always progresses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::LlmClient;
use crate::models::session::Level;
use crate::scoring::prompts::{
    PROJECT_RUBRIC_SYSTEM, PROJECT_RUBRIC_TEMPLATE, SKILL_RUBRIC_SYSTEM, SKILL_RUBRIC_TEMPLATE,
};

pub mod heuristics;
pub mod prompts;

/// Score threshold: a scored answer at or above this counts as a pass for
/// level progression.
pub const PASS_THRESHOLD: f64 = 30.0;

/// A scored answer: 0–100 plus optional reasons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl Evaluation {
    pub fn passed(&self) -> bool {
        self.score >= PASS_THRESHOLD
    }
}

/// The answer scorer trait. Implement this to swap scoring backends without
/// touching the state machine or handlers.
#[async_trait]
pub trait AnswerScorer: Send + Sync {
    async fn score_intro(&self, answer: &str) -> Evaluation;
    async fn score_project(&self, answer: &str) -> Evaluation;
    async fn score_skill(&self, question: &str, answer: &str, level: Level) -> Evaluation;
}

/// JSON shape the rubric prompts ask the LLM to return.
#[derive(Debug, Deserialize)]
struct RubricVerdict {
    score: f64,
    feedback: Option<String>,
}

/// Default scorer: LLM rubric with lexical fallback.
pub struct RubricScorer {
    llm: LlmClient,
}

impl RubricScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AnswerScorer for RubricScorer {
    /// Introduction answers are scored lexically — deterministic and instant.
    async fn score_intro(&self, answer: &str) -> Evaluation {
        let (score, feedback) = heuristics::score_intro(answer);
        Evaluation {
            score,
            feedback: Some(feedback),
        }
    }

    async fn score_project(&self, answer: &str) -> Evaluation {
        if answer.trim().is_empty() {
            return Evaluation {
                score: 0.0,
                feedback: Some("Answer is empty.".to_string()),
            };
        }

        let prompt = PROJECT_RUBRIC_TEMPLATE
            .replace("{question}", "(project discussion)")
            .replace("{answer}", answer);

        let (score, mut fragments) = match self
            .llm
            .call_json::<RubricVerdict>(&prompt, PROJECT_RUBRIC_SYSTEM)
            .await
        {
            Ok(verdict) => {
                let mut fragments = Vec::new();
                if let Some(fb) = verdict.feedback {
                    fragments.push(format!("LLM: {fb}"));
                }
                (verdict.score.clamp(0.0, 100.0), fragments)
            }
            Err(e) => {
                warn!("project rubric call failed, using lexical fallback: {e}");
                (heuristics::score_project(answer), Vec::new())
            }
        };

        let missing = heuristics::missing_aspects(answer);
        if !missing.is_empty() {
            let shown = missing.iter().take(3).copied().collect::<Vec<_>>().join(", ");
            fragments.push(format!("Low coverage: {shown}"));
        }

        let feedback = if fragments.is_empty() {
            None
        } else {
            Some(fragments.join(" | "))
        };
        Evaluation { score, feedback }
    }

    async fn score_skill(&self, question: &str, answer: &str, level: Level) -> Evaluation {
        if answer.trim().is_empty() {
            return Evaluation {
                score: 0.0,
                feedback: Some("No answer captured.".to_string()),
            };
        }

        let prompt = SKILL_RUBRIC_TEMPLATE
            .replace("{level}", level.as_str())
            .replace("{question}", question)
            .replace("{answer}", answer);

        match self
            .llm
            .call_json::<RubricVerdict>(&prompt, SKILL_RUBRIC_SYSTEM)
            .await
        {
            Ok(verdict) => Evaluation {
                score: verdict.score.clamp(0.0, 100.0),
                feedback: verdict.feedback,
            },
            Err(e) => {
                warn!("skill rubric call failed, using lexical fallback: {e}");
                let (score, feedback) = heuristics::score_skill(question, answer, level);
                Evaluation {
                    score,
                    feedback: Some(feedback),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_threshold_boundary() {
        let at = Evaluation {
            score: 30.0,
            feedback: None,
        };
        let below = Evaluation {
            score: 29.9,
            feedback: None,
        };
        assert!(at.passed());
        assert!(!below.passed());
    }

    #[test]
    fn test_rubric_verdict_deserializes_without_feedback() {
        let v: RubricVerdict = serde_json::from_str(r#"{"score": 55}"#).unwrap();
        assert_eq!(v.score, 55.0);
        assert!(v.feedback.is_none());
    }

    #[test]
    fn test_evaluation_serializes_without_null_feedback() {
        let e = Evaluation {
            score: 42.0,
            feedback: None,
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("feedback"));
    }
}
