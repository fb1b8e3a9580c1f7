//! End-of-interview breakdowns computed from session state.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::session::{Level, Phase, Session};

#[derive(Debug, Serialize)]
pub struct ResultsSummary {
    pub candidate_name: String,
    pub role: String,
    pub total_questions: usize,
}

/// One transcript entry enriched with its 1-based position.
#[derive(Debug, Serialize)]
pub struct EvaluationRecord {
    pub question_number: usize,
    pub phase: Phase,
    pub question: String,
    pub answer: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Level>,
}

#[derive(Debug, Serialize)]
pub struct SkillBreakdown {
    pub questions_asked: u32,
    pub percentage_score: f64,
    pub highest_difficulty: Level,
    pub target_reached: bool,
}

#[derive(Debug, Serialize)]
pub struct InterviewResults {
    pub summary: ResultsSummary,
    pub evaluations: Vec<EvaluationRecord>,
    pub skills_breakdown: BTreeMap<String, SkillBreakdown>,
}

/// Produces the full results payload. Valid at any point in the interview;
/// complete once the phase is `done`.
pub fn compute_results(session: &Session) -> InterviewResults {
    let evaluations: Vec<EvaluationRecord> = session
        .transcript
        .iter()
        .enumerate()
        .map(|(i, entry)| EvaluationRecord {
            question_number: i + 1,
            phase: entry.phase,
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            score: entry.score,
            feedback: entry.feedback.clone(),
            skill: entry.skill.clone(),
            difficulty: entry.level,
        })
        .collect();

    let mut skills_breakdown = BTreeMap::new();
    for (skill, levels) in &session.skills_summary {
        let questions_asked: u32 = levels.values().map(|o| o.asked).sum();
        let passes: u32 = levels.values().map(|o| o.passes).sum();
        let fails: u32 = levels.values().map(|o| o.fails).sum();
        // Guarded denominator: zero recorded answers score 0%, never a panic.
        let total = (passes + fails).max(1);
        let percentage_score =
            (passes as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
        let highest_difficulty = levels.keys().max().copied().unwrap_or(Level::Basic);
        let target_reached = levels
            .get(&Level::Advanced)
            .map(|o| o.passed)
            .unwrap_or(false);

        skills_breakdown.insert(
            skill.clone(),
            SkillBreakdown {
                questions_asked,
                percentage_score,
                highest_difficulty,
                target_reached,
            },
        );
    }

    InterviewResults {
        summary: ResultsSummary {
            candidate_name: session.candidate_name.clone(),
            role: session.role.clone(),
            total_questions: evaluations.len(),
        },
        evaluations,
        skills_breakdown,
    }
}
