//! Typed interview session state.
//!
//! Everything the interview needs to resume after a crash lives on `Session`
//! and round-trips through serde. Phase and difficulty level are closed enums;
//! skill/level for a transcript entry are explicit fields, never encoded into
//! the question string.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro-stage of an interview. Transitions are owned exclusively by the
/// phase state machine in `interview::machine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Introduction,
    Projects,
    Skills,
    Done,
}

/// Difficulty tier within the skills phase, in ascending order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Basic,
    Intermediate,
    Advanced,
}

impl Level {
    /// Levels in interview order.
    pub const ORDER: [Level; 3] = [Level::Basic, Level::Intermediate, Level::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Basic => "basic",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    /// Case-insensitive parse; `None` for unknown names.
    pub fn parse(s: &str) -> Option<Level> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Some(Level::Basic),
            "intermediate" => Some(Level::Intermediate),
            "advanced" => Some(Level::Advanced),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project recovered from the candidate's resume (or supplied directly).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(default)]
    pub project_title: String,
    #[serde(default)]
    pub summary: String,
}

/// One question/answer exchange. Append-only; entries are never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub phase: Phase,
    pub question: String,
    pub answer: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Set for skills-phase entries only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
}

/// Position within the skill queue. `skill_index` is strictly non-decreasing
/// over the life of a session; `level_index` resets to 0 on every skill
/// advance. `skill_index >= skills.len()` is the unique "skills phase done"
/// signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCursor {
    pub skill_index: usize,
    pub level_index: usize,
}

impl SkillCursor {
    pub fn level(&self) -> Level {
        Level::ORDER[self.level_index.min(Level::ORDER.len() - 1)]
    }

    /// Moves to the next level within the current skill. Returns `false` when
    /// there is no higher level (caller advances the skill instead).
    pub fn advance_level(&mut self) -> bool {
        if self.level_index + 1 >= Level::ORDER.len() {
            return false;
        }
        self.level_index += 1;
        true
    }

    pub fn advance_skill(&mut self) {
        self.skill_index += 1;
        self.level_index = 0;
    }
}

/// Per-(skill, level) counters for the current cursor position only.
/// Invariant after every scored answer: `asked == passes + fails`, `asked <= 3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounters {
    pub asked: u32,
    pub passes: u32,
    pub fails: u32,
}

impl LevelCounters {
    pub fn reset(&mut self) {
        *self = LevelCounters::default();
    }
}

/// Final verdict for one (skill, level), written exactly once when the level
/// completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillOutcome {
    pub passed: bool,
    pub passes: u32,
    pub fails: u32,
    pub asked: u32,
    pub feedback: String,
}

/// The question currently awaiting an answer, with enough context to score it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    /// Title of the project this question was built from (projects phase).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_title: Option<String>,
}

/// One interview instance. Owned by the registry behind a per-session mutex;
/// mutated only by `interview::machine::process_answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub candidate_name: String,
    pub role: String,
    pub phase: Phase,
    pub projects: Vec<ProjectSummary>,
    pub skills: Vec<String>,
    /// Keys lowercased at construction; lookup via `target_level`.
    pub skill_targets: HashMap<String, Level>,
    pub transcript: Vec<TranscriptEntry>,
    /// Per skill, per level outcomes. Level keys are an in-order prefix of
    /// `[basic, intermediate, advanced]`.
    pub skills_summary: BTreeMap<String, BTreeMap<Level, SkillOutcome>>,
    pub cursor: SkillCursor,
    pub counters: LevelCounters,
    pub asked_projects: Vec<String>,
    pub projects_asked: u32,
    pub projects_target: u32,
    pub pending_question: Option<PendingQuestion>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        candidate_name: String,
        role: String,
        skills: Vec<String>,
        skill_targets: HashMap<String, Level>,
        projects: Vec<ProjectSummary>,
    ) -> Self {
        let skill_targets = skill_targets
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Session {
            id: Uuid::new_v4(),
            candidate_name,
            role,
            phase: Phase::Introduction,
            projects,
            skills,
            skill_targets,
            transcript: Vec::new(),
            skills_summary: BTreeMap::new(),
            cursor: SkillCursor::default(),
            counters: LevelCounters::default(),
            asked_projects: Vec::new(),
            projects_asked: 0,
            projects_target: 0,
            pending_question: None,
            created_at: Utc::now(),
        }
    }

    /// Target level for a skill; defaults to `advanced` when the recruiter did
    /// not set one. Lookup is case-insensitive.
    pub fn target_level(&self, skill: &str) -> Level {
        self.skill_targets
            .get(&skill.to_lowercase())
            .copied()
            .unwrap_or(Level::Advanced)
    }

    pub fn current_skill(&self) -> Option<&str> {
        self.skills.get(self.cursor.skill_index).map(String::as_str)
    }

    /// Appends a transcript entry. Entries are append-only by construction —
    /// there is no API to rewrite one.
    #[allow(clippy::too_many_arguments)]
    pub fn record_answer(
        &mut self,
        phase: Phase,
        question: String,
        answer: String,
        score: f64,
        feedback: Option<String>,
        skill: Option<String>,
        level: Option<Level>,
    ) {
        self.transcript.push(TranscriptEntry {
            phase,
            question,
            answer,
            score,
            feedback,
            skill,
            level,
        });
    }

    /// Writes the outcome record for `(skill, level)`. The state machine
    /// finalizes each pair exactly once; a repeat call overwrites.
    pub fn record_skill_outcome(&mut self, skill: &str, level: Level, outcome: SkillOutcome) {
        self.skills_summary
            .entry(skill.to_string())
            .or_default()
            .insert(level, outcome);
    }

    /// Last `n` answers given in `phase`, oldest first.
    pub fn last_answers(&self, phase: Phase, n: usize) -> Vec<String> {
        let answers: Vec<&TranscriptEntry> = self
            .transcript
            .iter()
            .filter(|e| e.phase == phase)
            .collect();
        answers
            .iter()
            .rev()
            .take(n)
            .rev()
            .map(|e| e.answer.clone())
            .collect()
    }

    /// Last `n` questions asked in `phase`, oldest first. This is the
    /// recently-asked window consumed by the distinctness filter — derived
    /// from the transcript, never stored separately.
    pub fn recent_questions(&self, phase: Phase, n: usize) -> Vec<String> {
        let mut qs: Vec<String> = self
            .transcript
            .iter()
            .filter(|e| e.phase == phase)
            .map(|e| e.question.clone())
            .collect();
        if let Some(pending) = &self.pending_question {
            qs.push(pending.question.clone());
        }
        let skip = qs.len().saturating_sub(n);
        qs.split_off(skip)
    }
}
