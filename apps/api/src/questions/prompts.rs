// All LLM prompt constants for question selection.
// Cross-cutting system fragments live in llm_client::prompts.

use crate::models::session::Level;

/// Per-level guidance injected into every skill question prompt.
pub fn level_guidance(level: Level) -> &'static str {
    match level {
        Level::Basic => {
            "Ask a simple, concept-based question that checks the candidate's understanding \
             of the core principles in this skill. Ensure the question is clear, direct, and \
             helps assess grasp of the basics rather than complex application."
        }
        Level::Intermediate => {
            "Ask a moderately challenging question that requires the candidate to apply \
             concepts or explain reasoning with an example. The question should connect \
             related ideas and test both understanding and practical thinking."
        }
        Level::Advanced => {
            "Ask a challenging, real-world question that tests the candidate's ability to \
             analyze scenarios, design efficient solutions, and reason about trade-offs. The \
             question should encourage problem-solving and decision-making at an advanced level."
        }
    }
}

/// Adaptive mode: assess the prior answer silently, then probe a weak area or
/// raise difficulty. Replace: {skill}, {level}, {guidance}, {last_answers},
/// {avoid_topics}.
pub const SKILL_ADAPTIVE_TEMPLATE: &str = r#"Skill: {skill}
Level: {level}
Guidance: {guidance}

Candidate's recent answers:
{last_answers}

Silently assess how well the recent answers demonstrate understanding. Do NOT
write the assessment. Then produce exactly ONE next interview question that
either probes the weakest area of those answers or raises the difficulty one
notch within this level.

Avoid these already-covered topics: {avoid_topics}

Output exactly ONE question line. No lists, no intro text, no commentary."#;

/// Diversity mode: fresh subtopic, ignore answer history. Replace: {skill},
/// {level}, {guidance}, {avoid_topics}.
pub const SKILL_DIVERSITY_TEMPLATE: &str = r#"Skill: {skill}
Level: {level}
Guidance: {guidance}

Produce exactly ONE interview question on a subtopic of this skill that is NOT
in this list: {avoid_topics}

Pick a genuinely different corner of the skill. Output exactly ONE question
line. No lists, no intro text, no commentary."#;

/// Last-resort oracle prompt: enumerate the exact prior questions to avoid.
/// Replace: {skill}, {level}, {guidance}, {prior_questions}.
pub const SKILL_DIRECT_DISTINCT_TEMPLATE: &str = r#"Skill: {skill}
Level: {level}
Guidance: {guidance}

Every question below has already been asked. Generate ONE new question about
this skill that shares no main topic with ANY of them:
{prior_questions}

Output exactly ONE question line. No lists, no intro text, no commentary."#;

/// Project question prompt. Replace: {title}, {summary}, {last_answers},
/// {focus}.
pub const PROJECT_QUESTION_TEMPLATE: &str = r#"Generate ONE concise implementation-focused question about this project.
It MUST reference the project title or topic and be moderate difficulty.

Project title: {title}
Summary: {summary}
Recent responses:
{last_answers}

Focus area: {focus}

Rules:
- Center on practical implementation ("how did you", "walk me through", "which tools").
- Avoid deep theory and broad system-design hypotheticals.
- Avoid the words security, integrity, consistency, compliance, encryption unless the summary mentions them.
- Output exactly ONE question line. No lists, no intro text."#;

/// Rotating emphases for project questions so consecutive candidates (and
/// consecutive questions) do not all land on the same angle.
pub const FOCUS_AREAS: &[&str] = &[
    "the way you implemented a core feature",
    "how data flows between components",
    "an API endpoint you designed",
    "a specific data model decision",
    "how you handled state or workflow progression",
    "a deployment or environment setup step",
    "a testing approach you relied on",
    "a performance tweak you made",
    "a library or tool selection and rationale",
    "an edge case you discovered and solved",
];
