// Rubric prompt constants for LLM-based answer scoring.

/// System prompt for project answer scoring — reasons-only feedback, JSON out.
pub const PROJECT_RUBRIC_SYSTEM: &str = "Evaluate the candidate's project answer. \
    Score 0-100 strictly as an integer. \
    Criteria: 1) Technical depth 2) Clarity & structure 3) Relevance to the project \
    4) Personal contribution/ownership. \
    In 'feedback', provide brief reasons that justify the score (strengths and what is missing). \
    Do not give advice or suggestions; reasons only. \
    You MUST respond with valid JSON only, no markdown fences.";

/// Project rubric prompt. Replace: {question}, {answer}.
pub const PROJECT_RUBRIC_TEMPLATE: &str = r#"Project question: {question}
Candidate answer:
{answer}

Return JSON strictly as {"score": <0..100>, "feedback": "..."}."#;

/// System prompt for skill answer scoring.
pub const SKILL_RUBRIC_SYSTEM: &str = "Evaluate a candidate's answer to a technical \
    interview question at the stated difficulty level. \
    Score 0-100 strictly as an integer, judging correctness, depth appropriate to the \
    level, and whether the answer actually addresses the question (restating the \
    question scores near zero). \
    In 'feedback', provide brief reasons only. \
    You MUST respond with valid JSON only, no markdown fences.";

/// Skill rubric prompt. Replace: {level}, {question}, {answer}.
pub const SKILL_RUBRIC_TEMPLATE: &str = r#"Difficulty level: {level}
Question: {question}
Candidate answer:
{answer}

Return JSON strictly as {"score": <0..100>, "feedback": "..."}."#;
