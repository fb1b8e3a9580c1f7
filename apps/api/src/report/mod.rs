//! Plain-text interview report rendering.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::interview::results::compute_results;
use crate::models::session::{Phase, Session};

/// Replaces filesystem-hostile characters and spaces.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
                '_'
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// Renders the full report as plain text: header, projects, per-phase Q&A,
/// and the skills summary.
pub fn render_text(session: &Session) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Candidate: {}", session.candidate_name));
    lines.push(format!("Role: {}", session.role));
    lines.push(format!("Date: {}", Utc::now().format("%Y-%m-%d %H:%M")));
    lines.push(String::new());

    if !session.projects.is_empty() {
        lines.push("Projects:".to_string());
        for p in &session.projects {
            let title = if p.project_title.is_empty() {
                "-"
            } else {
                &p.project_title
            };
            lines.push(format!("- {}: {}", title, p.summary));
        }
        lines.push(String::new());
    }

    for phase in [Phase::Introduction, Phase::Projects, Phase::Skills] {
        let entries: Vec<_> = session
            .transcript
            .iter()
            .filter(|e| e.phase == phase)
            .collect();
        if entries.is_empty() {
            continue;
        }
        lines.push(phase_heading(phase).to_string());
        for (idx, entry) in entries.iter().enumerate() {
            let n = idx + 1;
            lines.push(format!("Question {n}: {}", entry.question));
            lines.push(format!("Response {n}: {}", entry.answer));
            lines.push(format!("Score: {:.0}", entry.score));
            if let Some(fb) = &entry.feedback {
                lines.push(format!("Feedback: {fb}"));
            }
        }
        lines.push(String::new());
    }

    if !session.skills_summary.is_empty() {
        lines.push("Skills Summary:".to_string());
        let results = compute_results(session);
        for (skill, levels) in &session.skills_summary {
            lines.push(skill.clone());
            for (level, outcome) in levels {
                let verdict = if outcome.passed {
                    "Passed"
                } else {
                    "Not proficient"
                };
                lines.push(format!(
                    "  - {level}: {verdict} (passes={}, fails={}, asked={})",
                    outcome.passes, outcome.fails, outcome.asked
                ));
                if !outcome.feedback.is_empty() {
                    lines.push(format!("    Feedback: {}", outcome.feedback));
                }
            }
            if let Some(breakdown) = results.skills_breakdown.get(skill) {
                lines.push(format!(
                    "  Overall: {:.0}% | highest level: {} | target reached: {}",
                    breakdown.percentage_score,
                    breakdown.highest_difficulty,
                    if breakdown.target_reached { "yes" } else { "no" }
                ));
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn phase_heading(phase: Phase) -> &'static str {
    match phase {
        Phase::Introduction => "Introduction",
        Phase::Projects => "Projects",
        Phase::Skills => "Skills",
        Phase::Done => "Done",
    }
}

/// Writes the report under `reports_dir` and returns its path.
pub async fn write_report(session: &Session, reports_dir: &Path) -> Result<PathBuf> {
    let body = render_text(session);
    let filename = format!(
        "{}_{}.txt",
        sanitize_filename(&session.candidate_name),
        Utc::now().format("%Y-%m-%d")
    );
    let path = reports_dir.join(filename);
    tokio::fs::create_dir_all(reports_dir)
        .await
        .with_context(|| format!("Failed to create reports dir {}", reports_dir.display()))?;
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(path)
}
