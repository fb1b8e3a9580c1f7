//! Resume extraction — PDF text plus LLM project summarization.
//!
//! Text extraction is a file-format utility; the interesting output is the
//! list of `{project_title, summary}` pairs that seeds the projects phase.

use serde::Deserialize;
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::models::session::ProjectSummary;

/// Prompts longer than this are truncated before summarization.
const MAX_RESUME_CHARS: usize = 8000;

const PROJECT_SUMMARY_PROMPT: &str = r#"Extract all major projects from the following resume text.
Summarize each project in 2-3 lines.
Return output as a JSON array with objects of shape:
[{"project_title": "...", "summary": "..."}]

Resume text:
{resume_text}"#;

/// Extracts plain text from an uploaded PDF. Only PDF is supported — the
/// upload handler rejects other formats before reaching this point.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, AppError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Validation(format!("Failed to extract text from PDF: {e}")))
}

#[derive(Debug, Deserialize)]
struct RawProject {
    #[serde(default)]
    project_title: String,
    #[serde(default)]
    summary: String,
}

/// Asks the LLM for project summaries. Parse or oracle failure degrades to a
/// single generic item so interview start never blocks on summarization.
pub async fn summarize_projects(llm: &LlmClient, resume_text: &str) -> Vec<ProjectSummary> {
    let truncated: String = resume_text.chars().take(MAX_RESUME_CHARS).collect();
    let prompt = PROJECT_SUMMARY_PROMPT.replace("{resume_text}", &truncated);

    match llm.call_json::<Vec<RawProject>>(&prompt, JSON_ONLY_SYSTEM).await {
        Ok(raw) => {
            let projects: Vec<ProjectSummary> = raw
                .into_iter()
                .filter(|p| !p.project_title.trim().is_empty() || !p.summary.trim().is_empty())
                .map(|p| ProjectSummary {
                    project_title: p.project_title.trim().to_string(),
                    summary: p.summary.trim().to_string(),
                })
                .collect();
            if projects.is_empty() {
                fallback_projects()
            } else {
                projects
            }
        }
        Err(e) => {
            warn!("project summarization failed: {e}");
            fallback_projects()
        }
    }
}

fn fallback_projects() -> Vec<ProjectSummary> {
    vec![ProjectSummary {
        project_title: "Project".to_string(),
        summary: "Summary not available.".to_string(),
    }]
}
