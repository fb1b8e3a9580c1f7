//! Axum route handlers for the Interview API.
//!
//! Thin adapters only: phase decisions live in `interview::machine`, which
//! both the HTTP and WebSocket paths consume.

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        Multipart, Path, State, WebSocketUpgrade,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{extract_pdf_text, summarize_projects};
use crate::interview::machine::process_answer;
use crate::interview::results::{compute_results, InterviewResults};
use crate::models::session::{Level, PendingQuestion, Phase, ProjectSummary, Session};
use crate::questions::intro;
use crate::report::write_report;
use crate::scoring::Evaluation;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    pub candidate_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub target_skill_difficulties: HashMap<String, Level>,
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub projects: Option<Vec<ProjectSummary>>,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub session_id: Uuid,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub session_id: Uuid,
    pub next_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub session_id: Uuid,
    pub phase: Phase,
}

#[derive(Debug, Serialize)]
pub struct ExtractResumeResponse {
    pub raw_text: String,
    pub projects: Vec<ProjectSummary>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews
///
/// Creates a session and returns the introduction question. Projects come
/// from the request directly, or from resume text via LLM summarization.
pub async fn handle_start(
    State(state): State<AppState>,
    Json(request): Json<StartInterviewRequest>,
) -> Result<Json<StartInterviewResponse>, AppError> {
    if request.candidate_name.trim().is_empty() {
        return Err(AppError::Validation(
            "candidate_name is required".to_string(),
        ));
    }

    let projects = match request.projects {
        Some(projects) => projects,
        None => match request.resume_text.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(text) => summarize_projects(&state.oracle, text).await,
            None => vec![],
        },
    };

    let role = request
        .role
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| "Role".to_string());

    let mut session = Session::new(
        request.candidate_name.trim().to_string(),
        role,
        request.skills,
        request.target_skill_difficulties,
        projects,
    );

    let question = intro::generate(Some(&session.candidate_name));
    session.pending_question = Some(PendingQuestion {
        question: question.clone(),
        skill: None,
        level: None,
        project_title: None,
    });

    info!(
        session_id = %session.id,
        candidate = %session.candidate_name,
        skills = session.skills.len(),
        projects = session.projects.len(),
        "interview started"
    );

    let session_id = session.id;
    state.sessions.insert(session).await?;

    Ok(Json(StartInterviewResponse {
        session_id,
        question,
    }))
}

/// POST /api/v1/interviews/:id/answer
///
/// Applies one candidate answer and returns the next question (or the
/// terminal `next_question: null`).
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let response = answer_session(&state, id, &request.answer).await?;
    Ok(Json(response))
}

/// Shared answer path: lock the session, run the transition, persist.
/// Consumed by both the HTTP handler and the WebSocket loop.
pub async fn answer_session(
    state: &AppState,
    id: Uuid,
    answer: &str,
) -> Result<AnswerResponse, AppError> {
    let shared = state
        .sessions
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;

    // Per-session mutex: at most one in-flight answer per session.
    let mut session = shared.lock().await;
    let outcome = process_answer(
        &mut session,
        answer,
        &state.oracle,
        state.scorer.as_ref(),
    )
    .await?;
    state.sessions.store().save(&session).await?;

    Ok(AnswerResponse {
        session_id: id,
        next_question: outcome.next_question,
        evaluation: outcome.evaluation,
    })
}

/// GET /api/v1/interviews/:id
pub async fn handle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let shared = state
        .sessions
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    let phase = shared.lock().await.phase;
    Ok(Json(StatusResponse {
        session_id: id,
        phase,
    }))
}

/// GET /api/v1/interviews/:id/results
pub async fn handle_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewResults>, AppError> {
    let shared = state
        .sessions
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    let results = compute_results(&*shared.lock().await);
    Ok(Json(results))
}

/// GET /api/v1/interviews/:id/report
///
/// Renders the plain-text report, writes it under the reports dir, and
/// serves it as a download.
pub async fn handle_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = state
        .sessions
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    let session = shared.lock().await;
    let path = write_report(&session, &state.config.reports_dir).await?;
    let body = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.txt".to_string());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// POST /api/v1/resumes/extract
///
/// Multipart PDF upload → raw text + LLM-summarized projects.
pub async fn handle_extract_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResumeResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("resume.pdf").to_lowercase();
        if !filename.ends_with(".pdf") {
            return Err(AppError::Validation(
                "Unsupported resume format. Use .pdf".to_string(),
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::Validation("Empty upload".to_string()));
        }

        let raw_text = extract_pdf_text(&bytes)?;
        let projects = summarize_projects(&state.oracle, &raw_text).await;
        return Ok(Json(ExtractResumeResponse { raw_text, projects }));
    }

    Err(AppError::Validation(
        "Multipart field 'file' is required".to_string(),
    ))
}

/// GET /api/v1/oracle/health
///
/// One-shot generation probe with latency measurement.
pub async fn handle_oracle_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let started = std::time::Instant::now();
    match state.oracle.generate("Reply: ok", "Reply with the single word: ok").await {
        Ok(text) => Json(json!({
            "ok": true,
            "model": crate::llm_client::MODEL,
            "latency_ms": started.elapsed().as_millis() as u64,
            "sample": text.chars().take(60).collect::<String>(),
        })),
        Err(e) => Json(json!({
            "ok": false,
            "latency_ms": started.elapsed().as_millis() as u64,
            "error": e.to_string(),
        })),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// WebSocket adapter
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/interviews/:id/ws
///
/// Real-time Q&A over the same transition function as the HTTP handler.
pub async fn handle_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| ws_session(socket, state, id))
}

async fn ws_session(mut socket: WebSocket, state: AppState, id: Uuid) {
    // Authorize after accept so a bad id gets a proper close frame.
    match state.sessions.get(id).await {
        Ok(Some(_)) => {}
        _ => {
            warn!(session_id = %id, "websocket rejected: session not found");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: 1008,
                    reason: "session not found".into(),
                })))
                .await;
            return;
        }
    }
    info!(session_id = %id, "websocket established");

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
            continue;
        };
        match value.get("type").and_then(|t| t.as_str()) {
            Some("ping") => {
                let _ = socket
                    .send(Message::Text(json!({"type": "pong"}).to_string()))
                    .await;
            }
            Some("answer") => {
                let answer = value
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default();
                let reply = match answer_session(&state, id, answer).await {
                    Ok(response) => {
                        let data = response
                            .next_question
                            .map(|q| json!({ "question": q }));
                        json!({
                            "type": "question",
                            "data": data,
                            "evaluation": response.evaluation,
                        })
                    }
                    Err(e) => json!({ "type": "error", "error": e.to_string() }),
                };
                if socket.send(Message::Text(reply.to_string())).await.is_err() {
                    break;
                }
            }
            _ => {
                let _ = socket
                    .send(Message::Text(
                        json!({"type": "warning", "message": "Unknown message type"})
                            .to_string(),
                    ))
                    .await;
            }
        }
    }
    info!(session_id = %id, "websocket closed");
}
