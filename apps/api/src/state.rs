use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::scoring::AnswerScorer;
use crate::session::registry::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Question oracle — the only path to the LLM.
    pub oracle: LlmClient,
    /// Pluggable answer scorer. Default: RubricScorer (LLM rubric with
    /// lexical fallback).
    pub scorer: Arc<dyn AnswerScorer>,
    /// Session registry: concurrent map of independently-locked sessions.
    pub sessions: SessionRegistry,
}
