//! MCP Server implementation using rmcp
//!
//! Exposes a study session over the extracted question table as MCP tools.

use crate::error::Error;
use crate::extract::{extract_questions, ExtractConfig, QuestionRow, DEFAULT_IMAGE_HEADER_GAP};
use crate::store::{FlagStore, QuestionTable};
use crate::study::{resolve_range, select_questions, RangeFilter, StudyMode, StudySession};
use anyhow::Result;
use base64::Engine;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// File and rendering configuration for the quiz server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Question table written by the extractor
    pub table_path: PathBuf,
    /// Directory holding exhibit images
    pub image_dir: PathBuf,
    /// Flag store file
    pub flag_path: PathBuf,
    /// Embed exhibit images as base64 PNG in question views (default: true)
    pub include_images: bool,
    /// Default page limit for extract_questions (default: 424)
    pub max_page: u32,
    /// Lookahead distance for image-to-header reassignment (default: 200)
    pub image_header_gap: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            table_path: PathBuf::from("ccnp_data.csv"),
            image_dir: PathBuf::from("ccnp_images"),
            flag_path: PathBuf::from("study_history.json"),
            include_images: true,
            max_page: 424,
            image_header_gap: DEFAULT_IMAGE_HEADER_GAP,
        }
    }
}

/// Mutable study state: loaded table, flags, and the running session
#[derive(Debug)]
pub struct StudyState {
    table_path: PathBuf,
    table: Option<QuestionTable>,
    flags: FlagStore,
    session: Option<StudySession>,
}

impl StudyState {
    /// Load the table and flag store. A missing table is reported on first use.
    pub fn load(config: &ServerConfig) -> Self {
        let table = match QuestionTable::load(&config.table_path) {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::warn!(error = %e, "question table unavailable");
                None
            }
        };

        Self {
            table_path: config.table_path.clone(),
            table,
            flags: FlagStore::load(&config.flag_path),
            session: None,
        }
    }

    fn table(&self) -> crate::error::Result<&QuestionTable> {
        self.table.as_ref().ok_or_else(|| Error::TableNotFound {
            path: self.table_path.display().to_string(),
        })
    }

    fn session_mut(&mut self) -> crate::error::Result<&mut StudySession> {
        self.session.as_mut().ok_or(Error::NoActiveSession)
    }

    /// Row currently on screen
    fn current_row(&self) -> crate::error::Result<&QuestionRow> {
        let index = self
            .session
            .as_ref()
            .and_then(StudySession::current)
            .ok_or(Error::NoActiveSession)?;
        let table = self.table()?;
        table.get(index).ok_or(Error::QuestionOutOfRange {
            index,
            total: table.len(),
        })
    }
}

/// PDF quiz MCP server
#[derive(Clone)]
pub struct QuizServer {
    state: Arc<RwLock<StudyState>>,
    tool_router: ToolRouter<Self>,
    /// Server configuration
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request/Response types for start_session and navigation
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StartSessionParams {
    /// Selection mode: sequential, range_ordered, range_random, flagged_ordered, flagged_random
    pub mode: StudyMode,
    /// First question number for range modes (default: lowest in the table)
    #[serde(default)]
    pub start: Option<u32>,
    /// Last question number for range modes, inclusive (default: highest in the table)
    #[serde(default)]
    pub end: Option<u32>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CurrentQuestionParams {
    /// Embed exhibit images as base64 PNG (default: server setting)
    #[serde(default)]
    pub include_images: Option<bool>,
}

/// Where the session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    Empty,
    InProgress,
    Complete,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExhibitInfo {
    /// Image file name
    pub filename: String,
    /// Whether the file exists in the image directory
    pub available: bool,
    /// Base64 encoded PNG data (only if requested and available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    /// MIME type of the embedded data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct QuestionView {
    /// Question id, e.g. "QUESTION 12"
    pub id: String,
    /// Source page (1-indexed)
    pub page: u32,
    /// Whether the question is flagged for review
    pub flagged: bool,
    /// Question text
    pub question: String,
    /// Option lines; empty when the question has no options
    pub options: Vec<String>,
    /// Exhibit images in document order
    pub exhibits: Vec<ExhibitInfo>,
    /// Whether the answer is revealed
    pub answer_visible: bool,
    /// Correct answer letters ("unknown" if none was extracted), only when revealed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SessionView {
    pub status: SessionStatus,
    /// Mode of the running session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<StudyMode>,
    /// 1-indexed position of the question on screen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Number of questions in the session
    pub total: usize,
    /// Fraction of the session reached, 0.0 - 1.0
    pub progress: f32,
    /// Number of flagged questions overall
    pub flagged_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error message if the request failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionView {
    fn failed(message: String) -> Self {
        Self {
            status: SessionStatus::NotStarted,
            mode: None,
            position: None,
            total: 0,
            progress: 0.0,
            flagged_count: 0,
            question: None,
            message: None,
            error: Some(message),
        }
    }
}

// ============================================================================
// Request/Response types for toggle_flag and list_flagged
// ============================================================================

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ToggleFlagParams {
    /// Question id to toggle (default: the question on screen)
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ToggleFlagResult {
    pub id: String,
    /// Flag state after the toggle
    pub flagged: bool,
    pub flagged_count: usize,
    /// Error message if the toggle failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct FlaggedListResult {
    /// Flagged question ids
    pub flagged: Vec<String>,
    pub count: usize,
}

// ============================================================================
// Request/Response types for study_overview
// ============================================================================

#[derive(Debug, Serialize, JsonSchema)]
pub struct ModeInfo {
    pub mode: StudyMode,
    pub description: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct OverviewResult {
    /// Whether the question table is loaded
    pub table_loaded: bool,
    pub question_count: usize,
    /// Lowest question number (range lower bound)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_question: Option<u32>,
    /// Highest question number (range upper bound)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_question: Option<u32>,
    pub flagged_count: usize,
    pub modes: Vec<ModeInfo>,
    pub session_status: SessionStatus,
    /// Error message if the table could not be loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for extract_questions
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractQuestionsParams {
    /// Path to the exam PDF
    pub pdf_path: String,
    /// Last page to process, 1-indexed inclusive; 0 for all pages (default: server setting)
    #[serde(default)]
    pub max_page: Option<u32>,
    /// Password for encrypted PDFs
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExtractQuestionsResult {
    pub pdf_path: String,
    pub pages_processed: u32,
    pub question_count: usize,
    pub image_count: usize,
    /// Questions without an extracted answer
    pub unanswered: usize,
    /// Error message if extraction failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl QuizServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new QuizServer with full configuration
    pub fn with_config(config: ServerConfig) -> Self {
        let state = StudyState::load(&config);
        Self {
            state: Arc::new(RwLock::new(state)),
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Describe the loaded question set and the available modes
    #[tool(
        description = "Show the loaded question set: number of questions, question number bounds for range modes, flagged count, available study modes, and whether a session is running."
    )]
    async fn study_overview(&self) -> String {
        let result = self.process_study_overview().await;
        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    /// Start or reset a study session
    #[tool(
        description = "Start (or restart) a study session. Modes:
- sequential: all questions in table order
- range_ordered / range_random: questions numbered start..=end, in order or shuffled
- flagged_ordered / flagged_random: flagged questions, in order or shuffled

Returns the first question."
    )]
    async fn start_session(&self, Parameters(params): Parameters<StartSessionParams>) -> String {
        let view = self.process_start_session(&params).await;
        Self::view_response(view, "start_session")
    }

    /// Show the question on screen
    #[tool(
        description = "Show the current question with its options, exhibit images, flag state, and the answer if revealed."
    )]
    async fn current_question(
        &self,
        Parameters(params): Parameters<CurrentQuestionParams>,
    ) -> String {
        let include_images = params.include_images.unwrap_or(self.config.include_images);
        let state = self.state.read().await;
        let view = self.render_session(&state, include_images);
        Self::view_response(view, "current_question")
    }

    /// Advance to the next question
    #[tool(
        description = "Go to the next question and hide the answer. Does nothing on the last question; use finish_session to end the session."
    )]
    async fn next_question(&self) -> String {
        let view = self
            .navigate(|session| {
                session.advance();
            })
            .await;
        Self::view_response(view, "next_question")
    }

    /// Go back to the previous question
    #[tool(
        description = "Go to the previous question and hide the answer. Does nothing on the first question."
    )]
    async fn previous_question(&self) -> String {
        let view = self
            .navigate(|session| {
                session.retreat();
            })
            .await;
        Self::view_response(view, "previous_question")
    }

    /// Show or hide the answer
    #[tool(description = "Show or hide the correct answer of the current question.")]
    async fn toggle_answer(&self) -> String {
        let view = self
            .navigate(|session| {
                session.toggle_answer();
            })
            .await;
        Self::view_response(view, "toggle_answer")
    }

    /// Complete the session
    #[tool(
        description = "End the session. Use restart_session to go through the same questions again."
    )]
    async fn finish_session(&self) -> String {
        let view = self.navigate(StudySession::finish).await;
        Self::view_response(view, "finish_session")
    }

    /// Restart with the same question order
    #[tool(
        description = "Go back to the first question of the running session, keeping its question order. Use start_session for a new selection or shuffle."
    )]
    async fn restart_session(&self) -> String {
        let view = self.navigate(StudySession::restart).await;
        Self::view_response(view, "restart_session")
    }

    /// Flag or unflag a question
    #[tool(
        description = "Flag or unflag a question for review (default: the current question). The flag list is saved immediately."
    )]
    async fn toggle_flag(&self, Parameters(params): Parameters<ToggleFlagParams>) -> String {
        let result = self.process_toggle_flag(&params).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "toggle_flag failed");
            ToggleFlagResult {
                id: params.id.clone().unwrap_or_default(),
                flagged: false,
                flagged_count: 0,
                error: Some(e.client_message()),
            }
        });
        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    /// List flagged question ids
    #[tool(description = "List the ids of all flagged questions.")]
    async fn list_flagged(&self) -> String {
        let state = self.state.read().await;
        let flagged: Vec<String> = state.flags.flagged().iter().cloned().collect();
        let result = FlaggedListResult {
            count: flagged.len(),
            flagged,
        };
        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    /// Run the extractor and reload the question table
    #[tool(
        description = "Extract questions from an exam PDF into the question table and image directory, then reload the table. Ends any running session."
    )]
    async fn extract_questions(
        &self,
        Parameters(params): Parameters<ExtractQuestionsParams>,
    ) -> String {
        let result = self
            .process_extract_questions(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "extract_questions failed");
                ExtractQuestionsResult {
                    pdf_path: params.pdf_path.clone(),
                    pages_processed: 0,
                    question_count: 0,
                    image_count: 0,
                    unanswered: 0,
                    error: Some(e.client_message()),
                }
            });
        serde_json::to_string_pretty(&result).unwrap_or_default()
    }
}

impl QuizServer {
    fn view_response(view: crate::error::Result<SessionView>, tool: &str) -> String {
        let view = view.unwrap_or_else(|e| {
            tracing::warn!(error = %e, tool, "tool failed");
            SessionView::failed(e.client_message())
        });
        serde_json::to_string_pretty(&view).unwrap_or_default()
    }

    pub async fn process_study_overview(&self) -> OverviewResult {
        let state = self.state.read().await;
        let modes = StudyMode::ALL
            .iter()
            .map(|&mode| ModeInfo {
                mode,
                description: mode.description().to_string(),
            })
            .collect();

        let (table_loaded, question_count, bounds, error) = match state.table() {
            Ok(table) => (true, table.len(), table.key_bounds(), None),
            Err(e) => (false, 0, None, Some(e.client_message())),
        };

        OverviewResult {
            table_loaded,
            question_count,
            min_question: bounds.map(|(min, _)| min),
            max_question: bounds.map(|(_, max)| max),
            flagged_count: state.flags.len(),
            modes,
            session_status: Self::status(&state),
            error,
        }
    }

    pub async fn process_start_session(
        &self,
        params: &StartSessionParams,
    ) -> crate::error::Result<SessionView> {
        let mut state = self.state.write().await;
        let table = state.table()?;

        let range = if params.mode.is_range() {
            resolve_range(table, params.start, params.end)?
        } else {
            RangeFilter { start: 0, end: 0 }
        };

        let questions = select_questions(
            table,
            params.mode,
            range,
            state.flags.flagged(),
            &mut rand::thread_rng(),
        );

        tracing::info!(mode = ?params.mode, questions = questions.len(), "session started");
        state.session = Some(StudySession::new(params.mode, questions));

        self.render_session(&state, self.config.include_images)
    }

    /// Apply a navigation step to the running session and render the result
    async fn navigate<F>(&self, step: F) -> crate::error::Result<SessionView>
    where
        F: FnOnce(&mut StudySession),
    {
        let mut state = self.state.write().await;
        step(state.session_mut()?);
        self.render_session(&state, self.config.include_images)
    }

    pub async fn process_toggle_flag(
        &self,
        params: &ToggleFlagParams,
    ) -> crate::error::Result<ToggleFlagResult> {
        let mut state = self.state.write().await;

        let id = match &params.id {
            Some(id) => id.clone(),
            None => state.current_row()?.id.clone(),
        };

        let flagged = state.flags.toggle(&id)?;
        tracing::info!(id = %id, flagged, "flag toggled");

        Ok(ToggleFlagResult {
            id,
            flagged,
            flagged_count: state.flags.len(),
            error: None,
        })
    }

    pub async fn process_extract_questions(
        &self,
        params: &ExtractQuestionsParams,
    ) -> crate::error::Result<ExtractQuestionsResult> {
        let config = ExtractConfig {
            pdf_path: PathBuf::from(&params.pdf_path),
            max_page: params.max_page.unwrap_or(self.config.max_page),
            table_path: self.config.table_path.clone(),
            image_dir: self.config.image_dir.clone(),
            image_header_gap: self.config.image_header_gap,
            password: params.password.clone(),
        };

        let summary = tokio::task::spawn_blocking(move || extract_questions(&config))
            .await
            .map_err(|e| Error::Pdfium {
                reason: format!("Task join error: {}", e),
            })??;

        let table = QuestionTable::load(&self.config.table_path)?;
        let mut state = self.state.write().await;
        state.table = Some(table);
        state.session = None;

        Ok(ExtractQuestionsResult {
            pdf_path: params.pdf_path.clone(),
            pages_processed: summary.pages_processed,
            question_count: summary.question_count,
            image_count: summary.image_count,
            unanswered: summary.unanswered,
            error: None,
        })
    }

    fn status(state: &StudyState) -> SessionStatus {
        match &state.session {
            None => SessionStatus::NotStarted,
            Some(session) if session.is_empty() => SessionStatus::Empty,
            Some(session) if session.is_complete() => SessionStatus::Complete,
            Some(_) => SessionStatus::InProgress,
        }
    }

    fn render_session(
        &self,
        state: &StudyState,
        include_images: bool,
    ) -> crate::error::Result<SessionView> {
        let flagged_count = state.flags.len();
        let status = Self::status(state);

        let mut view = SessionView {
            status,
            mode: state.session.as_ref().map(StudySession::mode),
            position: None,
            total: state.session.as_ref().map_or(0, StudySession::len),
            progress: 0.0,
            flagged_count,
            question: None,
            message: None,
            error: None,
        };

        let Some(session) = &state.session else {
            view.message = Some("No session running. Call start_session with a mode.".to_string());
            return Ok(view);
        };

        match status {
            SessionStatus::Empty => {
                view.message = Some(if session.mode().is_flagged() {
                    format!(
                        "No questions selected. Flagged questions: {}. Flag questions while studying to add them.",
                        flagged_count
                    )
                } else {
                    "No questions selected for this mode.".to_string()
                });
            }
            SessionStatus::Complete => {
                view.progress = 1.0;
                view.message = Some(
                    "Session complete. Call restart_session to go through it again.".to_string(),
                );
            }
            _ => {
                let row = state.current_row()?;
                view.position = Some(session.position() + 1);
                view.progress = session.progress();
                view.question = Some(self.question_view(
                    row,
                    state.flags.contains(&row.id),
                    session.show_answer(),
                    include_images,
                ));
            }
        }

        Ok(view)
    }

    fn question_view(
        &self,
        row: &QuestionRow,
        flagged: bool,
        answer_visible: bool,
        include_images: bool,
    ) -> QuestionView {
        let exhibits = row
            .image_files()
            .into_iter()
            .map(|name| self.exhibit(name, include_images))
            .collect();

        let answer = answer_visible.then(|| {
            if row.answer.trim().is_empty() {
                "unknown".to_string()
            } else {
                row.answer.clone()
            }
        });

        QuestionView {
            id: row.id.clone(),
            page: row.page,
            flagged,
            question: row.question.clone(),
            options: row.option_lines().into_iter().map(str::to_string).collect(),
            exhibits,
            answer_visible,
            answer,
        }
    }

    fn exhibit(&self, filename: &str, include_images: bool) -> ExhibitInfo {
        let path = self.config.image_dir.join(filename);
        let available = path.is_file();

        let data_base64 = if include_images && available {
            match std::fs::read(&path) {
                Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "failed to read exhibit");
                    None
                }
            }
        } else {
            None
        };

        ExhibitInfo {
            filename: filename.to_string(),
            available,
            mime_type: data_base64.as_ref().map(|_| "image/png".to_string()),
            data_base64,
        }
    }
}

impl Default for QuizServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for QuizServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PDF Quiz Server runs study sessions over exam questions extracted from a PDF. \
                 Call study_overview, then start_session with a mode, and walk the questions \
                 with next_question / previous_question / toggle_answer / toggle_flag."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server with default configuration
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let server = QuizServer::with_config(config);

    tracing::info!("PDF Quiz Server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
