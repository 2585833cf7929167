//! PDF Quiz Server Library
//!
//! Turns an exam PDF into a question table and serves study sessions over it:
//! - `extract`: classify page text and images into question records
//! - `store`: the CSV question table and the persisted flag list
//! - `study`: question selection modes and session navigation
//! - `server`: MCP tools driving a study session

pub mod cli;
pub mod error;
pub mod extract;
pub mod pdf;
pub mod server;
pub mod store;
pub mod study;

pub use error::{Error, Result};
pub use extract::{extract_questions, ExtractConfig, ExtractionSummary, QuestionRecord, QuestionRow};
pub use server::{run_server, run_server_with_config, QuizServer, ServerConfig};
pub use store::{FlagStore, QuestionTable};
pub use study::{StudyMode, StudySession};
