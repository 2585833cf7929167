//! Command line interface

use crate::extract::{extract_questions, ExtractConfig, DEFAULT_IMAGE_HEADER_GAP};
use crate::server::{run_server_with_config, ServerConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pdf-quiz-server", version, about = "Exam PDF question extractor and study server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract questions and exhibit images from an exam PDF
    Extract(ExtractArgs),
    /// Run the MCP study server on stdio
    Serve(ServeArgs),
}

/// Output locations shared by both subcommands
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Question table (CSV)
    #[arg(long, env = "PDF_QUIZ_TABLE", default_value = "ccnp_data.csv")]
    pub table: PathBuf,

    /// Directory for exhibit images
    #[arg(long, env = "PDF_QUIZ_IMAGES", default_value = "ccnp_images")]
    pub images: PathBuf,

    /// Vertical distance within which an image above a header belongs to that header
    #[arg(long, default_value_t = DEFAULT_IMAGE_HEADER_GAP)]
    pub image_header_gap: f32,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Exam PDF
    pub pdf: PathBuf,

    /// Last page to process (1-indexed, inclusive); 0 for all pages
    #[arg(long, default_value_t = 424)]
    pub max_page: u32,

    /// Password for encrypted PDFs
    #[arg(long, env = "PDF_QUIZ_PASSWORD")]
    pub password: Option<String>,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Flag list (JSON)
    #[arg(long, env = "PDF_QUIZ_FLAGS", default_value = "study_history.json")]
    pub flags: PathBuf,

    /// Do not embed exhibit images in question views
    #[arg(long)]
    pub no_images: bool,

    /// Default page limit for the extract_questions tool
    #[arg(long, default_value_t = 424)]
    pub max_page: u32,

    #[command(flatten)]
    pub store: StoreArgs,
}

impl ExtractArgs {
    pub fn to_config(&self) -> ExtractConfig {
        ExtractConfig {
            pdf_path: self.pdf.clone(),
            max_page: self.max_page,
            table_path: self.store.table.clone(),
            image_dir: self.store.images.clone(),
            image_header_gap: self.store.image_header_gap,
            password: self.password.clone(),
        }
    }
}

impl ServeArgs {
    pub fn to_config(&self) -> ServerConfig {
        ServerConfig {
            table_path: self.store.table.clone(),
            image_dir: self.store.images.clone(),
            flag_path: self.flags.clone(),
            include_images: !self.no_images,
            max_page: self.max_page,
            image_header_gap: self.store.image_header_gap,
        }
    }
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Extract(args) => {
            let config = args.to_config();
            let summary = tokio::task::spawn_blocking(move || extract_questions(&config)).await??;
            println!(
                "Extracted {} questions ({} images, {} without answer) from {} pages into {}",
                summary.question_count,
                summary.image_count,
                summary.unanswered,
                summary.pages_processed,
                args.store.table.display()
            );
            Ok(())
        }
        Command::Serve(args) => run_server_with_config(args.to_config()).await,
    }
}
