//! Error types for the PDF quiz server

use thiserror::Error;

/// Result type alias for the PDF quiz server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDF quiz server
#[derive(Error, Debug)]
pub enum Error {
    /// PDF file not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDF is password protected and no password was provided
    #[error("PDF is password protected")]
    PasswordRequired,

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// Question table not found
    #[error("Question table not found: {path}")]
    TableNotFound { path: String },

    /// Question table could not be read or written
    #[error("Question table error: {0}")]
    Table(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid question number range
    #[error("Invalid question range: {start}-{end}")]
    InvalidRange { start: u32, end: u32 },

    /// Navigation or flag toggle without a started session
    #[error("No active study session")]
    NoActiveSession,

    /// Session list points past the loaded table
    #[error("Question index {index} out of range (table has {total} rows)")]
    QuestionOutOfRange { index: usize, total: usize },
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::PdfNotFound { .. } => "PDF not found".to_string(),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::PasswordRequired => "PDF is password protected".to_string(),
            Error::Pdfium { .. } => "PDF processing error".to_string(),
            Error::TableNotFound { .. } => {
                "Question table not found, run the extractor first".to_string()
            }
            Error::Table(_) => "Question table could not be read".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Serialization(_) => "Serialization error".to_string(),
            Error::Image(_) => "Image processing error".to_string(),
            Error::InvalidRange { start, end } => {
                format!("Invalid question range: {}-{}", start, end)
            }
            Error::NoActiveSession => {
                "No active study session, call start_session first".to_string()
            }
            Error::QuestionOutOfRange { .. } => {
                "Session is out of sync with the question table, start a new session".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_paths() {
        let err = Error::TableNotFound {
            path: "/home/user/secret/ccnp_data.csv".to_string(),
        };
        assert!(!err.client_message().contains("/home/user"));
        assert!(err.to_string().contains("/home/user/secret/ccnp_data.csv"));
    }

    #[test]
    fn test_client_message_keeps_range() {
        let err = Error::InvalidRange { start: 9, end: 3 };
        assert_eq!(err.client_message(), "Invalid question range: 9-3");
    }
}
