//! Question records produced by the extractor

use crate::extract::patterns::numeric_key;
use serde::{Deserialize, Serialize};

/// One extracted exam question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    /// Normalized header, e.g. `QUESTION 12`
    pub id: String,
    /// Question prose in reading order
    pub question_text: String,
    /// Raw option blocks, each starting with an `A.` .. `F.` marker
    pub options: Vec<String>,
    /// Raw answer letters, empty when no answer line was found
    pub answer: String,
    /// Exhibit image file names, without duplicates
    pub images: Vec<String>,
    /// 1-based page where the record was created
    pub page: u32,
}

impl QuestionRecord {
    pub fn new(id: impl Into<String>, page: u32) -> Self {
        Self {
            id: id.into(),
            question_text: String::new(),
            options: Vec::new(),
            answer: String::new(),
            images: Vec::new(),
            page,
        }
    }

    /// Set the answer unless one was already captured. Returns whether it was set.
    pub fn set_answer_once(&mut self, answer: &str) -> bool {
        if !self.answer.is_empty() || answer.is_empty() {
            return false;
        }
        self.answer = answer.to_string();
        true
    }

    pub fn has_answer(&self) -> bool {
        !self.answer.is_empty()
    }

    /// Append a question text block.
    ///
    /// Skipped once the answer is known, or when the block repeats the text
    /// accumulated so far.
    pub fn append_text(&mut self, text: &str) -> bool {
        if self.has_answer() || self.question_text.trim() == text.trim() {
            return false;
        }
        if !self.question_text.is_empty() {
            self.question_text.push('\n');
        }
        self.question_text.push_str(text);
        true
    }

    /// Attach an image file name, ignoring duplicates
    pub fn add_image(&mut self, filename: &str) -> bool {
        if self.images.iter().any(|f| f == filename) {
            return false;
        }
        self.images.push(filename.to_string());
        true
    }

    /// Numeric key derived from the digits in the id
    pub fn numeric_key(&self) -> u32 {
        numeric_key(&self.id)
    }

    /// Flatten into a table row
    pub fn to_row(&self) -> QuestionRow {
        QuestionRow {
            id: self.id.clone(),
            question: self.question_text.trim().to_string(),
            options: self.options.join("\n"),
            answer: self.answer.clone(),
            images: self.images.join(","),
            page: self.page,
        }
    }
}

/// One row of the question table: `id, question, options, answer, images, page`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRow {
    pub id: String,
    pub question: String,
    /// Option blocks joined by newline
    pub options: String,
    pub answer: String,
    /// Image file names joined by comma
    pub images: String,
    pub page: u32,
}

impl QuestionRow {
    pub fn numeric_key(&self) -> u32 {
        numeric_key(&self.id)
    }

    /// Non-blank option lines
    pub fn option_lines(&self) -> Vec<&str> {
        self.options
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Image file names, trimmed, blanks dropped
    pub fn image_files(&self) -> Vec<&str> {
        self.images
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}
