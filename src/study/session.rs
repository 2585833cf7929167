//! Study session navigation state

use crate::study::StudyMode;

/// Position within a selected question list.
///
/// `position == len` is the completed state.
#[derive(Debug, Clone)]
pub struct StudySession {
    mode: StudyMode,
    questions: Vec<usize>,
    position: usize,
    show_answer: bool,
}

impl StudySession {
    pub fn new(mode: StudyMode, questions: Vec<usize>) -> Self {
        Self {
            mode,
            questions,
            position: 0,
            show_answer: false,
        }
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    /// Selected row indices in presentation order
    pub fn questions(&self) -> &[usize] {
        &self.questions
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.questions.len()
    }

    pub fn show_answer(&self) -> bool {
        self.show_answer
    }

    /// Row index of the question on screen, `None` once complete
    pub fn current(&self) -> Option<usize> {
        self.questions.get(self.position).copied()
    }

    /// Move to the next question. No-op on the last question.
    pub fn advance(&mut self) -> bool {
        if self.position + 1 >= self.questions.len() {
            return false;
        }
        self.position += 1;
        self.show_answer = false;
        true
    }

    /// Move to the previous question. No-op on the first question.
    pub fn retreat(&mut self) -> bool {
        if self.position == 0 || self.questions.is_empty() {
            return false;
        }
        self.position = self.position.min(self.questions.len()) - 1;
        self.show_answer = false;
        true
    }

    pub fn toggle_answer(&mut self) -> bool {
        self.show_answer = !self.show_answer;
        self.show_answer
    }

    /// Jump to the completed state
    pub fn finish(&mut self) {
        self.position = self.questions.len();
        self.show_answer = false;
    }

    /// Back to the first question, keeping the list order
    pub fn restart(&mut self) {
        self.position = 0;
        self.show_answer = false;
    }

    /// 1-based progress ratio for the question on screen
    pub fn progress(&self) -> f32 {
        if self.questions.is_empty() {
            return 0.0;
        }
        ((self.position + 1).min(self.questions.len())) as f32 / self.questions.len() as f32
    }
}
