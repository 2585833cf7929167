//! Question reconstruction from positioned page elements
//!
//! Elements of each page are walked top to bottom while a cursor tracks the
//! question currently being filled. Header blocks move the cursor, answer,
//! option and prose blocks fill the record under it, and image placements are
//! attributed either to the cursor or, when a header follows closely below the
//! image, to that upcoming question.

use crate::error::Result;
use crate::extract::element::{sort_reading_order, ElementKind, PageElement};
use crate::extract::patterns::{is_option, match_answer, match_header};
use crate::extract::record::QuestionRecord;
use crate::pdf::read_page_elements;
use crate::store::write_table;
use std::collections::HashMap;
use std::path::PathBuf;

/// Default maximum distance between an image's bottom edge and a following
/// element for the lookahead to keep scanning
pub const DEFAULT_IMAGE_HEADER_GAP: f32 = 200.0;

/// Extraction run configuration
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Source PDF
    pub pdf_path: PathBuf,
    /// Last page to process (1-based, inclusive); 0 processes every page
    pub max_page: u32,
    /// Output question table
    pub table_path: PathBuf,
    /// Output directory for exhibit images
    pub image_dir: PathBuf,
    /// Lookahead distance for image-to-header reassignment
    pub image_header_gap: f32,
    /// Password for encrypted PDFs
    pub password: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            pdf_path: PathBuf::from("350-401-1249-42-1.pdf"),
            max_page: 424,
            table_path: PathBuf::from("ccnp_data.csv"),
            image_dir: PathBuf::from("ccnp_images"),
            image_header_gap: DEFAULT_IMAGE_HEADER_GAP,
            password: None,
        }
    }
}

/// Outcome of an extraction run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub pages_processed: u32,
    pub question_count: usize,
    pub image_count: usize,
    pub unanswered: usize,
}

/// Where an image placement belongs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageTarget {
    /// A header follows the image closely; the image illustrates that question
    Upcoming(String),
    /// The question under the cursor
    Current(String),
    /// No cursor and no header ahead; continue the most recently created question
    LastCreated,
}

/// Decide which question the image at `image_index` belongs to.
///
/// Scans forward from the image over elements whose top edge lies within
/// `max_gap` of the image's bottom edge. The scan stops at the first text
/// block: if it is a question header the image goes to that question,
/// otherwise to `current_id`.
pub fn attribute_image(
    current_id: Option<&str>,
    elements: &[PageElement],
    image_index: usize,
    max_gap: f32,
) -> ImageTarget {
    if let Some(image) = elements.get(image_index) {
        for next in &elements[image_index + 1..] {
            if next.top - image.bottom > max_gap {
                break;
            }
            if let Some(line) = next.first_line() {
                if let Some(id) = match_header(line) {
                    return ImageTarget::Upcoming(id);
                }
                break;
            }
        }
    }

    match current_id {
        Some(id) => ImageTarget::Current(id.to_string()),
        None => ImageTarget::LastCreated,
    }
}

/// Stateful question builder fed one page at a time
#[derive(Debug)]
pub struct QuestionExtractor {
    records: Vec<QuestionRecord>,
    index: HashMap<String, usize>,
    current: Option<usize>,
    image_header_gap: f32,
}

impl Default for QuestionExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_HEADER_GAP)
    }
}

impl QuestionExtractor {
    pub fn new(image_header_gap: f32) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            current: None,
            image_header_gap,
        }
    }

    /// Id of the question under the cursor
    pub fn current_id(&self) -> Option<&str> {
        self.current.map(|idx| self.records[idx].id.as_str())
    }

    /// Process all elements of one page (1-based page number).
    ///
    /// The cursor carries over from the previous page, so questions spanning
    /// a page break keep accumulating.
    pub fn process_page(&mut self, page: u32, mut elements: Vec<PageElement>) {
        if elements.is_empty() {
            tracing::debug!(page, "page has no elements, skipping");
            return;
        }

        sort_reading_order(&mut elements);

        for i in 0..elements.len() {
            match &elements[i].kind {
                ElementKind::Text(text) => self.handle_text(page, text),
                ElementKind::Image { filename } => {
                    let target =
                        attribute_image(self.current_id(), &elements, i, self.image_header_gap);
                    self.attach_image(page, target, filename);
                }
            }
        }
    }

    /// Finish the pass and return records in creation order
    pub fn finish(self) -> Vec<QuestionRecord> {
        self.records
    }

    /// Index of the record for `id`, and whether it was created by this call
    fn ensure_record(&mut self, id: &str, page: u32) -> (usize, bool) {
        if let Some(&idx) = self.index.get(id) {
            return (idx, false);
        }
        let idx = self.records.len();
        self.records.push(QuestionRecord::new(id, page));
        self.index.insert(id.to_string(), idx);
        tracing::debug!(id, page, "new question");
        (idx, true)
    }

    fn handle_text(&mut self, page: u32, text: &str) {
        let first_line = text.lines().next().unwrap_or_default().trim();

        if let Some(id) = match_header(first_line) {
            let (idx, created) = self.ensure_record(&id, page);
            self.current = Some(idx);

            // A repeated header only moves the cursor. Records opened early by
            // an exhibit still take the body of their first real header.
            let record = &mut self.records[idx];
            if created || record.question_text.is_empty() {
                let body = text.lines().skip(1).collect::<Vec<_>>().join("\n");
                let body = body.trim();
                if !body.is_empty() {
                    record.append_text(body);
                }
            }
            return;
        }

        let Some(idx) = self.current else {
            return;
        };
        let record = &mut self.records[idx];

        if let Some(answer) = match_answer(first_line) {
            record.set_answer_once(&answer);
        } else if is_option(first_line) {
            record.options.push(text.to_string());
        } else {
            record.append_text(text);
        }
    }

    fn attach_image(&mut self, page: u32, target: ImageTarget, filename: &str) {
        let idx = match target {
            ImageTarget::Upcoming(id) => Some(self.ensure_record(&id, page).0),
            ImageTarget::Current(id) => self.index.get(&id).copied(),
            ImageTarget::LastCreated => self.records.len().checked_sub(1),
        };

        match idx {
            Some(idx) => {
                self.records[idx].add_image(filename);
            }
            None => tracing::debug!(page, filename, "image before any question, dropped"),
        }
    }
}

/// Run the full pipeline: read the PDF, rebuild questions, write the table and images
pub fn extract_questions(config: &ExtractConfig) -> Result<ExtractionSummary> {
    tracing::info!(
        pdf = %config.pdf_path.display(),
        max_page = config.max_page,
        "Starting question extraction"
    );

    std::fs::create_dir_all(&config.image_dir)?;

    let pages = read_page_elements(
        &config.pdf_path,
        config.password.as_deref(),
        config.max_page,
        &config.image_dir,
    )?;

    let mut extractor = QuestionExtractor::new(config.image_header_gap);
    let pages_processed = pages.len() as u32;
    for page in pages {
        extractor.process_page(page.page, page.elements);
    }

    let records = extractor.finish();
    write_table(&config.table_path, &records)?;

    let summary = ExtractionSummary {
        pages_processed,
        question_count: records.len(),
        image_count: records.iter().map(|r| r.images.len()).sum(),
        unanswered: records.iter().filter(|r| !r.has_answer()).count(),
    };

    tracing::info!(
        pages = summary.pages_processed,
        questions = summary.question_count,
        images = summary.image_count,
        unanswered = summary.unanswered,
        table = %config.table_path.display(),
        "Extraction complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(top: f32, t: &str) -> PageElement {
        PageElement::text(top, top + 12.0, t)
    }

    fn image(top: f32, bottom: f32, name: &str) -> PageElement {
        PageElement::image(top, bottom, name)
    }

    #[test]
    fn test_attribute_image_prefers_upcoming_header() {
        let elements = vec![
            image(100.0, 300.0, "p1_img0.png"),
            text(320.0, "QUESTION 5"),
        ];
        assert_eq!(
            attribute_image(Some("QUESTION 4"), &elements, 0, 200.0),
            ImageTarget::Upcoming("QUESTION 5".to_string())
        );
    }

    #[test]
    fn test_attribute_image_stops_at_first_text() {
        let elements = vec![
            image(100.0, 300.0, "p1_img0.png"),
            text(310.0, "A. some option"),
            text(330.0, "QUESTION 5"),
        ];
        assert_eq!(
            attribute_image(Some("QUESTION 4"), &elements, 0, 200.0),
            ImageTarget::Current("QUESTION 4".to_string())
        );
    }

    #[test]
    fn test_attribute_image_respects_gap() {
        let elements = vec![
            image(100.0, 300.0, "p1_img0.png"),
            text(501.0, "QUESTION 5"),
        ];
        assert_eq!(
            attribute_image(Some("QUESTION 4"), &elements, 0, 200.0),
            ImageTarget::Current("QUESTION 4".to_string())
        );
        // exactly at the threshold still counts
        let elements = vec![
            image(100.0, 300.0, "p1_img0.png"),
            text(500.0, "QUESTION 5"),
        ];
        assert_eq!(
            attribute_image(Some("QUESTION 4"), &elements, 0, 200.0),
            ImageTarget::Upcoming("QUESTION 5".to_string())
        );
    }

    #[test]
    fn test_attribute_image_skips_other_images() {
        let elements = vec![
            image(100.0, 200.0, "p1_img0.png"),
            image(210.0, 300.0, "p1_img1.png"),
            text(320.0, "Question 9"),
        ];
        assert_eq!(
            attribute_image(None, &elements, 0, 200.0),
            ImageTarget::Upcoming("QUESTION 9".to_string())
        );
    }

    #[test]
    fn test_attribute_image_fallback() {
        let elements = vec![image(100.0, 200.0, "p2_img0.png")];
        assert_eq!(
            attribute_image(None, &elements, 0, 200.0),
            ImageTarget::LastCreated
        );
    }

    #[test]
    fn test_header_creates_single_record() {
        let mut extractor = QuestionExtractor::default();
        extractor.process_page(
            1,
            vec![
                text(10.0, "QUESTION 1"),
                text(30.0, "What is OSPF?"),
                text(50.0, "Question 1"),
            ],
        );
        let records = extractor.finish();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "QUESTION 1");
        assert_eq!(records[0].page, 1);
    }

    #[test]
    fn test_answer_first_match_wins() {
        let mut extractor = QuestionExtractor::default();
        extractor.process_page(
            1,
            vec![
                text(10.0, "QUESTION 1"),
                text(30.0, "Answer: B"),
                text(50.0, "Correct Answer: C"),
            ],
        );
        let records = extractor.finish();
        assert_eq!(records[0].answer, "B");
    }

    #[test]
    fn test_text_before_first_header_is_ignored() {
        let mut extractor = QuestionExtractor::default();
        extractor.process_page(
            1,
            vec![text(10.0, "Exam 350-401"), text(30.0, "Answer: A")],
        );
        assert!(extractor.finish().is_empty());
    }

    #[test]
    fn test_header_body_becomes_question_text() {
        let mut extractor = QuestionExtractor::default();
        extractor.process_page(
            1,
            vec![text(10.0, "QUESTION 3\nWhich command enables BGP?")],
        );
        let records = extractor.finish();
        assert_eq!(records[0].question_text, "Which command enables BGP?");
    }

    #[test]
    fn test_image_above_header_goes_to_upcoming_question() {
        let mut extractor = QuestionExtractor::default();
        extractor.process_page(
            1,
            vec![
                text(10.0, "QUESTION 1"),
                text(30.0, "Refer to the exhibit."),
                image(100.0, 300.0, "p1_img0.png"),
                text(350.0, "QUESTION 2"),
            ],
        );
        let records = extractor.finish();
        assert!(records[0].images.is_empty());
        assert_eq!(records[1].images, vec!["p1_img0.png"]);
    }

    #[test]
    fn test_repeated_header_keeps_question_text() {
        let mut extractor = QuestionExtractor::default();
        extractor.process_page(
            1,
            vec![
                text(10.0, "QUESTION 1\nWhich protocol?"),
                text(30.0, "A. OSPF"),
                text(50.0, "QUESTION 1\nrunning header text"),
            ],
        );
        let records = extractor.finish();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question_text, "Which protocol?");
        assert!(!records[0].has_answer());
    }

    #[test]
    fn test_header_body_fills_record_opened_by_image() {
        let mut extractor = QuestionExtractor::default();
        extractor.process_page(
            1,
            vec![
                image(100.0, 300.0, "p1_img0.png"),
                text(320.0, "QUESTION 2\nRefer to the exhibit."),
            ],
        );
        let records = extractor.finish();
        assert_eq!(records[0].images, vec!["p1_img0.png"]);
        assert_eq!(records[0].question_text, "Refer to the exhibit.");
    }

    #[test]
    fn test_answer_line_without_letters_is_not_question_text() {
        let mut extractor = QuestionExtractor::default();
        extractor.process_page(
            1,
            vec![
                text(10.0, "QUESTION 1\nWhich protocol?"),
                text(30.0, "Answer the question using the exhibit."),
                text(50.0, "Correct Answer: B"),
            ],
        );
        let records = extractor.finish();
        assert_eq!(records[0].question_text, "Which protocol?");
        assert_eq!(records[0].answer, "B");
    }

    #[test]
    fn test_cursor_carries_across_pages() {
        let mut extractor = QuestionExtractor::default();
        extractor.process_page(1, vec![text(10.0, "QUESTION 1"), text(700.0, "A. first")]);
        extractor.process_page(2, vec![]);
        extractor.process_page(3, vec![text(10.0, "B. second"), text(40.0, "Answer: B")]);
        let records = extractor.finish();
        assert_eq!(records[0].options, vec!["A. first", "B. second"]);
        assert_eq!(records[0].answer, "B");
    }
}
