//! Question extraction from fixed-layout exam PDFs

mod element;
mod extractor;
mod patterns;
mod record;

pub use element::{sort_reading_order, ElementKind, PageElement};
pub use extractor::{
    attribute_image, extract_questions, ExtractConfig, ExtractionSummary, ImageTarget,
    QuestionExtractor, DEFAULT_IMAGE_HEADER_GAP,
};
pub use patterns::{is_option, match_answer, match_header, numeric_key};
pub use record::{QuestionRecord, QuestionRow};
