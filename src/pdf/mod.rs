//! PDF processing layer
//!
//! This module turns PDF pages into positioned elements using PDFium.

mod reader;

pub use reader::{
    group_into_blocks, group_into_lines, read_page_elements, read_pdf_bytes, CharInfo, LineInfo,
    PageElements,
};
