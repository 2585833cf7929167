//! PDF reader wrapper for PDFium
//!
//! PDFium exposes characters and page objects, not text blocks. Characters are
//! grouped into lines by vertical proximity and lines into blocks by spacing,
//! which gives the extractor the same kind of positioned blocks a layout-aware
//! reader would.

use crate::error::{Error, Result};
use crate::extract::{is_option, match_answer, match_header, PageElement};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Character with top-down position
#[derive(Debug, Clone)]
pub struct CharInfo {
    /// The character
    pub char: char,
    /// X coordinate (left)
    pub x: f32,
    /// Distance from the top of the page to the glyph's upper edge
    pub top: f32,
    /// Character width
    pub width: f32,
    /// Character height (used for font size estimation)
    pub height: f32,
}

/// Line assembled from characters
#[derive(Debug, Clone)]
pub struct LineInfo {
    pub text: String,
    pub top: f32,
    pub bottom: f32,
    /// Average character height (font size proxy)
    pub avg_height: f32,
}

/// Elements of one page in collection order (text blocks first, then images)
#[derive(Debug, Clone)]
pub struct PageElements {
    /// Page number (1-indexed)
    pub page: u32,
    pub elements: Vec<PageElement>,
}

/// Line spacing multiplier above which a new block starts
const BLOCK_GAP_FACTOR: f32 = 1.5;

/// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
fn create_pdfium() -> Result<Pdfium> {
    // Try to bind to system library or use static linking
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Map PDFium errors to our error type
fn map_pdfium_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::PasswordRequired
        }
        _ => Error::Pdfium {
            reason: format!("{}", err),
        },
    }
}

/// Read the source file and check the PDF header
pub fn read_pdf_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::PdfNotFound {
            path: path.display().to_string(),
        });
    }

    let data = std::fs::read(path)?;

    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }

    Ok(data)
}

/// Collect positioned text blocks and image placements for pages
/// `1..=max_page` (every page when `max_page` is 0 or beyond the document).
///
/// Each distinct image on a page is written once to
/// `image_dir/p<page>_img<index>.png`; files that already exist are left
/// untouched. Every placement of that image becomes its own element.
pub fn read_page_elements<P: AsRef<Path>>(
    path: P,
    password: Option<&str>,
    max_page: u32,
    image_dir: &Path,
) -> Result<Vec<PageElements>> {
    let data = read_pdf_bytes(path)?;
    let pdfium = create_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(&data, password)
        .map_err(map_pdfium_error)?;

    let pages = document.pages();
    let page_count = pages.len() as u32;
    let last_page = if max_page == 0 {
        page_count
    } else {
        max_page.min(page_count)
    };

    if max_page > page_count {
        tracing::info!(max_page, page_count, "page limit beyond document, clamping");
    }

    let mut results = Vec::with_capacity(last_page as usize);

    for page_num in 1..=last_page {
        let page = pages
            .get((page_num - 1) as u16)
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to get page {}: {}", page_num, e),
            })?;

        let page_height = page.height().value;

        let mut elements = match page.text() {
            Ok(text) => {
                let chars = collect_chars(&text, page_height);
                let lines = group_into_lines(chars);
                group_into_blocks(lines)
            }
            Err(_) => Vec::new(),
        };

        elements.extend(collect_images(&document, &page, page_num, page_height, image_dir));

        tracing::debug!(page = page_num, elements = elements.len(), "page collected");

        results.push(PageElements {
            page: page_num,
            elements,
        });
    }

    Ok(results)
}

/// Collect characters with top-down positions
fn collect_chars(text_obj: &PdfPageText, page_height: f32) -> Vec<CharInfo> {
    let mut chars = Vec::new();

    for segment in text_obj.segments().iter() {
        if let Ok(char_iter) = segment.chars() {
            for char_result in char_iter.iter() {
                if let Some(c) = char_result.unicode_char() {
                    if c.is_control() {
                        continue;
                    }
                    if let Ok(bounds) = char_result.loose_bounds() {
                        chars.push(CharInfo {
                            char: c,
                            x: bounds.left().value,
                            top: page_height - bounds.top().value,
                            width: bounds.width().value,
                            height: bounds.height().value,
                        });
                    }
                }
            }
        }
    }

    chars
}

/// Y tolerance and space threshold from the median glyph height
fn calculate_thresholds(chars: &[CharInfo]) -> (f32, f32) {
    let mut heights: Vec<f32> = chars
        .iter()
        .filter(|c| c.height > 0.0)
        .map(|c| c.height)
        .collect();

    if heights.is_empty() {
        return (5.0, 10.0);
    }

    heights.sort_by(|a, b| a.total_cmp(b));
    let median_height = heights[heights.len() / 2];

    ((median_height * 0.4).max(2.0), (median_height * 0.3).max(3.0))
}

/// Group characters into lines, top to bottom
pub fn group_into_lines(mut chars: Vec<CharInfo>) -> Vec<LineInfo> {
    if chars.is_empty() {
        return Vec::new();
    }

    let (y_tolerance, space_threshold) = calculate_thresholds(&chars);

    chars.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x.total_cmp(&b.x)));

    let mut lines = Vec::new();
    let mut current: Vec<CharInfo> = Vec::new();
    let mut current_top: Option<f32> = None;

    for info in chars {
        match current_top {
            Some(top) if (info.top - top).abs() <= y_tolerance => current.push(info),
            _ => {
                if !current.is_empty() {
                    lines.push(build_line(std::mem::take(&mut current), space_threshold));
                }
                current_top = Some(info.top);
                current.push(info);
            }
        }
    }

    if !current.is_empty() {
        lines.push(build_line(current, space_threshold));
    }

    lines.retain(|line| !line.text.is_empty());
    lines
}

fn build_line(mut chars: Vec<CharInfo>, space_threshold: f32) -> LineInfo {
    chars.sort_by(|a, b| a.x.total_cmp(&b.x));

    let top = chars.iter().map(|c| c.top).fold(f32::MAX, f32::min);
    let bottom = chars.iter().map(|c| c.top + c.height).fold(f32::MIN, f32::max);
    let avg_height = chars.iter().map(|c| c.height).sum::<f32>() / chars.len() as f32;

    let mut text = String::new();
    let mut prev_right: Option<f32> = None;
    for c in &chars {
        if let Some(right) = prev_right {
            if c.x - right > space_threshold && c.char != ' ' && !text.ends_with(' ') {
                text.push(' ');
            }
        }
        text.push(c.char);
        prev_right = Some(c.x + c.width);
    }

    LineInfo {
        text: text.trim().to_string(),
        top,
        bottom,
        avg_height,
    }
}

/// Lines that always open a new block
fn starts_block(line: &str) -> bool {
    match_header(line).is_some() || match_answer(line).is_some() || is_option(line)
}

/// Merge consecutive lines into text blocks.
///
/// A block ends where the distance between line tops exceeds
/// `BLOCK_GAP_FACTOR` times the line height, or before a header, answer,
/// or option line.
pub fn group_into_blocks(lines: Vec<LineInfo>) -> Vec<PageElement> {
    let mut blocks = Vec::new();
    let mut block: Option<OpenBlock> = None;

    for line in lines {
        let breaks = match &block {
            Some(open) => {
                let normal_gap = open.last_height.max(line.avg_height);
                line.top - open.last_top > normal_gap * BLOCK_GAP_FACTOR
                    || starts_block(&line.text)
            }
            None => true,
        };

        if breaks {
            if let Some(open) = block.replace(OpenBlock::new(line)) {
                blocks.push(open.finish());
            }
        } else if let Some(open) = block.as_mut() {
            open.push(line);
        }
    }

    if let Some(open) = block {
        blocks.push(open.finish());
    }

    blocks
}

struct OpenBlock {
    top: f32,
    bottom: f32,
    text: String,
    last_top: f32,
    last_height: f32,
}

impl OpenBlock {
    fn new(line: LineInfo) -> Self {
        Self {
            top: line.top,
            bottom: line.bottom,
            text: line.text,
            last_top: line.top,
            last_height: line.avg_height,
        }
    }

    fn push(&mut self, line: LineInfo) {
        self.text.push('\n');
        self.text.push_str(&line.text);
        self.bottom = self.bottom.max(line.bottom);
        self.last_top = line.top;
        self.last_height = line.avg_height;
    }

    fn finish(self) -> PageElement {
        PageElement::text(self.top, self.bottom, self.text)
    }
}

/// Save each distinct image once and emit one element per placement
fn collect_images(
    document: &PdfDocument,
    page: &PdfPage,
    page_num: u32,
    page_height: f32,
    image_dir: &Path,
) -> Vec<PageElement> {
    let mut elements = Vec::new();
    let mut seen: HashMap<u64, String> = HashMap::new();

    for object in page.objects().iter() {
        let Some(image_object) = object.as_image_object() else {
            continue;
        };

        let bounds = match object.bounds() {
            Ok(bounds) => bounds,
            Err(e) => {
                tracing::debug!(page = page_num, error = %e, "image without bounds, skipped");
                continue;
            }
        };

        let dynamic_image = match image_object.get_processed_image(document) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(page = page_num, error = %e, "failed to decode image");
                continue;
            }
        };

        let filename = match save_distinct_image(&mut seen, image_dir, page_num, &dynamic_image) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(page = page_num, error = %e, "failed to save image");
                continue;
            }
        };

        elements.push(PageElement::image(
            page_height - bounds.top().value,
            page_height - bounds.bottom().value,
            filename,
        ));
    }

    elements
}

/// File name for `img`, saving it under `image_dir` the first time its
/// content shows up on the page.
///
/// Names are `p<page>_img<index>.png` with the index in order of first
/// appearance. A file that already exists is not rewritten.
fn save_distinct_image(
    seen: &mut HashMap<u64, String>,
    image_dir: &Path,
    page_num: u32,
    img: &DynamicImage,
) -> Result<String> {
    let mut hasher = DefaultHasher::new();
    (img.width(), img.height()).hash(&mut hasher);
    img.as_bytes().hash(&mut hasher);
    let key = hasher.finish();

    if let Some(name) = seen.get(&key) {
        return Ok(name.clone());
    }

    let name = format!("p{}_img{}.png", page_num, seen.len());
    let target = image_dir.join(&name);
    if !target.exists() {
        img.save_with_format(&target, image::ImageFormat::Png)?;
    }

    seen.insert(key, name.clone());
    Ok(name)
}
