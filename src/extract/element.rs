//! Positioned page elements fed to the question extractor

/// What a page element carries
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// A text block with its literal (possibly multi-line) text
    Text(String),
    /// One placement of an embedded image, referring to the saved file
    Image { filename: String },
}

/// A text block or image placement with its vertical extent.
///
/// Coordinates are top-down page units: `top` is the distance from the top edge
/// of the page to the upper edge of the element, `bottom` to its lower edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PageElement {
    pub top: f32,
    pub bottom: f32,
    pub kind: ElementKind,
}

impl PageElement {
    pub fn text(top: f32, bottom: f32, text: impl Into<String>) -> Self {
        Self {
            top,
            bottom,
            kind: ElementKind::Text(text.into()),
        }
    }

    pub fn image(top: f32, bottom: f32, filename: impl Into<String>) -> Self {
        Self {
            top,
            bottom,
            kind: ElementKind::Image {
                filename: filename.into(),
            },
        }
    }

    /// Text content, if this is a text block
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Text(text) => Some(text),
            ElementKind::Image { .. } => None,
        }
    }

    /// First line of a text block, trimmed
    pub fn first_line(&self) -> Option<&str> {
        self.as_text()
            .map(|text| text.lines().next().unwrap_or_default().trim())
    }
}

/// Sort elements top to bottom.
///
/// The sort is stable, so elements sharing a top edge keep their collection
/// order (text blocks are collected before images).
pub fn sort_reading_order(elements: &mut [PageElement]) {
    elements.sort_by(|a, b| a.top.total_cmp(&b.top));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_reading_order_is_stable() {
        let mut elements = vec![
            PageElement::text(300.0, 320.0, "C. third"),
            PageElement::text(100.0, 120.0, "QUESTION 1"),
            PageElement::image(100.0, 180.0, "p1_img0.png"),
            PageElement::text(200.0, 220.0, "A. first"),
        ];

        sort_reading_order(&mut elements);

        let tops: Vec<f32> = elements.iter().map(|e| e.top).collect();
        assert_eq!(tops, vec![100.0, 100.0, 200.0, 300.0]);
        assert_eq!(elements[0].as_text(), Some("QUESTION 1"));
        assert!(elements[1].as_text().is_none());
    }

    #[test]
    fn test_first_line_trims() {
        let el = PageElement::text(0.0, 10.0, "  Answer: B  \nExplanation");
        assert_eq!(el.first_line(), Some("Answer: B"));

        let img = PageElement::image(0.0, 10.0, "p1_img0.png");
        assert_eq!(img.first_line(), None);
    }
}
