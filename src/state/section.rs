use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_SECTION_TITLE, SECTION_COLORS};

/// A page-range slice of a source PDF placed on the timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Unique identifier (kept across resize/rename, fresh on split)
    pub id: Uuid,
    /// File name of the source PDF inside the subject's output folder
    pub source_document: String,
    /// First source page (1-indexed, inclusive)
    pub source_start_page: u32,
    /// Last source page (1-indexed, inclusive)
    pub source_end_page: u32,
    /// Display title
    #[serde(default = "default_title")]
    pub title: String,
    /// Offset on the timeline axis, in pages
    pub timeline_position: u32,
    /// Pages occupied on the timeline
    pub timeline_duration: u32,
    /// Cosmetic hex color
    #[serde(default = "default_color")]
    pub display_color: String,
}

impl Section {
    /// Create a section covering `start..=end` of a source document.
    pub fn new(
        source_document: impl Into<String>,
        source_start_page: u32,
        source_end_page: u32,
        timeline_position: u32,
    ) -> Self {
        let source_start_page = source_start_page.max(1);
        let source_end_page = source_end_page.max(source_start_page);
        Self {
            id: Uuid::new_v4(),
            source_document: source_document.into(),
            source_start_page,
            source_end_page,
            title: default_title(),
            timeline_position,
            timeline_duration: source_end_page - source_start_page + 1,
            display_color: default_color(),
        }
    }

    /// Create a section spanning every page of a library PDF.
    pub fn from_document(
        source_document: impl Into<String>,
        page_count: u32,
        timeline_position: u32,
    ) -> Self {
        Self::new(source_document, 1, page_count.max(1), timeline_position)
    }

    /// Builder-style color override.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.display_color = color.into();
        self
    }

    /// Builder-style title override.
    #[cfg(test)]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Timeline page just past the end of this section.
    pub fn timeline_end(&self) -> u32 {
        self.timeline_position + self.timeline_duration
    }

    /// Number of source pages covered.
    pub fn source_page_count(&self) -> u32 {
        self.source_end_page + 1 - self.source_start_page
    }

    /// Check whether a timeline cursor lands inside this section.
    pub fn contains(&self, cursor: u32) -> bool {
        cursor >= self.timeline_position && cursor < self.timeline_end()
    }

    /// Source page shown when the cursor sits at `cursor`.
    pub fn source_page_at(&self, cursor: u32) -> Option<u32> {
        if !self.contains(cursor) {
            return None;
        }
        Some(self.source_start_page + (cursor - self.timeline_position))
    }

    /// Range invariant plus duration/range agreement.
    pub fn is_consistent(&self) -> bool {
        self.source_start_page >= 1
            && self.source_end_page >= self.source_start_page
            && self.timeline_duration == self.source_page_count()
    }

    /// Title to show, falling back to the default for blank titles.
    pub fn display_title(&self) -> &str {
        let trimmed = self.title.trim();
        if trimmed.is_empty() {
            DEFAULT_SECTION_TITLE
        } else {
            trimmed
        }
    }
}

fn default_title() -> String {
    DEFAULT_SECTION_TITLE.to_string()
}

fn default_color() -> String {
    SECTION_COLORS[0].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_section_duration_matches_range() {
        let section = Section::new("book.pdf", 3, 7, 0);
        assert_eq!(section.timeline_duration, 5);
        assert!(section.is_consistent());
        assert_eq!(section.title, DEFAULT_SECTION_TITLE);
    }

    #[test]
    fn test_new_section_repairs_bad_range() {
        let section = Section::new("book.pdf", 0, 0, 0);
        assert_eq!(section.source_start_page, 1);
        assert_eq!(section.source_end_page, 1);
        assert!(section.is_consistent());
    }

    #[test]
    fn test_source_page_at() {
        let section = Section::new("book.pdf", 5, 10, 4);
        assert_eq!(section.source_page_at(3), None);
        assert_eq!(section.source_page_at(4), Some(5));
        assert_eq!(section.source_page_at(9), Some(10));
        assert_eq!(section.source_page_at(10), None);
    }

    #[test]
    fn test_display_title_falls_back() {
        let section = Section::new("book.pdf", 1, 2, 0).with_title("   ");
        assert_eq!(section.display_title(), DEFAULT_SECTION_TITLE);
        let section = section.with_title(" Chapter 1 ");
        assert_eq!(section.display_title(), "Chapter 1");
    }

    #[test]
    fn test_section_serialization() {
        let section = Section::from_document("notes.pdf", 12, 0).with_color("#10b981");
        let json = serde_json::to_string(&section).unwrap();
        let parsed: Section = serde_json::from_str(&json).unwrap();
        assert_eq!(section, parsed);
    }
}
