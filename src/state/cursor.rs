//! Cursor position and cursor-to-source-page mapping.

use super::Section;

/// What the preview shows at the current cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorInfo<'a> {
    /// Section under the cursor.
    pub section: &'a Section,
    /// 1-indexed page inside the section's source document.
    pub source_page: u32,
}

/// Scrub position on the timeline, in pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    page: u32,
}

impl Cursor {
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Jump to a page, clamped to the navigable range.
    pub fn seek(&mut self, page: u32, max_timeline_page: u32) {
        self.page = page.min(max_navigable_page(max_timeline_page));
    }

    pub fn step_right(&mut self, max_timeline_page: u32) {
        self.seek(self.page.saturating_add(1), max_timeline_page);
    }

    pub fn step_left(&mut self, max_timeline_page: u32) {
        self.seek(self.page.saturating_sub(1), max_timeline_page);
    }

    /// Re-apply the upper bound after the timeline shrank.
    pub fn clamp(&mut self, max_timeline_page: u32) {
        self.seek(self.page, max_timeline_page);
    }
}

/// Highest page the cursor may rest on.
pub fn max_navigable_page(max_timeline_page: u32) -> u32 {
    max_timeline_page.saturating_sub(1)
}

/// Find the section covering `cursor`, if any.
pub fn active_section(sections: &[Section], cursor: u32) -> Option<&Section> {
    sections.iter().find(|section| section.contains(cursor))
}

/// Map a cursor to its section and source page.
pub fn cursor_info(sections: &[Section], cursor: u32) -> Option<CursorInfo<'_>> {
    let section = active_section(sections, cursor)?;
    let source_page = section.source_page_at(cursor)?;
    Some(CursorInfo {
        section,
        source_page,
    })
}
