use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cursor::{self, CursorInfo};
use super::Section;
use crate::core::magnetic;

/// Ordered set of all sections in one editing session.
///
/// Structural operations (`append`, `split_at`, `remove`, `repack`) leave the
/// sections packed: sorted by position, starting at 0, with no gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    sections: Vec<Section>,
}

impl Timeline {
    /// Sections in timeline order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// End of the last section (0 when empty).
    pub fn max_timeline_page(&self) -> u32 {
        self.sections
            .iter()
            .map(Section::timeline_end)
            .max()
            .unwrap_or(0)
    }

    /// Sum of all section durations.
    pub fn total_pages(&self) -> u32 {
        self.sections.iter().map(|s| s.timeline_duration).sum()
    }

    /// Find a section by ID
    pub fn find(&self, id: Uuid) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: Uuid) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// Section under the cursor, if any.
    pub fn active_section(&self, cursor: u32) -> Option<&Section> {
        cursor::active_section(&self.sections, cursor)
    }

    /// Section and source page under the cursor.
    pub fn cursor_info(&self, cursor: u32) -> Option<CursorInfo<'_>> {
        cursor::cursor_info(&self.sections, cursor)
    }

    /// Place a section after the current end of the timeline.
    pub fn append(&mut self, mut section: Section) -> Uuid {
        let id = section.id;
        section.timeline_position = self.max_timeline_page();
        self.sections.push(section);
        self.repack();
        id
    }

    /// Split the section under `cursor` into two adjacent parts.
    ///
    /// Returns the id of the new second part, or `None` when there is no
    /// section under the cursor or the cursor sits on its first page.
    pub fn split_at(&mut self, cursor: u32) -> Option<Uuid> {
        let index = self.sections.iter().position(|s| s.contains(cursor))?;
        let target = &self.sections[index];
        if cursor == target.timeline_position {
            return None;
        }

        let offset = cursor - target.timeline_position;
        let split_source_page = target.source_start_page + offset;

        let mut head = target.clone();
        head.source_end_page = split_source_page - 1;
        head.timeline_duration = offset;

        let mut tail = target.clone();
        tail.id = Uuid::new_v4();
        tail.source_start_page = split_source_page;
        tail.timeline_position = target.timeline_position + offset;
        tail.timeline_duration = target.source_end_page - split_source_page + 1;
        let tail_id = tail.id;

        self.sections[index] = head;
        self.sections.insert(index + 1, tail);
        self.repack();
        Some(tail_id)
    }

    /// Remove a section by ID
    pub fn remove(&mut self, id: Uuid) -> bool {
        let len = self.sections.len();
        self.sections.retain(|s| s.id != id);
        if self.sections.len() == len {
            return false;
        }
        self.repack();
        true
    }

    /// Update a section title by ID.
    pub fn rename(&mut self, id: Uuid, title: impl Into<String>) -> bool {
        if let Some(section) = self.find_mut(id) {
            section.title = title.into();
            return true;
        }
        false
    }

    /// Restore the magnetic layout after in-place edits.
    pub fn repack(&mut self) {
        magnetic::pack(&mut self.sections);
    }

    pub fn is_packed(&self) -> bool {
        magnetic::is_packed(&self.sections)
    }
}
