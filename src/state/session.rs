//! Edit session
//!
//! The single owner of the timeline, its undo history, the cursor, the zoom
//! level and any in-flight resize gesture. Every front end drives editing
//! through this type.

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::cursor::{Cursor, CursorInfo};
use super::resize::{self, ResizeEdge, ResizeGesture, ResizeState};
use super::{HistoryStack, Section, Timeline};
use crate::constants::{
    SECTION_COLORS, ZOOM_DEFAULT, ZOOM_IN_STEP, ZOOM_MAX, ZOOM_MIN, ZOOM_OUT_STEP,
};
use crate::hotkeys::EditorCommand;

/// Errors from strict editing calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The operation needs a section under the cursor and there is none.
    #[error("no section under the cursor at page {cursor}")]
    MissingActiveSection { cursor: u32 },

    /// A referenced section id is not on the timeline.
    #[error("section not found: {0}")]
    SectionNotFound(Uuid),
}

/// What happened after dispatching a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The session changed.
    Applied,
    /// Preconditions were not met; nothing changed.
    NoOp,
    /// The front end should ask for a new title, seeded with the current one.
    PromptRename { section_id: Uuid, current_title: String },
}

/// One editing session over a subject's library.
#[derive(Debug, Clone)]
pub struct EditSession {
    subject: String,
    resource_title: String,
    timeline: Timeline,
    history: HistoryStack,
    cursor: Cursor,
    resize: ResizeState,
    zoom: f64,
    sections_added: usize,
}

impl EditSession {
    /// Create an empty session for a subject.
    pub fn new(subject: impl Into<String>, history_limit: usize) -> Self {
        Self {
            subject: subject.into(),
            resource_title: String::new(),
            timeline: Timeline::default(),
            history: HistoryStack::with_limit(history_limit),
            cursor: Cursor::default(),
            resize: ResizeState::Idle,
            zoom: ZOOM_DEFAULT,
            sections_added: 0,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn resource_title(&self) -> &str {
        &self.resource_title
    }

    pub fn set_resource_title(&mut self, title: impl Into<String>) {
        self.resource_title = title.into();
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn cursor(&self) -> u32 {
        self.cursor.page()
    }

    /// Pixels per timeline page.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_resizing()
    }

    pub fn active_section(&self) -> Option<&Section> {
        self.timeline.active_section(self.cursor.page())
    }

    pub fn cursor_info(&self) -> Option<CursorInfo<'_>> {
        self.timeline.cursor_info(self.cursor.page())
    }

    fn active_section_id(&self) -> Result<Uuid, EditError> {
        self.active_section()
            .map(|section| section.id)
            .ok_or(EditError::MissingActiveSection {
                cursor: self.cursor.page(),
            })
    }

    /// Record the pre-mutation timeline and keep the cursor in range.
    fn commit(&mut self, before: Timeline) {
        debug_assert!(self.timeline.is_packed());
        debug_assert!(self.timeline.sections().iter().all(Section::is_consistent));
        self.history.push(before);
        self.cursor.clamp(self.timeline.max_timeline_page());
    }

    /// Commit any gesture still in flight so the next snapshot is packed.
    fn settle_resize(&mut self) {
        if self.resize.is_resizing() {
            self.end_resize();
        }
    }

    // =========================================================================
    // Structural edits
    // =========================================================================

    /// Append a full-document section from the library.
    pub fn add_section(&mut self, source_document: impl Into<String>, page_count: u32) -> Uuid {
        self.settle_resize();
        let color = SECTION_COLORS[self.sections_added % SECTION_COLORS.len()];
        self.sections_added += 1;
        let section = Section::from_document(
            source_document,
            page_count,
            self.timeline.max_timeline_page(),
        )
        .with_color(color);

        let before = self.timeline.clone();
        let id = self.timeline.append(section);
        self.commit(before);
        debug!(%id, page_count, "added section");
        id
    }

    /// Split the section under the cursor. `Ok(None)` when the cursor is on
    /// the section's first page.
    pub fn split_at_cursor(&mut self) -> Result<Option<Uuid>, EditError> {
        self.settle_resize();
        self.active_section_id()?;
        let before = self.timeline.clone();
        let Some(new_id) = self.timeline.split_at(self.cursor.page()) else {
            return Ok(None);
        };
        self.commit(before);
        debug!(%new_id, cursor = self.cursor.page(), "split section");
        Ok(Some(new_id))
    }

    /// Delete the section under the cursor and return its id.
    pub fn delete_active(&mut self) -> Result<Uuid, EditError> {
        self.settle_resize();
        let id = self.active_section_id()?;
        let before = self.timeline.clone();
        self.timeline.remove(id);
        self.commit(before);
        debug!(%id, "deleted section");
        Ok(id)
    }

    /// Rename the section under the cursor.
    pub fn rename_active(&mut self, title: impl Into<String>) -> Result<Uuid, EditError> {
        self.settle_resize();
        let id = self.active_section_id()?;
        let before = self.timeline.clone();
        self.timeline.rename(id, title);
        self.commit(before);
        Ok(id)
    }

    /// Restore the most recent snapshot. Returns false when there is none.
    /// A gesture in flight is committed first, so undo reverts it.
    pub fn undo(&mut self) -> bool {
        self.settle_resize();
        let Some(previous) = self.history.pop() else {
            return false;
        };
        self.timeline = previous;
        self.cursor.clamp(self.timeline.max_timeline_page());
        true
    }

    // =========================================================================
    // Navigation and zoom
    // =========================================================================

    pub fn navigate_left(&mut self) {
        self.cursor.step_left(self.timeline.max_timeline_page());
    }

    pub fn navigate_right(&mut self) {
        self.cursor.step_right(self.timeline.max_timeline_page());
    }

    pub fn seek(&mut self, page: u32) {
        self.cursor.seek(page, self.timeline.max_timeline_page());
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_IN_STEP).min(ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_OUT_STEP).max(ZOOM_MIN);
    }

    // =========================================================================
    // Resize gesture
    // =========================================================================

    /// Pointer-down on a section edge. An earlier gesture that never saw
    /// pointer-up is committed first.
    pub fn begin_resize(&mut self, section_id: Uuid, edge: ResizeEdge) -> Result<(), EditError> {
        self.settle_resize();
        let gesture = ResizeGesture::begin(&self.timeline, section_id, edge)
            .ok_or(EditError::SectionNotFound(section_id))?;
        self.resize = ResizeState::Resizing(gesture);
        Ok(())
    }

    /// Pointer-move, as a pixel offset from the timeline origin (page 0),
    /// already including any scroll.
    pub fn resize_pointer_move(&mut self, pixel_offset: f64) -> bool {
        let page = resize::page_from_pixels(pixel_offset, self.zoom);
        self.resize_to_page(page)
    }

    /// Pointer-move, already converted to a timeline page. Live update only.
    pub fn resize_to_page(&mut self, page: i64) -> bool {
        match &self.resize {
            ResizeState::Idle => false,
            ResizeState::Resizing(gesture) => gesture.apply(&mut self.timeline, page),
        }
    }

    /// Pointer-up: repack and record one snapshot for the whole gesture.
    /// Returns true when the gesture changed the timeline.
    pub fn end_resize(&mut self) -> bool {
        let Some(gesture) = self.resize.finish() else {
            return false;
        };
        self.timeline.repack();
        if self.timeline == gesture.before {
            return false;
        }
        self.commit(gesture.before);
        debug!(section = %gesture.section_id, edge = ?gesture.edge, "resized section");
        true
    }

    // =========================================================================
    // Command dispatch
    // =========================================================================

    /// Run a mapped command. Missing preconditions are silent no-ops.
    pub fn execute(&mut self, command: EditorCommand) -> CommandOutcome {
        let result = match command {
            EditorCommand::Undo => Ok(self.undo()),
            EditorCommand::ZoomIn => {
                self.zoom_in();
                Ok(true)
            }
            EditorCommand::ZoomOut => {
                self.zoom_out();
                Ok(true)
            }
            EditorCommand::Split => self.split_at_cursor().map(|id| id.is_some()),
            EditorCommand::DeleteActive => self.delete_active().map(|_| true),
            EditorCommand::NavigateLeft => {
                self.navigate_left();
                Ok(true)
            }
            EditorCommand::NavigateRight => {
                self.navigate_right();
                Ok(true)
            }
            EditorCommand::Rename => {
                return match self.active_section() {
                    Some(section) => CommandOutcome::PromptRename {
                        section_id: section.id,
                        current_title: section.title.clone(),
                    },
                    None => CommandOutcome::NoOp,
                };
            }
        };

        match result {
            Ok(true) => CommandOutcome::Applied,
            Ok(false) => CommandOutcome::NoOp,
            Err(err) => {
                debug!(?command, %err, "command skipped");
                CommandOutcome::NoOp
            }
        }
    }
}
