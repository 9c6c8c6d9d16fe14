//! Two-phase edge resize.
//!
//! A gesture starts on pointer-down over a section edge, updates the section in
//! place on every pointer move (no history), and ends on pointer-up where the
//! session repacks and records a single snapshot.

use uuid::Uuid;

use super::{Section, Timeline};

/// Which edge of a section is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    Left,
    Right,
}

impl ResizeEdge {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Some(ResizeEdge::Left),
            "right" | "r" => Some(ResizeEdge::Right),
            _ => None,
        }
    }
}

/// An in-flight resize gesture.
#[derive(Debug, Clone)]
pub struct ResizeGesture {
    /// Section being resized.
    pub section_id: Uuid,
    /// Edge being dragged.
    pub edge: ResizeEdge,
    /// Source end page when the gesture began; the right edge never grows past it.
    pub origin_end_page: u32,
    /// Timeline as it was before the gesture, recorded on commit.
    pub before: Timeline,
}

impl ResizeGesture {
    /// Start a gesture on a section edge. `None` when the section does not exist.
    pub fn begin(timeline: &Timeline, section_id: Uuid, edge: ResizeEdge) -> Option<Self> {
        let section = timeline.find(section_id)?;
        Some(Self {
            section_id,
            edge,
            origin_end_page: section.source_end_page,
            before: timeline.clone(),
        })
    }

    /// Apply one pointer move, expressed as a candidate timeline page.
    pub fn apply(&self, timeline: &mut Timeline, page: i64) -> bool {
        let Some(section) = timeline.find_mut(self.section_id) else {
            return false;
        };
        match self.edge {
            ResizeEdge::Left => apply_left_edge(section, page),
            ResizeEdge::Right => apply_right_edge(section, page, self.origin_end_page),
        }
    }
}

/// Resize state owned by the edit session.
#[derive(Debug, Clone, Default)]
pub enum ResizeState {
    #[default]
    Idle,
    Resizing(ResizeGesture),
}

impl ResizeState {
    pub fn is_resizing(&self) -> bool {
        matches!(self, ResizeState::Resizing(_))
    }

    /// Leave the resizing state, returning the gesture that was active.
    pub fn finish(&mut self) -> Option<ResizeGesture> {
        match std::mem::take(self) {
            ResizeState::Idle => None,
            ResizeState::Resizing(gesture) => Some(gesture),
        }
    }
}

/// Convert a pointer offset measured from the timeline origin (page 0, scroll
/// included) into an absolute timeline page.
pub fn page_from_pixels(pixel_offset: f64, pixels_per_page: f64) -> i64 {
    if !pixel_offset.is_finite() || pixels_per_page <= 0.0 {
        return 0;
    }
    (pixel_offset / pixels_per_page).round() as i64
}

/// Move the left edge to `page`, shifting the source start page along with it.
///
/// The page is clamped so the section keeps at least one page and its source
/// start page never drops below 1.
pub fn apply_left_edge(section: &mut Section, page: i64) -> bool {
    let position = section.timeline_position as i64;
    let start = section.source_start_page as i64;
    let lower = (position - (start - 1)).max(0);
    let upper = position + section.timeline_duration as i64 - 1;
    let clamped = page.clamp(lower, upper.max(lower));
    let delta = clamped - position;
    if delta == 0 {
        return false;
    }

    section.timeline_position = clamped as u32;
    section.source_start_page = (start + delta) as u32;
    section.timeline_duration = (section.timeline_duration as i64 - delta) as u32;
    true
}

/// Move the right edge to `page`; rejected when it would pass `end_cap`.
pub fn apply_right_edge(section: &mut Section, page: i64, end_cap: u32) -> bool {
    let position = section.timeline_position as i64;
    let clamped = page.max(position + 1);
    let new_duration = clamped - position;
    let new_end = section.source_start_page as i64 + new_duration - 1;
    if new_end > end_cap as i64 {
        return false;
    }
    if new_duration == section.timeline_duration as i64 {
        return false;
    }

    section.timeline_duration = new_duration as u32;
    section.source_end_page = new_end as u32;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_pixels_rounds() {
        assert_eq!(page_from_pixels(44.0, 30.0), 1);
        assert_eq!(page_from_pixels(46.0, 30.0), 2);
        assert_eq!(page_from_pixels(-46.0, 30.0), -2);
        assert_eq!(page_from_pixels(100.0, 0.0), 0);
        assert_eq!(page_from_pixels(f64::NAN, 30.0), 0);
    }

    #[test]
    fn test_left_edge_shrinks_from_start() {
        let mut section = Section::new("doc.pdf", 1, 10, 0);
        assert!(apply_left_edge(&mut section, 3));
        assert_eq!(section.timeline_position, 3);
        assert_eq!(section.source_start_page, 4);
        assert_eq!(section.timeline_duration, 7);
        assert!(section.is_consistent());
    }

    #[test]
    fn test_left_edge_keeps_one_page() {
        let mut section = Section::new("doc.pdf", 1, 10, 0);
        apply_left_edge(&mut section, 50);
        assert_eq!(section.timeline_position, 9);
        assert_eq!(section.timeline_duration, 1);
        assert_eq!(section.source_start_page, 10);
    }

    #[test]
    fn test_left_edge_never_pushes_source_below_first_page() {
        let mut section = Section::new("doc.pdf", 3, 10, 5);
        apply_left_edge(&mut section, 0);
        assert_eq!(section.source_start_page, 1);
        assert_eq!(section.timeline_position, 3);
        assert_eq!(section.timeline_duration, 10);
        assert!(section.is_consistent());
    }

    #[test]
    fn test_left_edge_grows_back() {
        let mut section = Section::new("doc.pdf", 6, 10, 5);
        assert!(apply_left_edge(&mut section, 2));
        assert_eq!(section.source_start_page, 3);
        assert_eq!(section.timeline_duration, 8);
    }

    #[test]
    fn test_right_edge_shrinks() {
        let mut section = Section::new("doc.pdf", 1, 10, 0);
        assert!(apply_right_edge(&mut section, 4, 10));
        assert_eq!(section.timeline_duration, 4);
        assert_eq!(section.source_end_page, 4);
    }

    #[test]
    fn test_right_edge_minimum_width() {
        let mut section = Section::new("doc.pdf", 1, 10, 2);
        assert!(apply_right_edge(&mut section, -20, 10));
        assert_eq!(section.timeline_duration, 1);
        assert_eq!(section.source_end_page, 1);
    }

    #[test]
    fn test_right_edge_cannot_pass_cap() {
        let mut section = Section::new("doc.pdf", 1, 10, 0);
        let before = section.clone();
        assert!(!apply_right_edge(&mut section, 11, 10));
        assert_eq!(section, before);
    }

    #[test]
    fn test_gesture_grows_back_to_origin() {
        let mut timeline = Timeline::default();
        let id = timeline.append(Section::from_document("doc.pdf", 8, 0));
        let gesture = ResizeGesture::begin(&timeline, id, ResizeEdge::Right).unwrap();

        assert!(gesture.apply(&mut timeline, 3));
        assert_eq!(timeline.find(id).unwrap().source_end_page, 3);
        assert!(gesture.apply(&mut timeline, 8));
        assert_eq!(timeline.find(id).unwrap().source_end_page, 8);
        assert!(!gesture.apply(&mut timeline, 9));
        assert_eq!(timeline.find(id).unwrap().source_end_page, 8);
    }

    #[test]
    fn test_finish_returns_to_idle() {
        let mut timeline = Timeline::default();
        let id = timeline.append(Section::from_document("doc.pdf", 2, 0));
        let mut state = ResizeState::Resizing(
            ResizeGesture::begin(&timeline, id, ResizeEdge::Left).unwrap(),
        );
        assert!(state.is_resizing());
        assert!(state.finish().is_some());
        assert!(!state.is_resizing());
        assert!(state.finish().is_none());
    }

    #[test]
    fn test_parse_edge() {
        assert_eq!(ResizeEdge::parse("Left"), Some(ResizeEdge::Left));
        assert_eq!(ResizeEdge::parse("r"), Some(ResizeEdge::Right));
        assert_eq!(ResizeEdge::parse("top"), None);
    }
}
