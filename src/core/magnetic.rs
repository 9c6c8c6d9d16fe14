//! Magnetic packing of timeline sections.
//!
//! Sections are placed back to back in ascending position order, starting at
//! page 0. Only `timeline_position` is touched; durations, ids and order of
//! equal positions are preserved.

use crate::state::Section;

/// Reflow sections into a contiguous layout, leaving them in timeline order.
pub fn pack(sections: &mut [Section]) {
    // `sort_by_key` is stable, so ties keep their input order.
    sections.sort_by_key(|section| section.timeline_position);

    let mut offset = 0u32;
    for section in sections.iter_mut() {
        section.timeline_position = offset;
        offset += section.timeline_duration;
    }
}

/// True when sections in position order start at 0 with no gaps or overlaps.
pub fn is_packed(sections: &[Section]) -> bool {
    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by_key(|section| section.timeline_position);

    let mut expected = 0u32;
    for section in ordered {
        if section.timeline_position != expected {
            return false;
        }
        expected += section.timeline_duration;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(position: u32, duration: u32) -> Section {
        Section::new("source.pdf", 1, duration, position)
    }

    fn pack_vec(mut sections: Vec<Section>) -> Vec<Section> {
        pack(&mut sections);
        sections
    }

    #[test]
    fn test_pack_closes_gaps_and_keeps_order() {
        let sections = vec![section(0, 5), section(5, 3), section(100, 2)];
        let packed = pack_vec(sections.clone());

        let positions: Vec<u32> = packed.iter().map(|s| s.timeline_position).collect();
        let durations: Vec<u32> = packed.iter().map(|s| s.timeline_duration).collect();
        assert_eq!(positions, vec![0, 5, 8]);
        assert_eq!(durations, vec![5, 3, 2]);
        assert_eq!(packed[2].id, sections[2].id);
        assert!(is_packed(&packed));
    }

    #[test]
    fn test_pack_resolves_overlaps_by_position() {
        let a = section(7, 4);
        let b = section(2, 6);
        let c = section(3, 1);
        let packed = pack_vec(vec![a.clone(), b.clone(), c.clone()]);

        let ids: Vec<_> = packed.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b.id, c.id, a.id]);
        let positions: Vec<u32> = packed.iter().map(|s| s.timeline_position).collect();
        assert_eq!(positions, vec![0, 6, 7]);
    }

    #[test]
    fn test_pack_ties_keep_input_order() {
        let first = section(4, 2);
        let second = section(4, 3);
        let packed = pack_vec(vec![first.clone(), second.clone()]);
        assert_eq!(packed[0].id, first.id);
        assert_eq!(packed[1].id, second.id);
        assert_eq!(packed[1].timeline_position, 2);
    }

    #[test]
    fn test_pack_is_idempotent() {
        let sections = vec![section(9, 1), section(3, 4), section(0, 2), section(3, 3)];
        let once = pack_vec(sections);
        let twice = pack_vec(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_pack_preserves_ids_and_durations() {
        let sections = vec![section(40, 3), section(1, 8), section(12, 5)];
        let mut before: Vec<_> = sections.iter().map(|s| (s.id, s.timeline_duration)).collect();
        let packed = pack_vec(sections);
        let mut after: Vec<_> = packed.iter().map(|s| (s.id, s.timeline_duration)).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_pack_empty() {
        assert!(pack_vec(Vec::new()).is_empty());
        assert!(is_packed(&[]));
    }

    #[test]
    fn test_is_packed_detects_gap() {
        assert!(!is_packed(&[section(0, 2), section(3, 1)]));
        assert!(!is_packed(&[section(1, 2)]));
    }
}
