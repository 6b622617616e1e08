use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included};

use serde::{Deserialize, Serialize};

use crate::{NoteCategory, Row, TapNote};

/// Sparse per-track note container. Each track maps a row to at most one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteData {
    tracks: Vec<BTreeMap<Row, TapNote>>,
}

/// Flattened view of a single event, used for iteration in row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub track: usize,
    pub row: Row,
    pub note: TapNote,
}

impl NoteEvent {
    pub fn end_row(&self) -> Row {
        self.row.saturating_add(self.note.duration)
    }
}

impl NoteData {
    pub fn new(num_tracks: usize) -> Self {
        Self {
            tracks: vec![BTreeMap::new(); num_tracks],
        }
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Places a single event, replacing whatever was at `row`. Out-of-range tracks are ignored.
    pub fn set_tap_note(&mut self, track: usize, row: Row, note: TapNote) {
        if let Some(lane) = self.tracks.get_mut(track) {
            lane.insert(row, note);
        }
    }

    /// Places a held event spanning `start..end`. Events strictly inside `(start, end]`
    /// on the same track are removed first.
    pub fn add_hold_note(&mut self, track: usize, start: Row, end: Row, category: NoteCategory) {
        self.add_hold(track, start, TapNote::new(category, end.saturating_sub(start)));
    }

    /// Places `note` at `start`, clearing the rows its duration covers.
    pub fn add_hold(&mut self, track: usize, start: Row, note: TapNote) {
        let Some(lane) = self.tracks.get_mut(track) else {
            return;
        };
        if note.is_held() {
            let end = start.saturating_add(note.duration);
            let covered: Vec<Row> = lane
                .range((Excluded(start), Included(end)))
                .map(|(row, _)| *row)
                .collect();
            for row in covered {
                lane.remove(&row);
            }
        }
        lane.insert(start, note);
    }

    pub fn tap_note(&self, track: usize, row: Row) -> Option<TapNote> {
        self.tracks.get(track)?.get(&row).copied()
    }

    pub fn clear(&mut self, track: usize, row: Row) -> Option<TapNote> {
        self.tracks.get_mut(track)?.remove(&row)
    }

    pub fn track(&self, track: usize) -> impl Iterator<Item = (Row, TapNote)> + '_ {
        self.tracks
            .get(track)
            .into_iter()
            .flat_map(|lane| lane.iter().map(|(row, note)| (*row, *note)))
    }

    /// All events ordered by row, then by track.
    pub fn events(&self) -> Vec<NoteEvent> {
        let mut out: Vec<NoteEvent> = self
            .tracks
            .iter()
            .enumerate()
            .flat_map(|(track, lane)| {
                lane.iter().map(move |(row, note)| NoteEvent {
                    track,
                    row: *row,
                    note: *note,
                })
            })
            .collect();
        out.sort_by_key(|e| (e.row, e.track));
        out
    }

    pub fn len(&self) -> usize {
        self.tracks.iter().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.iter().all(BTreeMap::is_empty)
    }

    /// Last row touched by any event, hold tails included.
    pub fn last_row(&self) -> Option<Row> {
        self.tracks
            .iter()
            .filter_map(|lane| lane.iter().map(|(row, note)| row + note.duration).max())
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_removes_covered_events_on_same_track_only() {
        let mut notes = NoteData::new(2);
        notes.set_tap_note(0, 12, TapNote::new(NoteCategory::Strum, 0));
        notes.set_tap_note(0, 24, TapNote::new(NoteCategory::Strum, 0));
        notes.set_tap_note(0, 30, TapNote::new(NoteCategory::Strum, 0));
        notes.set_tap_note(1, 12, TapNote::new(NoteCategory::Strum, 0));

        notes.add_hold_note(0, 0, 24, NoteCategory::Hopo);

        assert_eq!(
            notes.tap_note(0, 0),
            Some(TapNote::new(NoteCategory::Hopo, 24))
        );
        assert_eq!(notes.tap_note(0, 12), None);
        assert_eq!(notes.tap_note(0, 24), None);
        assert!(notes.tap_note(0, 30).is_some());
        assert!(notes.tap_note(1, 12).is_some());
    }

    #[test]
    fn prebuilt_hold_clears_the_rows_it_covers() {
        let mut notes = NoteData::new(1);
        notes.set_tap_note(0, 6, TapNote::new(NoteCategory::Strum, 0));
        notes.set_tap_note(0, 20, TapNote::new(NoteCategory::Strum, 0));

        notes.add_hold(0, 0, TapNote::new(NoteCategory::Tap, 12));

        assert_eq!(notes.tap_note(0, 0), Some(TapNote::new(NoteCategory::Tap, 12)));
        assert_eq!(notes.tap_note(0, 6), None);
        assert!(notes.tap_note(0, 20).is_some());
    }

    #[test]
    fn degenerate_hold_becomes_single_event() {
        let mut notes = NoteData::new(1);
        notes.add_hold_note(0, 10, 10, NoteCategory::Tap);
        assert_eq!(notes.tap_note(0, 10), Some(TapNote::new(NoteCategory::Tap, 0)));
    }

    #[test]
    fn out_of_range_tracks_are_ignored() {
        let mut notes = NoteData::new(1);
        notes.set_tap_note(3, 0, TapNote::new(NoteCategory::Strum, 0));
        notes.add_hold_note(3, 0, 48, NoteCategory::Strum);
        assert!(notes.is_empty());
        assert_eq!(notes.clear(3, 0), None);
        assert_eq!(notes.tap_note(3, 0), None);
    }

    #[test]
    fn events_are_sorted_by_row_then_track() {
        let mut notes = NoteData::new(3);
        notes.set_tap_note(2, 0, TapNote::new(NoteCategory::Strum, 0));
        notes.set_tap_note(0, 48, TapNote::new(NoteCategory::Strum, 0));
        notes.set_tap_note(1, 0, TapNote::new(NoteCategory::Strum, 0));

        let order: Vec<(Row, usize)> = notes.events().iter().map(|e| (e.row, e.track)).collect();
        assert_eq!(order, vec![(0, 1), (0, 2), (48, 0)]);
        assert_eq!(notes.len(), 3);
    }

    #[test]
    fn last_row_includes_hold_tails() {
        let mut notes = NoteData::new(2);
        notes.add_hold_note(0, 0, 96, NoteCategory::Strum);
        notes.set_tap_note(1, 60, TapNote::new(NoteCategory::Strum, 0));
        assert_eq!(notes.last_row(), Some(96));
        assert_eq!(NoteData::new(2).last_row(), None);
    }
}
