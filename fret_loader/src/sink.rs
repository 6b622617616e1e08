use fret_schema::{NoteCategory, NoteData, Row, TapNote, TimingData};

/// Timeline the note engines write into. Reclassification is read-modify-write:
/// an engine queries the event at a row and overwrites it.
pub trait NoteSink {
    fn num_tracks(&self) -> usize;
    fn set_tap_note(&mut self, track: usize, row: Row, note: TapNote);
    fn add_hold_note(&mut self, track: usize, start: Row, end: Row, category: NoteCategory);
    fn tap_note(&self, track: usize, row: Row) -> Option<TapNote>;
    fn clear(&mut self, track: usize, row: Row);
}

pub trait TimingSink {
    fn add_tempo_change(&mut self, beat: f64, bpm: f64);
    fn add_time_signature(&mut self, row: Row, numerator: u32, denominator: u32);
    fn add_label(&mut self, row: Row, text: &str);
    fn set_offset(&mut self, seconds: f64);
    fn set_tickcount(&mut self, row: Row, ticks: u32);
}

impl NoteSink for NoteData {
    fn num_tracks(&self) -> usize {
        NoteData::num_tracks(self)
    }

    fn set_tap_note(&mut self, track: usize, row: Row, note: TapNote) {
        NoteData::set_tap_note(self, track, row, note)
    }

    fn add_hold_note(&mut self, track: usize, start: Row, end: Row, category: NoteCategory) {
        NoteData::add_hold(self, track, start, categorize(category, end.saturating_sub(start)))
    }

    fn tap_note(&self, track: usize, row: Row) -> Option<TapNote> {
        NoteData::tap_note(self, track, row)
    }

    fn clear(&mut self, track: usize, row: Row) {
        NoteData::clear(self, track, row);
    }
}

impl TimingSink for TimingData {
    fn add_tempo_change(&mut self, beat: f64, bpm: f64) {
        TimingData::add_tempo_change(self, beat, bpm)
    }

    fn add_time_signature(&mut self, row: Row, numerator: u32, denominator: u32) {
        TimingData::add_time_signature(self, row, numerator, denominator)
    }

    fn add_label(&mut self, row: Row, text: &str) {
        TimingData::add_label(self, row, text)
    }

    fn set_offset(&mut self, seconds: f64) {
        TimingData::set_offset(self, seconds)
    }

    fn set_tickcount(&mut self, row: Row, ticks: u32) {
        TimingData::set_tickcount(self, row, ticks)
    }
}

/// The one category-to-event mapping both engines share.
pub fn categorize(category: NoteCategory, duration: Row) -> TapNote {
    TapNote::new(category, duration)
}

/// Emits a hold when `end > start`, a single event otherwise.
pub fn place_note<S: NoteSink + ?Sized>(
    sink: &mut S,
    track: usize,
    start: Row,
    end: Row,
    category: NoteCategory,
) {
    if end > start {
        sink.add_hold_note(track, start, end, category);
    } else {
        sink.set_tap_note(track, start, categorize(category, 0));
    }
}

/// End row for a note that the chart says is sustained. A sustain shorter than one row
/// still spans one row.
pub(crate) fn held_end_row(start: Row, end: Row, held: bool) -> Row {
    if held {
        end.max(start.saturating_add(1))
    } else {
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_note_picks_held_variant_from_span() {
        let mut notes = NoteData::new(2);
        place_note(&mut notes, 0, 0, 24, NoteCategory::Hopo);
        place_note(&mut notes, 1, 0, 0, NoteCategory::Tap);
        place_note(&mut notes, 1, 48, 30, NoteCategory::Strum);

        assert_eq!(notes.tap_note(0, 0), Some(TapNote::new(NoteCategory::Hopo, 24)));
        assert_eq!(notes.tap_note(1, 0), Some(TapNote::new(NoteCategory::Tap, 0)));
        assert_eq!(notes.tap_note(1, 48), Some(TapNote::new(NoteCategory::Strum, 0)));
    }

    #[test]
    fn sink_holds_use_the_shared_mapping() {
        let mut notes = NoteData::new(1);
        NoteSink::add_hold_note(&mut notes, 0, 12, 36, NoteCategory::Hopo);
        NoteSink::add_hold_note(&mut notes, 0, 48, 40, NoteCategory::Tap);

        assert_eq!(notes.tap_note(0, 12), Some(categorize(NoteCategory::Hopo, 24)));
        assert_eq!(notes.tap_note(0, 48), Some(categorize(NoteCategory::Tap, 0)));
        assert_eq!(NoteSink::num_tracks(&notes), 1);
    }

    #[test]
    fn held_end_row_spans_at_least_one_row() {
        assert_eq!(held_end_row(10, 10, true), 11);
        assert_eq!(held_end_row(10, 30, true), 30);
        assert_eq!(held_end_row(10, 30, false), 10);
    }
}
