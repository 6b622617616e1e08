//! Guitar note classification for MIDI charts.

use fret_schema::{tick_to_row, Difficulty, NoteCategory, NoteData, Row, TapNote, Tick};
use tracing::trace;

use super::events::{MidiEvent, MidiTrack};
use super::organizer::{FretLayout, HopoRules};
use super::sysex::{translate_sysex, SectionToggle};
use crate::sink::{held_end_row, place_note, NoteSink};

const MAX_COLUMNS: usize = 7;
const MAX_MIDI_LANES: usize = 9;

/// Lowest and highest key of a difficulty band. Six-fret bands start two keys lower
/// for the open lane and the extra fret.
pub(crate) fn pitch_band(difficulty: Difficulty, frets: FretLayout) -> (u8, u8) {
    const BANDS: [(Difficulty, u8, u8, u8); 4] = [
        (Difficulty::Easy, 60, 58, 66),
        (Difficulty::Medium, 72, 70, 78),
        (Difficulty::Hard, 84, 82, 90),
        (Difficulty::Challenge, 96, 94, 102),
    ];

    let (_, five_low, six_low, high) = BANDS
        .iter()
        .copied()
        .find(|(d, ..)| *d == difficulty)
        .unwrap_or(BANDS[3]);
    match frets {
        FretLayout::Five => (five_low, high),
        FretLayout::Six => (six_low, high),
    }
}

/// Meaning of a key relative to the bottom of its band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lane {
    Fret(usize),
    Open,
    ForcedHopo,
    ForcedStrum,
}

impl Lane {
    pub(crate) fn from_index(index: usize, frets: FretLayout) -> Option<Self> {
        match (frets, index) {
            (FretLayout::Five, 0..=4) => Some(Lane::Fret(index)),
            (FretLayout::Five, 5) => Some(Lane::ForcedHopo),
            (FretLayout::Five, 6) => Some(Lane::ForcedStrum),
            (FretLayout::Six, 0) => Some(Lane::Open),
            (FretLayout::Six, 1..=6) => Some(Lane::Fret(index - 1)),
            (FretLayout::Six, 7) => Some(Lane::ForcedHopo),
            (FretLayout::Six, 8) => Some(Lane::ForcedStrum),
            _ => None,
        }
    }
}

/// Classification state for one difficulty of one track.
#[derive(Debug, Clone)]
pub(crate) struct GuitarState {
    resolution: Tick,
    threshold: Tick,
    rules: HopoRules,
    columns: usize,
    prev_tick: [Option<Tick>; MAX_COLUMNS],
    last_forced_hopo: Option<Tick>,
    last_forced_strum: Option<Tick>,
    last_chord: Option<Tick>,
    in_tap_section: bool,
    in_open_section: bool,
}

impl GuitarState {
    pub(crate) fn new(resolution: Tick, threshold: Tick, rules: HopoRules, frets: FretLayout) -> Self {
        Self {
            resolution,
            threshold,
            rules,
            columns: frets.columns(),
            prev_tick: [None; MAX_COLUMNS],
            last_forced_hopo: None,
            last_forced_strum: None,
            last_chord: None,
            in_tap_section: false,
            in_open_section: false,
        }
    }

    pub(crate) fn toggle_section(&mut self, toggle: SectionToggle) {
        match toggle {
            SectionToggle::Tap(on) => self.in_tap_section = on,
            SectionToggle::Open(on) => self.in_open_section = on,
        }
    }

    fn row(&self, tick: Tick) -> Row {
        tick_to_row(tick, self.resolution)
    }

    fn open_column(&self) -> usize {
        self.columns - 1
    }

    /// Classifies one completed note spanning `start..end` ticks.
    pub(crate) fn add_note<S: NoteSink + ?Sized>(
        &mut self,
        sink: &mut S,
        lane: Lane,
        start: Tick,
        end: Tick,
    ) {
        let held = end - start > self.resolution / 2;
        let real_end = if held {
            end - self.resolution / 8
        } else {
            start
        };
        let start_row = self.row(start);
        let end_row = held_end_row(start_row, self.row(real_end), held);

        let mut taps: [Option<TapNote>; MAX_COLUMNS] = [None; MAX_COLUMNS];
        let snapshot_columns = self.columns.min(sink.num_tracks());
        for (column, slot) in taps.iter_mut().enumerate().take(snapshot_columns) {
            *slot = sink.tap_note(column, start_row);
        }
        let highest = (0..self.columns).rev().find(|c| taps[*c].is_some());

        let column = match lane {
            Lane::ForcedHopo => {
                // Only the highest note of a forced chord survives.
                if let Some(top) = highest {
                    for column in (0..self.columns).rev() {
                        let Some(note) = taps[column] else {
                            continue;
                        };
                        if column == top {
                            place_note(sink, column, start_row, start_row.saturating_add(note.duration), NoteCategory::Hopo);
                        } else {
                            sink.clear(column, start_row);
                        }
                    }
                }
                self.last_forced_hopo = Some(start);
                return;
            }
            Lane::ForcedStrum => {
                for (column, note) in taps.iter().enumerate().take(self.columns) {
                    if let Some(note) = note {
                        place_note(sink, column, start_row, start_row.saturating_add(note.duration), NoteCategory::Strum);
                    }
                }
                self.last_forced_strum = Some(start);
                return;
            }
            Lane::Open => self.open_column(),
            Lane::Fret(_) if self.in_open_section => self.open_column(),
            Lane::Fret(fret) => fret,
        };

        if self.in_tap_section {
            place_note(sink, column, start_row, end_row, NoteCategory::Tap);
        } else if let Some(top) = highest {
            let top_note = taps[top].unwrap_or(TapNote::new(NoteCategory::Strum, 0));
            let was_hopo = top_note.is_hopo();

            if self.last_forced_hopo == Some(start) {
                if column < top {
                    trace!(column, start, "dropping lower note of forced chord");
                    return;
                }
                sink.clear(top, start_row);
                let category = if was_hopo {
                    NoteCategory::Hopo
                } else {
                    NoteCategory::Strum
                };
                place_note(sink, column, start_row, end_row, category);
            } else {
                if was_hopo {
                    place_note(sink, top, start_row, start_row.saturating_add(top_note.duration), NoteCategory::Strum);
                }
                place_note(sink, column, start_row, end_row, NoteCategory::Strum);
            }
            self.last_chord = Some(start);
        } else {
            let category = if self.check_hopo(column, start) {
                NoteCategory::Hopo
            } else {
                NoteCategory::Strum
            };
            place_note(sink, column, start_row, end_row, category);
        }

        self.prev_tick[column] = Some(start);
    }

    pub(crate) fn check_hopo(&self, column: usize, tick: Tick) -> bool {
        if self.last_forced_strum == Some(tick) {
            return false;
        }
        if self.last_forced_hopo == Some(tick) {
            return true;
        }
        if self.last_chord == Some(tick) {
            return false;
        }

        let mut hopo = false;
        let mut most_recent: Option<Tick> = None;
        for (k, prev) in self.prev_tick.iter().enumerate().take(self.columns) {
            let Some(prev) = *prev else {
                continue;
            };
            if tick - prev <= self.threshold && k != column {
                hopo = true;
            }
            if most_recent.map_or(true, |recent| prev > recent) {
                most_recent = Some(prev);
            }
        }

        // Rock Band never HOPOs a note that was part of the chord just before it.
        if self.rules == HopoRules::RockBand
            && self.prev_tick[column].is_some()
            && self.prev_tick[column] == most_recent
        {
            hopo = false;
        }

        hopo
    }
}

/// Reads the notes of one difficulty from a role track.
pub(crate) fn notes_from_track(
    track: &MidiTrack,
    difficulty: Difficulty,
    rules: HopoRules,
    frets: FretLayout,
    resolution: Tick,
    threshold: Tick,
) -> NoteData {
    let (low, high) = pitch_band(difficulty, frets);
    let lanes = frets.midi_lanes();
    let mut in_progress: [Option<Tick>; MAX_MIDI_LANES] = [None; MAX_MIDI_LANES];
    let mut notes = NoteData::new(frets.columns());
    let mut state = GuitarState::new(resolution, threshold, rules, frets);

    let lane_index = |key: u8| -> Option<usize> {
        (low..=high)
            .contains(&key)
            .then(|| usize::from(key - low))
            .filter(|i| *i < lanes)
    };

    for timed in &track.events {
        match &timed.event {
            MidiEvent::SysEx(data) => match translate_sysex(data, difficulty) {
                Some(toggle) => state.toggle_section(toggle),
                None => trace!(tick = timed.tick, "ignoring sysex payload"),
            },
            MidiEvent::NoteOn { key, .. } => {
                if let Some(i) = lane_index(*key) {
                    in_progress[i].get_or_insert(timed.tick);
                }
            }
            MidiEvent::NoteOff { key } => {
                let Some(i) = lane_index(*key) else {
                    continue;
                };
                let Some(start) = in_progress[i].take() else {
                    continue;
                };
                if timed.tick <= start {
                    trace!(key, start, "dropping zero-length note");
                    continue;
                }
                if let Some(lane) = Lane::from_index(i, frets) {
                    state.add_note(&mut notes, lane, start, timed.tick);
                }
            }
            _ => {}
        }
    }

    notes
}
