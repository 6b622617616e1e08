//! Note-section classification for text charts.
//!
//! Records are consumed in file order. Each playable note runs through sustain correction,
//! chord demotion, the tap override and the HOPO decision before it is written; forced and
//! tap markers rewrite notes already emitted at their row.

use fret_schema::{tick_to_row, NoteCategory, NoteData, Row, Tick};
use tracing::trace;

use super::lexer::{ChartReader, Record};
use crate::sink::{held_end_row, place_note, NoteSink};

/// Timeline width of a text-chart steps.
pub(crate) const CHART_TRACKS: usize = 6;

const FRET_LANES: usize = 5;
const FORCED_LANE: i64 = 5;

/// Ticks within this distance are the same instant.
const COINCIDENT: Tick = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoteRecord {
    Note { tick: Tick, lane: usize, length: Tick },
    Forced { tick: Tick },
    TapOverride { tick: Tick },
}

impl NoteRecord {
    pub(crate) fn parse(record: &Record<'_>) -> Option<Self> {
        let tick = record.tick;
        match record.tag {
            "N" => match record.int_arg(0, -1) {
                FORCED_LANE => Some(Self::Forced { tick }),
                lane @ 0..=4 => Some(Self::Note {
                    tick,
                    lane: lane as usize,
                    length: record.int_arg(1, 0),
                }),
                _ => None,
            },
            "E" => match record.arg(0) {
                Some("*") => Some(Self::Forced { tick }),
                Some("T") => Some(Self::TapOverride { tick }),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LaneState {
    tick: Option<Tick>,
    length: Tick,
    hopo: bool,
}

fn near(marker: Option<Tick>, tick: Tick) -> bool {
    marker.is_some_and(|m| m.abs_diff(tick) <= COINCIDENT.unsigned_abs())
}

/// Classification state for one pass over one note section.
#[derive(Debug, Clone)]
pub(crate) struct NoteSectionState {
    resolution: Tick,
    threshold: Tick,
    lanes: [LaneState; FRET_LANES],
    prev_lane: Option<usize>,
    last_forced: Option<Tick>,
    last_tap: Option<Tick>,
    last_chord: Option<Tick>,
}

impl NoteSectionState {
    pub(crate) fn new(resolution: Tick, threshold: Tick) -> Self {
        Self {
            resolution,
            threshold,
            lanes: [LaneState::default(); FRET_LANES],
            prev_lane: None,
            last_forced: None,
            last_tap: None,
            last_chord: None,
        }
    }

    pub(crate) fn apply<S: NoteSink + ?Sized>(&mut self, sink: &mut S, record: NoteRecord) {
        match record {
            NoteRecord::Note { tick, lane, length } => self.apply_note(sink, tick, lane, length),
            NoteRecord::Forced { tick } => self.apply_forced(sink, tick),
            NoteRecord::TapOverride { tick } => self.apply_tap(sink, tick),
        }
    }

    fn row(&self, tick: Tick) -> Row {
        tick_to_row(tick, self.resolution)
    }

    fn emit<S: NoteSink + ?Sized>(
        &self,
        sink: &mut S,
        lane: usize,
        tick: Tick,
        length: Tick,
        category: NoteCategory,
    ) {
        let start = self.row(tick);
        let end = held_end_row(start, self.row(tick + length), length > 0);
        place_note(sink, lane, start, end, category);
    }

    fn lane_at_row(&self, lane: usize, row: Row) -> bool {
        self.lanes[lane].tick.map(|t| self.row(t)) == Some(row)
    }

    fn apply_forced<S: NoteSink + ?Sized>(&mut self, sink: &mut S, tick: Tick) {
        self.last_forced = Some(tick);
        let row = self.row(tick);

        for lane in 0..FRET_LANES.min(sink.num_tracks()) {
            let Some(note) = sink.tap_note(lane, row) else {
                continue;
            };
            let category = match note.category {
                NoteCategory::Hopo => NoteCategory::Strum,
                NoteCategory::Strum => NoteCategory::Hopo,
                NoteCategory::Tap => continue,
            };
            place_note(sink, lane, row, row.saturating_add(note.duration), category);
            if self.lane_at_row(lane, row) {
                self.lanes[lane].hopo = category == NoteCategory::Hopo;
            }
        }
    }

    fn apply_tap<S: NoteSink + ?Sized>(&mut self, sink: &mut S, tick: Tick) {
        self.last_tap = Some(tick);
        let row = self.row(tick);

        for lane in 0..FRET_LANES.min(sink.num_tracks()) {
            let Some(note) = sink.tap_note(lane, row) else {
                continue;
            };
            place_note(sink, lane, row, row.saturating_add(note.duration), NoteCategory::Tap);
            if self.lane_at_row(lane, row) {
                self.lanes[lane].hopo = false;
            }
        }
    }

    fn apply_note<S: NoteSink + ?Sized>(
        &mut self,
        sink: &mut S,
        tick: Tick,
        lane: usize,
        length: Tick,
    ) {
        self.correct_sustain(sink, tick, lane);

        for k in 0..FRET_LANES {
            let other = self.lanes[k];
            if k == lane || !other.hopo || !near(other.tick, tick) {
                continue;
            }
            self.last_chord = Some(tick);
            if let Some(other_tick) = other.tick {
                self.emit(sink, k, other_tick, other.length, NoteCategory::Strum);
            }
            self.lanes[k].hopo = false;
        }

        if near(self.last_tap, tick) {
            self.emit(sink, lane, tick, length, NoteCategory::Tap);
            self.lanes[lane].hopo = false;
        } else {
            let hopo = self.should_be_hopo(lane, tick);
            let category = if hopo {
                NoteCategory::Hopo
            } else {
                NoteCategory::Strum
            };
            self.emit(sink, lane, tick, length, category);
            self.lanes[lane].hopo = hopo;
        }

        let state = &mut self.lanes[lane];
        state.tick = Some(tick);
        state.length = length;
        self.prev_lane = Some(lane);
    }

    /// Shortens the previous sustain on `lane` so it ends before `tick`.
    fn correct_sustain<S: NoteSink + ?Sized>(&mut self, sink: &mut S, tick: Tick, lane: usize) {
        let prev = self.lanes[lane];
        let Some(prev_tick) = prev.tick else {
            return;
        };
        if prev.length + prev_tick + 1 < tick {
            return;
        }

        let prev_row = self.row(prev_tick);
        let category = match sink.tap_note(lane, prev_row) {
            Some(note) if note.category == NoteCategory::Tap => NoteCategory::Tap,
            _ if prev.hopo => NoteCategory::Hopo,
            _ => NoteCategory::Strum,
        };
        sink.clear(lane, prev_row);

        let length = tick - prev_tick - self.resolution / 8;
        self.lanes[lane].length = length;
        self.emit(sink, lane, prev_tick, length, category);
    }

    fn should_be_hopo(&self, lane: usize, tick: Tick) -> bool {
        let in_chord =
            near(self.last_chord, tick) || self.lanes.iter().any(|l| near(l.tick, tick));

        let hopo = !in_chord
            && !self.follows_own_chord(lane)
            && self.prev_lane != Some(lane)
            && self.lanes.iter().any(|l| {
                l.tick
                    .is_some_and(|t| (tick - t).abs() - 1 <= self.threshold)
            });

        if near(self.last_forced, tick) {
            !hopo
        } else {
            hopo
        }
    }

    /// True when the previous note and this lane's last note formed a chord.
    fn follows_own_chord(&self, lane: usize) -> bool {
        let Some(prev_lane) = self.prev_lane.filter(|p| *p != lane) else {
            return false;
        };
        match (self.lanes[lane].tick, self.lanes[prev_lane].tick) {
            (Some(a), Some(b)) => a.abs_diff(b) <= COINCIDENT.unsigned_abs(),
            _ => false,
        }
    }
}

/// Reads one `[<Difficulty>Single]` body up to its closing brace.
pub(crate) fn parse_note_section(
    reader: &mut ChartReader<'_>,
    resolution: Tick,
    threshold: Tick,
) -> NoteData {
    let mut notes = NoteData::new(CHART_TRACKS);
    let mut state = NoteSectionState::new(resolution, threshold);

    while let Some(words) = reader.next_section_line() {
        let record = Record::from_words(&words);
        match NoteRecord::parse(&record) {
            Some(note) => state.apply(&mut notes, note),
            None => trace!(
                line = reader.line_no(),
                tag = record.tag,
                "skipping note section record"
            ),
        }
    }

    notes
}
