use fret_schema::{tick_to_row, Tick, ROWS_PER_BEAT};

use super::events::{MidiEvent, MidiTrack};
use crate::sink::TimingSink;

const DEFAULT_SIGNATURE_PART: u32 = 4;

/// Tempo map. MIDI charts start at beat 0 with no offset.
pub(crate) fn parse_beat_track<T: TimingSink + ?Sized>(
    track: &MidiTrack,
    timing: &mut T,
    resolution: Tick,
) {
    timing.set_offset(0.0);
    timing.set_tickcount(0, ROWS_PER_BEAT as u32);

    for timed in &track.events {
        match timed.event {
            MidiEvent::Tempo { micros_per_beat } if micros_per_beat > 0 => {
                let bpm = 60_000_000.0 / f64::from(micros_per_beat);
                timing.add_tempo_change(timed.tick as f64 / resolution as f64, bpm);
            }
            MidiEvent::TimeSignature {
                numerator,
                denominator_pow,
            } => {
                let numerator = match u32::from(numerator) {
                    0 => DEFAULT_SIGNATURE_PART,
                    n => n,
                };
                let denominator = match 1u32.checked_shl(u32::from(denominator_pow)) {
                    Some(0) | None => DEFAULT_SIGNATURE_PART,
                    Some(d) => d,
                };
                timing.add_time_signature(tick_to_row(timed.tick, resolution), numerator, denominator);
            }
            _ => {}
        }
    }
}

/// Text events become labels, `[section verse_1]` style brackets removed.
pub(crate) fn parse_event_track<T: TimingSink + ?Sized>(
    track: &MidiTrack,
    timing: &mut T,
    resolution: Tick,
) {
    for timed in &track.events {
        let MidiEvent::Text(text) = &timed.event else {
            continue;
        };
        let label = text.trim().trim_start_matches('[').trim_end_matches(']').trim();
        if label.is_empty() {
            continue;
        }
        timing.add_label(tick_to_row(timed.tick, resolution), label);
    }
}
