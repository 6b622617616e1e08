//! MIDI (`.mid`) front end.

mod events;
mod notes;
mod organizer;
mod sysex;
mod tempo;


use fret_schema::{Difficulty, NoteData, Song, Steps, StepsType, Tick};
use tracing::{debug, warn};

use crate::config::{midi_hopo_threshold, SongConfig, SongIni};
use crate::error::LoadError;
use crate::LoadOptions;

pub use events::{read_midi, MidiEvent, MidiSong, MidiTrack, TimedEvent};
pub use organizer::{FretLayout, HopoRules, MidiOrganizer, RoleTrack, TrackRole};
pub use sysex::{translate_sysex, SectionToggle};

use notes::notes_from_track;
use tempo::{parse_beat_track, parse_event_track};

/// Playable part of a MIDI chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Guitar,
    Bass,
}

impl Part {
    fn role(self) -> TrackRole {
        match self {
            Part::Guitar => TrackRole::Guitar,
            Part::Bass => TrackRole::Bass,
        }
    }

    fn steps_type(self, frets: FretLayout) -> StepsType {
        match (self, frets) {
            (Part::Guitar, FretLayout::Five) => StepsType::GuitarSolo,
            (Part::Guitar, FretLayout::Six) => StepsType::GuitarSolo6,
            (Part::Bass, FretLayout::Five) => StepsType::GuitarBackup,
            (Part::Bass, FretLayout::Six) => StepsType::GuitarBackup6,
        }
    }

    pub fn from_steps_type(steps_type: StepsType) -> Self {
        match steps_type {
            StepsType::GuitarSolo | StepsType::GuitarSolo6 => Part::Guitar,
            StepsType::GuitarBackup | StepsType::GuitarBackup6 => Part::Bass,
        }
    }
}

fn hopo_threshold(resolution: Tick, options: &LoadOptions) -> Tick {
    options.hopo_threshold.unwrap_or_else(|| {
        midi_hopo_threshold(
            resolution,
            options.song_ini.as_ref().map(|ini| ini as &dyn SongConfig),
        )
    })
}

fn ini_value(ini: Option<&SongIni>, key: &str) -> String {
    ini.and_then(|ini| ini.song_value(key))
        .unwrap_or_default()
        .to_string()
}

/// Parses a whole MIDI chart: tempo map, section labels and four steps per guitar part.
pub fn parse_midi(bytes: &[u8], options: &LoadOptions) -> Result<Song, LoadError> {
    let midi = read_midi(bytes)?;
    let organizer = MidiOrganizer::organize(&midi.tracks);
    let resolution = midi.resolution;
    let threshold = hopo_threshold(resolution, options);
    debug!(resolution, threshold, rules = ?organizer.rules, "parsing midi chart");

    let ini = options.song_ini.as_ref();
    let charter = ini_value(ini, "frets");
    let mut song = Song {
        title: ini_value(ini, "name"),
        artist: ini_value(ini, "artist"),
        credit: charter.clone(),
        ..Song::default()
    };

    let beat = organizer
        .track(TrackRole::Beat)
        .map(|t| t.index)
        .unwrap_or_else(|| {
            warn!("no tempo track found, using the first track");
            0
        });
    if let Some(track) = midi.tracks.get(beat) {
        parse_beat_track(track, &mut song.timing, resolution);
    }
    if let Some(events) = organizer.track(TrackRole::Events) {
        parse_event_track(&midi.tracks[events.index], &mut song.timing, resolution);
    }

    for part in [Part::Guitar, Part::Bass] {
        let Some(role) = organizer.track(part.role()) else {
            if part == Part::Guitar {
                warn!("no guitar track found");
            }
            continue;
        };
        let track = &midi.tracks[role.index];
        for difficulty in Difficulty::ALL {
            let notes = notes_from_track(
                track,
                difficulty,
                organizer.rules,
                role.frets,
                resolution,
                threshold,
            );
            let mut steps = Steps::new(part.steps_type(role.frets), difficulty, notes);
            steps.credit = charter.clone();
            steps.description = charter.clone();
            song.steps.push(steps);
        }
    }

    Ok(song)
}

/// Parses the note data of a single part and difficulty. Returns `Ok(None)` when the
/// file has no track for `part`.
pub fn parse_midi_steps(
    bytes: &[u8],
    part: Part,
    difficulty: Difficulty,
    options: &LoadOptions,
) -> Result<Option<NoteData>, LoadError> {
    let midi = read_midi(bytes)?;
    let organizer = MidiOrganizer::organize(&midi.tracks);
    let threshold = hopo_threshold(midi.resolution, options);

    Ok(organizer.track(part.role()).map(|role| {
        notes_from_track(
            &midi.tracks[role.index],
            difficulty,
            organizer.rules,
            role.frets,
            midi.resolution,
            threshold,
        )
    }))
}
