//! Text chart (`.chart`) front end.

mod header;
mod lexer;
mod notes;

#[cfg(test)]
mod tests;

use fret_schema::{Difficulty, NoteData, Song, Steps, StepsType, Tick};
use tracing::debug;

use crate::config::{chart_hopo_threshold, SongConfig};
use crate::LoadOptions;
use header::{parse_events, parse_song_header, parse_sync_track, ChartHeader};
use lexer::ChartReader;
use notes::parse_note_section;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Song,
    SyncTrack,
    Events,
    Single(Option<Difficulty>),
}

impl Section {
    fn from_header(word: &str) -> Option<Self> {
        if !word.starts_with('[') {
            return None;
        }
        if word.contains("Song") {
            Some(Self::Song)
        } else if word.contains("SyncTrack") {
            Some(Self::SyncTrack)
        } else if word.contains("Events") {
            Some(Self::Events)
        } else if word.contains("Single") {
            Some(Self::Single(difficulty_from_section(word)))
        } else {
            None
        }
    }
}

fn difficulty_from_section(word: &str) -> Option<Difficulty> {
    [
        Difficulty::Challenge,
        Difficulty::Hard,
        Difficulty::Medium,
        Difficulty::Easy,
    ]
    .into_iter()
    .find(|d| word.contains(d.chart_name()))
}

fn hopo_threshold(header: &ChartHeader, options: &LoadOptions) -> Tick {
    options.hopo_threshold.unwrap_or_else(|| {
        chart_hopo_threshold(
            header.resolution(),
            options.song_ini.as_ref().map(|ini| ini as &dyn SongConfig),
        )
    })
}

/// Parses a whole text chart into a song with one guitar steps per `[<Difficulty>Single]`
/// section.
pub fn parse_chart(src: &str, options: &LoadOptions) -> Song {
    let mut song = Song::default();
    let mut header = ChartHeader::default();
    let mut reader = ChartReader::new(src);

    while let Some(words) = reader.next_words() {
        let Some(section) = Section::from_header(&words[0]) else {
            continue;
        };
        debug!(section = %words[0], line = reader.line_no(), "reading chart section");

        match section {
            Section::Song => {
                header = parse_song_header(&mut reader, options.base_dir.as_deref());
                header.apply_to(&mut song);
            }
            Section::SyncTrack => parse_sync_track(&mut reader, &mut song.timing, header.resolution()),
            Section::Events => parse_events(&mut reader, &mut song.timing, header.resolution()),
            Section::Single(None) => {
                debug!(section = %words[0], "skipping section with unknown difficulty");
                reader.skip_section();
            }
            Section::Single(Some(difficulty)) => {
                let resolution = header.resolution();
                let threshold = hopo_threshold(&header, options);
                debug!(?difficulty, resolution, threshold, "parsing note section");

                let notes = parse_note_section(&mut reader, resolution, threshold);
                let mut steps = Steps::new(StepsType::GuitarSolo, difficulty, notes);
                steps.credit = header.charter.clone();
                steps.description = header.charter.clone();
                steps.music_file = header.music_stream.clone();
                song.steps.push(steps);
            }
        }
    }

    song
}

/// Parses only the note data of one difficulty. The header is still read for its
/// resolution; tempo and label sections are skipped.
pub fn parse_chart_steps(src: &str, difficulty: Difficulty, options: &LoadOptions) -> Option<NoteData> {
    let mut header = ChartHeader::default();
    let mut reader = ChartReader::new(src);

    while let Some(words) = reader.next_words() {
        match Section::from_header(&words[0]) {
            Some(Section::Song) => {
                header = parse_song_header(&mut reader, options.base_dir.as_deref());
            }
            Some(Section::Single(Some(found))) if found == difficulty => {
                let threshold = hopo_threshold(&header, options);
                return Some(parse_note_section(&mut reader, header.resolution(), threshold));
            }
            Some(_) => reader.skip_section(),
            None => {}
        }
    }

    None
}
