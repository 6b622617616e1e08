use std::path::Path;

use fret_schema::{tick_to_row, Song, Tick, ROWS_PER_BEAT};
use tracing::trace;

use super::lexer::{joined_value, parse_lenient_float, parse_lenient_int, parse_tick, ChartReader, Record};
use crate::sink::TimingSink;

pub(crate) const DEFAULT_RESOLUTION: Tick = 192;
const DEFAULT_SAMPLE_SECONDS: f64 = 12.0;
const MIN_LABEL_CHARS: usize = 3;

/// `[Song]` values that outlive the header: the note sections need the resolution and
/// every steps carries the charter and music file.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ChartHeader {
    pub(crate) title: Option<String>,
    pub(crate) artist: Option<String>,
    pub(crate) charter: String,
    pub(crate) offset: Option<f64>,
    pub(crate) resolution: Option<Tick>,
    pub(crate) preview_start: Option<f64>,
    pub(crate) preview_end: Option<f64>,
    pub(crate) music_stream: Option<String>,
}

impl ChartHeader {
    pub(crate) fn resolution(&self) -> Tick {
        self.resolution
            .filter(|r| *r > 0)
            .unwrap_or(DEFAULT_RESOLUTION)
    }

    /// Writes the song-level fields.
    pub(crate) fn apply_to(&self, song: &mut Song) {
        if let Some(title) = &self.title {
            song.title = title.clone();
        }
        if let Some(artist) = &self.artist {
            song.artist = artist.clone();
        }
        song.credit = self.charter.clone();
        song.music_file = self.music_stream.clone();

        if let Some(offset) = self.offset {
            song.timing.set_offset(-offset);
        }
        if self.resolution.is_some() {
            let ticks = self.resolution().min(Tick::from(ROWS_PER_BEAT));
            song.timing.set_tickcount(0, ticks as u32);
        }

        if let Some(start) = self.preview_start {
            song.sample_start_seconds = start;
        }
        if let Some(end) = self.preview_end {
            let length = end - song.sample_start_seconds;
            song.sample_length_seconds = if length <= DEFAULT_SAMPLE_SECONDS {
                DEFAULT_SAMPLE_SECONDS
            } else {
                length
            };
        }
    }
}

pub(crate) fn parse_song_header(
    reader: &mut ChartReader<'_>,
    base_dir: Option<&Path>,
) -> ChartHeader {
    let mut header = ChartHeader::default();

    while let Some(words) = reader.next_section_line() {
        let value = words.get(2..).map(joined_value).unwrap_or_default();
        let first = words.get(2).map(String::as_str).unwrap_or("");

        match words[0].as_str() {
            "Name" => header.title = Some(value),
            "Artist" => header.artist = Some(value),
            "Charter" => header.charter = value,
            "Offset" => header.offset = Some(parse_lenient_float(first)),
            "Resolution" => header.resolution = Some(parse_tick(first)),
            "PreviewStart" => header.preview_start = Some(parse_lenient_float(first)),
            "PreviewEnd" => header.preview_end = Some(parse_lenient_float(first)),
            "MusicStream" => {
                let file = match base_dir {
                    Some(dir) => dir.join(&value).to_string_lossy().into_owned(),
                    None => value,
                };
                header.music_stream = Some(file);
            }
            other => trace!(key = other, "ignoring header key"),
        }
    }

    header
}

/// Tempo changes (`B`, in thousandths of a BPM) and time signatures (`TS`).
pub(crate) fn parse_sync_track<T: TimingSink + ?Sized>(
    reader: &mut ChartReader<'_>,
    timing: &mut T,
    resolution: Tick,
) {
    while let Some(words) = reader.next_section_line() {
        let record = Record::from_words(&words);
        match record.tag {
            "B" => {
                let bpm = record.arg(0).map(parse_lenient_float).unwrap_or(0.0) / 1000.0;
                timing.add_tempo_change(record.tick as f64 / resolution as f64, bpm);
            }
            "TS" => {
                let numerator = record.int_arg(0, 4).clamp(1, i64::from(u32::MAX)) as u32;
                let denominator = match record.arg(1) {
                    Some(exp) => u32::try_from(parse_lenient_int(exp))
                        .ok()
                        .and_then(|e| 1u32.checked_shl(e))
                        .unwrap_or(4),
                    None => 4,
                };
                timing.add_time_signature(
                    tick_to_row(record.tick, resolution),
                    numerator,
                    denominator,
                );
            }
            other => trace!(tag = other, "ignoring sync track record"),
        }
    }
}

/// Section labels from `E "<text>"` lines.
pub(crate) fn parse_events<T: TimingSink + ?Sized>(
    reader: &mut ChartReader<'_>,
    timing: &mut T,
    resolution: Tick,
) {
    while let Some(words) = reader.next_section_line() {
        let record = Record::from_words(&words);
        if record.tag != "E" || record.args.is_empty() {
            continue;
        }
        let text = joined_value(record.args);
        let label = text.strip_prefix("section ").unwrap_or(&text).trim();
        if label.chars().count() < MIN_LABEL_CHARS {
            trace!(label, "dropping short label");
            continue;
        }
        timing.add_label(tick_to_row(record.tick, resolution), label);
    }
}
