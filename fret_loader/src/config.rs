//! `song.ini` lookup and HOPO threshold derivation.
//!
//! Community charts ship an optional `song.ini` next to the chart. Only a handful of keys
//! in its `[song]` section matter here: `hopofreq`, `eighthnote_hopo`, and for MIDI songs
//! the `name`/`artist`/`frets` metadata.

use std::{collections::HashMap, fs, io, path::Path};

use fret_schema::Tick;

pub const SONG_SECTION: &str = "song";

/// Opaque key lookup over an INI-style config.
pub trait SongConfig {
    fn value(&self, section: &str, key: &str) -> Option<&str>;

    fn int_value(&self, section: &str, key: &str) -> Option<i64> {
        self.value(section, key)?.trim().parse().ok()
    }

    fn bool_value(&self, section: &str, key: &str) -> Option<bool> {
        let raw = self.value(section, key)?.trim().to_ascii_lowercase();
        match raw.as_str() {
            "true" | "yes" | "on" => Some(true),
            "false" | "no" | "off" => Some(false),
            other => other.parse::<i64>().ok().map(|v| v != 0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongIni {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SongIni {
    pub fn parse(src: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current = String::new();

        for raw_line in src.lines() {
            let line = raw_line.trim().trim_start_matches('\u{feff}');
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = name.trim().to_ascii_lowercase();
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                continue;
            }
            sections
                .entry(current.clone())
                .or_default()
                .insert(key, value.trim().to_string());
        }

        Self { sections }
    }

    /// Reads an ini file; bytes that are not valid UTF-8 are replaced rather than rejected.
    pub fn read_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    pub fn song_value(&self, key: &str) -> Option<&str> {
        self.value(SONG_SECTION, key)
    }
}

impl SongConfig for SongIni {
    fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(&section.to_ascii_lowercase())?
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// HOPO threshold for the text chart format.
///
/// Without a config the threshold is a sixteenth note (`resolution / 4`).
pub fn chart_hopo_threshold(resolution: Tick, config: Option<&dyn SongConfig>) -> Tick {
    let Some(config) = config else {
        return resolution / 4;
    };

    let mut threshold = match config.int_value(SONG_SECTION, "hopofreq") {
        Some(0) => resolution / 2,
        Some(1) => resolution * 3 / 8,
        Some(3) => resolution * 3 / 16,
        Some(4) => resolution / 8,
        _ => resolution / 4,
    };
    if config.bool_value(SONG_SECTION, "eighthnote_hopo") == Some(true) {
        threshold /= 2;
    }
    threshold
}

/// HOPO threshold for MIDI charts, which use a slightly wider window than text charts.
pub fn midi_hopo_threshold(resolution: Tick, config: Option<&dyn SongConfig>) -> Tick {
    let Some(config) = config else {
        return resolution / 3 + 10;
    };

    let mut threshold = match config.int_value(SONG_SECTION, "hopofreq") {
        Some(0) => resolution / 6 + 10,
        Some(1) => resolution / 4 + 10,
        Some(3) => resolution / 2 + 10,
        Some(4) => resolution * 2 / 3 + 10,
        Some(5) => resolution + 10,
        _ => resolution / 3 + 10,
    };
    if config.bool_value(SONG_SECTION, "eighthnote_hopo") == Some(true) {
        threshold /= 2;
    }
    threshold
}
