use std::{
    fs,
    path::{Path, PathBuf},
};

use fret_schema::{Difficulty, NoteData, Song, StepsType, Tick};
use tracing::debug;

pub mod chart;
pub mod config;
mod error;
pub mod midi;
pub mod sink;


pub use chart::{parse_chart, parse_chart_steps};
pub use config::{chart_hopo_threshold, midi_hopo_threshold, SongConfig, SongIni};
pub use error::{LoadError, LoadErrorKind};
pub use midi::{parse_midi, parse_midi_steps, Part};
pub use sink::{categorize, place_note, NoteSink, TimingSink};

pub const SONG_INI: &str = "song.ini";

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Directory that relative music paths resolve against.
    pub base_dir: Option<PathBuf>,
    pub song_ini: Option<SongIni>,
    /// Overrides every threshold derivation when set.
    pub hopo_threshold: Option<Tick>,
}

impl LoadOptions {
    /// Options for a chart file: its directory and the `song.ini` next to it, if readable.
    pub fn for_path(path: &Path) -> Self {
        let base_dir = path.parent().map(Path::to_path_buf);
        let song_ini = base_dir.as_ref().and_then(|dir| {
            let ini_path = dir.join(SONG_INI);
            match SongIni::read_file(&ini_path) {
                Ok(ini) => Some(ini),
                Err(e) => {
                    debug!(path = %ini_path.display(), error = %e, "no song.ini");
                    None
                }
            }
        });
        Self {
            base_dir,
            song_ini,
            hopo_threshold: None,
        }
    }

    pub fn with_hopo_threshold(mut self, threshold: Option<Tick>) -> Self {
        if threshold.is_some() {
            self.hopo_threshold = threshold;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Chart,
    Midi,
}

impl ChartFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "chart" => Some(Self::Chart),
            "mid" | "midi" => Some(Self::Midi),
            _ => None,
        }
    }
}

fn detect_format(path: &Path) -> Result<ChartFormat, LoadError> {
    ChartFormat::from_path(path).ok_or_else(|| {
        LoadError::new(
            "E1002",
            format!("unsupported chart extension: {}", path.display()),
        )
        .with_file(path.display().to_string())
    })
}

fn read_source(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|e| {
        LoadError::new("E1001", format!("failed to read input chart: {e}"))
            .with_file(path.display().to_string())
    })
}

pub fn load_file(path: impl AsRef<Path>) -> Result<Song, LoadError> {
    let path = path.as_ref();
    load_file_with_options(path, LoadOptions::for_path(path))
}

/// Loads a `.chart` or `.mid` file. Only an unreadable file, an unknown extension or an
/// unparseable MIDI container fails; everything inside a readable chart is best effort.
pub fn load_file_with_options(
    path: impl AsRef<Path>,
    options: LoadOptions,
) -> Result<Song, LoadError> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    let bytes = read_source(path)?;
    debug!(path = %path.display(), ?format, "loading chart");

    let file = path.display().to_string();
    let mut song = match format {
        ChartFormat::Chart => load_chart_str(&String::from_utf8_lossy(&bytes), &options),
        ChartFormat::Midi => {
            load_midi_bytes(&bytes, &options).map_err(|e| e.with_file(file.clone()))?
        }
    };

    song.song_file = Some(file.clone());
    for steps in &mut song.steps {
        steps.filename = Some(file.clone());
    }
    Ok(song)
}

pub fn load_chart_str(src: &str, options: &LoadOptions) -> Song {
    parse_chart(src, options)
}

pub fn load_midi_bytes(bytes: &[u8], options: &LoadOptions) -> Result<Song, LoadError> {
    parse_midi(bytes, options)
}

/// Reloads the note data of one steps from its source file. Returns `Ok(None)` when the
/// file has no matching part or difficulty.
pub fn load_steps_file(
    path: impl AsRef<Path>,
    steps_type: StepsType,
    difficulty: Difficulty,
) -> Result<Option<NoteData>, LoadError> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    let bytes = read_source(path)?;
    let options = LoadOptions::for_path(path);

    match format {
        ChartFormat::Chart => {
            if steps_type != StepsType::GuitarSolo {
                return Ok(None);
            }
            Ok(parse_chart_steps(
                &String::from_utf8_lossy(&bytes),
                difficulty,
                &options,
            ))
        }
        ChartFormat::Midi => load_midi_steps(&bytes, Part::from_steps_type(steps_type), difficulty, &options)
            .map_err(|e| e.with_file(path.display().to_string())),
    }
}

pub fn load_midi_steps(
    bytes: &[u8],
    part: Part,
    difficulty: Difficulty,
    options: &LoadOptions,
) -> Result<Option<NoteData>, LoadError> {
    parse_midi_steps(bytes, part, difficulty, options)
}
