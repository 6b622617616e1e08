use serde::{Deserialize, Serialize};

mod notes;
mod timing;

pub use notes::{NoteData, NoteEvent};
pub use timing::{BpmSegment, LabelSegment, TickcountSegment, TimeSignatureSegment, TimingData};

/// Chart-native musical time, relative to a resolution in ticks per beat.
pub type Tick = i64;

/// Discrete timeline position. `ROWS_PER_BEAT` rows make up one beat.
pub type Row = i32;

pub const ROWS_PER_BEAT: i32 = 48;

pub fn beat_to_row(beat: f64) -> Row {
    if !beat.is_finite() {
        return 0;
    }
    (beat * ROWS_PER_BEAT as f64).round() as Row
}

pub fn row_to_beat(row: Row) -> f64 {
    row as f64 / ROWS_PER_BEAT as f64
}

/// Converts a tick position into a row given the chart resolution.
pub fn tick_to_row(tick: Tick, resolution: Tick) -> Row {
    if resolution <= 0 {
        return 0;
    }
    beat_to_row(tick as f64 / resolution as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteCategory {
    #[serde(rename = "tap")]
    Tap,

    #[serde(rename = "strum")]
    Strum,

    #[serde(rename = "hopo")]
    Hopo,
}

/// One event on the timeline. A positive `duration` (in rows) makes it the held variant
/// of its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapNote {
    pub category: NoteCategory,
    #[serde(default)]
    pub duration: Row,
}

impl TapNote {
    pub fn new(category: NoteCategory, duration: Row) -> Self {
        Self {
            category,
            duration: duration.max(0),
        }
    }

    pub fn is_held(&self) -> bool {
        self.duration > 0
    }

    pub fn is_hopo(&self) -> bool {
        self.category == NoteCategory::Hopo
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Challenge,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Challenge,
    ];

    /// Name used by guitar charting tools, where the hardest tier is "Expert".
    pub fn chart_name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Challenge => "Expert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepsType {
    #[serde(rename = "guitar-solo")]
    GuitarSolo,

    #[serde(rename = "guitar-backup")]
    GuitarBackup,

    #[serde(rename = "guitar-solo6")]
    GuitarSolo6,

    #[serde(rename = "guitar-backup6")]
    GuitarBackup6,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Steps {
    pub steps_type: StepsType,
    pub difficulty: Difficulty,
    pub chart_style: String,
    pub credit: String,
    pub description: String,
    pub music_file: Option<String>,
    pub meter: u32,
    pub filename: Option<String>,
    pub notes: NoteData,
}

impl Steps {
    pub fn new(steps_type: StepsType, difficulty: Difficulty, notes: NoteData) -> Self {
        Self {
            steps_type,
            difficulty,
            chart_style: "Guitar".to_string(),
            credit: String::new(),
            description: String::new(),
            music_file: None,
            meter: 1,
            filename: None,
            notes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub artist: String,
    pub credit: String,
    pub music_file: Option<String>,
    pub song_file: Option<String>,
    pub sample_start_seconds: f64,
    pub sample_length_seconds: f64,
    pub timing: TimingData,
    pub steps: Vec<Steps>,
}

impl Song {
    pub fn find_steps(&self, steps_type: StepsType, difficulty: Difficulty) -> Option<&Steps> {
        self.steps
            .iter()
            .find(|s| s.steps_type == steps_type && s.difficulty == difficulty)
    }
}
