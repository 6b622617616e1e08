//! Materialises `midly` tracks into absolute-tick events.

use fret_schema::Tick;
use midly::{MetaMessage, MidiMessage, Smf, Timing, Track, TrackEventKind};
use tracing::debug;

use crate::error::LoadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiEvent {
    /// A note-on with zero velocity is read as `NoteOff`.
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8 },
    /// Payload without the leading `0xF0`.
    SysEx(Vec<u8>),
    TrackName(String),
    Text(String),
    Lyric(String),
    Tempo { micros_per_beat: u32 },
    TimeSignature { numerator: u8, denominator_pow: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
    pub tick: Tick,
    pub event: MidiEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidiTrack {
    pub name: Option<String>,
    pub events: Vec<TimedEvent>,
}

impl MidiTrack {
    fn from_midly(track: &Track<'_>) -> Self {
        let mut out = MidiTrack::default();
        let mut tick: Tick = 0;

        for event in track {
            tick += Tick::from(event.delta.as_int());
            let Some(kind) = convert_event(&event.kind) else {
                continue;
            };
            if let (None, MidiEvent::TrackName(name)) = (&out.name, &kind) {
                out.name = Some(name.clone());
            }
            out.events.push(TimedEvent { tick, event: kind });
        }

        out
    }

    pub fn has_tempo_map(&self) -> bool {
        self.events.iter().any(|e| {
            matches!(
                e.event,
                MidiEvent::Tempo { .. } | MidiEvent::TimeSignature { .. }
            )
        })
    }
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

fn convert_event(kind: &TrackEventKind<'_>) -> Option<MidiEvent> {
    match kind {
        TrackEventKind::Midi { message, .. } => match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => Some(MidiEvent::NoteOff {
                key: key.as_int(),
            }),
            MidiMessage::NoteOn { key, vel } => Some(MidiEvent::NoteOn {
                key: key.as_int(),
                velocity: vel.as_int(),
            }),
            MidiMessage::NoteOff { key, .. } => Some(MidiEvent::NoteOff { key: key.as_int() }),
            _ => None,
        },
        TrackEventKind::SysEx(data) => Some(MidiEvent::SysEx(data.to_vec())),
        TrackEventKind::Meta(meta) => match meta {
            MetaMessage::TrackName(name) => Some(MidiEvent::TrackName(text(name))),
            MetaMessage::Text(t) => Some(MidiEvent::Text(text(t))),
            MetaMessage::Lyric(t) => Some(MidiEvent::Lyric(text(t))),
            MetaMessage::Tempo(micros) => Some(MidiEvent::Tempo {
                micros_per_beat: micros.as_int(),
            }),
            MetaMessage::TimeSignature(numerator, denominator_pow, _, _) => {
                Some(MidiEvent::TimeSignature {
                    numerator: *numerator,
                    denominator_pow: *denominator_pow,
                })
            }
            _ => None,
        },
        TrackEventKind::Escape(_) => None,
    }
}

/// A fully materialised Standard MIDI File.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiSong {
    /// Ticks per beat.
    pub resolution: Tick,
    pub tracks: Vec<MidiTrack>,
}

pub fn read_midi(bytes: &[u8]) -> Result<MidiSong, LoadError> {
    let smf = Smf::parse(bytes)?;

    let resolution = match smf.header.timing {
        Timing::Metrical(tpb) => Tick::from(tpb.as_int()),
        Timing::Timecode(_, _) => {
            return Err(LoadError::new(
                "E2002",
                "timecode-based midi timing is not supported",
            ));
        }
    };
    if resolution <= 0 {
        return Err(LoadError::new("E2001", "invalid midi file: zero ticks per beat"));
    }

    let tracks: Vec<MidiTrack> = smf.tracks.iter().map(MidiTrack::from_midly).collect();
    debug!(tracks = tracks.len(), resolution, "read midi file");

    Ok(MidiSong { resolution, tracks })
}
