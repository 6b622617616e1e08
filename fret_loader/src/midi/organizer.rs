use std::collections::BTreeMap;

use tracing::debug;

use super::events::MidiTrack;

/// Which family of games authored the file. Rock Band files carry drum or vocal parts and
/// never HOPO a note that was part of the preceding chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopoRules {
    GuitarHero,
    RockBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FretLayout {
    #[default]
    Five,
    /// Guitar Hero Live charts: six frets plus a dedicated open column.
    Six,
}

impl FretLayout {
    /// Timeline columns, open column included.
    pub fn columns(self) -> usize {
        match self {
            FretLayout::Five => 6,
            FretLayout::Six => 7,
        }
    }

    /// Keys consumed per difficulty band, marker keys included.
    pub fn midi_lanes(self) -> usize {
        match self {
            FretLayout::Five => 7,
            FretLayout::Six => 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackRole {
    Guitar,
    Bass,
    Drums,
    Vocals,
    Events,
    Venue,
    Beat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTrack {
    pub index: usize,
    pub frets: FretLayout,
}

fn role_for_name(name: &str) -> Option<(TrackRole, FretLayout)> {
    let role = match name {
        "PART GUITAR" | "PART_GUITAR" | "T1 GEMS" => (TrackRole::Guitar, FretLayout::Five),
        "PART GUITAR GHL" => (TrackRole::Guitar, FretLayout::Six),
        "PART BASS" | "PART_BASS" | "PART RHYTHM" | "PART_RHYTHM" => {
            (TrackRole::Bass, FretLayout::Five)
        }
        "PART BASS GHL" => (TrackRole::Bass, FretLayout::Six),
        "PART DRUMS" | "PART_DRUMS" | "BAND DRUMS" | "BAND_DRUMS" => {
            (TrackRole::Drums, FretLayout::Five)
        }
        "PART VOCALS" | "PART_VOCALS" | "BAND SINGER" | "BAND_SINGER" => {
            (TrackRole::Vocals, FretLayout::Five)
        }
        "EVENTS" => (TrackRole::Events, FretLayout::Five),
        "VENUE" => (TrackRole::Venue, FretLayout::Five),
        "BEAT" => (TrackRole::Beat, FretLayout::Five),
        _ => return None,
    };
    Some(role)
}

/// Role assignment for every track of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiOrganizer {
    pub roles: BTreeMap<TrackRole, RoleTrack>,
    pub other: Vec<usize>,
    pub rules: HopoRules,
}

impl MidiOrganizer {
    /// One forward pass over the tracks. The first track claiming a role keeps it;
    /// unnamed or unrecognised tracks that carry tempo or time signatures become the
    /// beat track.
    pub fn organize(tracks: &[MidiTrack]) -> Self {
        let mut roles = BTreeMap::new();

        if tracks.len() == 1 {
            let whole = RoleTrack {
                index: 0,
                frets: FretLayout::Five,
            };
            roles.insert(TrackRole::Guitar, whole);
            roles.insert(TrackRole::Beat, whole);
            return Self {
                roles,
                other: Vec::new(),
                rules: HopoRules::GuitarHero,
            };
        }

        let mut other = Vec::new();
        for (index, track) in tracks.iter().enumerate() {
            let named = track.name.as_deref().and_then(role_for_name);
            let (role, frets) = match named {
                Some(found) => found,
                None if track.has_tempo_map() => (TrackRole::Beat, FretLayout::Five),
                None => {
                    debug!(index, name = ?track.name, "keeping unrecognised track");
                    other.push(index);
                    continue;
                }
            };

            if roles.contains_key(&role) {
                debug!(index, ?role, "ignoring duplicate track role");
                other.push(index);
                continue;
            }
            debug!(index, ?role, ?frets, "assigned track role");
            roles.insert(role, RoleTrack { index, frets });
        }

        let rules = if roles.contains_key(&TrackRole::Drums) || roles.contains_key(&TrackRole::Vocals)
        {
            HopoRules::RockBand
        } else {
            HopoRules::GuitarHero
        };

        Self {
            roles,
            other,
            rules,
        }
    }

    pub fn track(&self, role: TrackRole) -> Option<RoleTrack> {
        self.roles.get(&role).copied()
    }
}
