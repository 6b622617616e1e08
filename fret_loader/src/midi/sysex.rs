//! Phase Shift style System-Exclusive section markers.
//!
//! Payload layout (after `0xF0`): `50 53 00 00 <difficulty> <type> <state> [F7]`, where
//! the difficulty byte is 0..=3 or `FF` for every difficulty, the type is `01` for open
//! notes or `04` for tap notes, and the state is `01` to start a section, `00` to end it.

use fret_schema::Difficulty;

const HEADER: [u8; 4] = [0x50, 0x53, 0x00, 0x00];
const ALL_DIFFICULTIES: u8 = 0xFF;
const OPEN_TYPE: u8 = 0x01;
const TAP_TYPE: u8 = 0x04;
const PAYLOAD_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionToggle {
    Tap(bool),
    Open(bool),
}

fn difficulty_code(difficulty: Difficulty) -> u8 {
    match difficulty {
        Difficulty::Easy => 0x00,
        Difficulty::Medium => 0x01,
        Difficulty::Hard => 0x02,
        Difficulty::Challenge => 0x03,
    }
}

/// Decodes a payload for `difficulty`. Anything that does not match returns `None`.
pub fn translate_sysex(data: &[u8], difficulty: Difficulty) -> Option<SectionToggle> {
    if data.len() < PAYLOAD_LEN || data[..4] != HEADER {
        return None;
    }

    let target = data[4];
    if target != ALL_DIFFICULTIES && target != difficulty_code(difficulty) {
        return None;
    }

    let on = match data[6] {
        0x00 => false,
        0x01 => true,
        _ => return None,
    };

    match data[5] {
        TAP_TYPE => Some(SectionToggle::Tap(on)),
        OPEN_TYPE => Some(SectionToggle::Open(on)),
        _ => None,
    }
}
