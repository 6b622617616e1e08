use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use fret_schema::{beat_to_row, NoteCategory, NoteEvent, Row, Song, Steps};

fn head_char(category: NoteCategory) -> char {
    match category {
        NoteCategory::Tap => 'T',
        NoteCategory::Strum => 'N',
        NoteCategory::Hopo => 'H',
    }
}

/// Prints one line per row that has something on it: heads by category, `|` while a
/// sustain is held, `#` on its tail.
pub fn write_lane_view(out: &mut impl Write, song: &Song, steps: &Steps) -> io::Result<()> {
    let notes = &steps.notes;
    let events = notes.events();
    if events.is_empty() {
        writeln!(out, "Steps are empty.")?;
        return Ok(());
    }

    let mut heads: BTreeMap<Row, Vec<&NoteEvent>> = BTreeMap::new();
    let mut tails: BTreeMap<Row, Vec<&NoteEvent>> = BTreeMap::new();
    for event in &events {
        heads.entry(event.row).or_default().push(event);
        if event.note.is_held() {
            tails.entry(event.end_row()).or_default().push(event);
        }
    }

    let bpm_rows: BTreeMap<Row, f64> = song
        .timing
        .bpm_segments
        .iter()
        .map(|s| (beat_to_row(s.beat), s.bpm))
        .collect();

    let mut rows: BTreeSet<Row> = heads.keys().chain(tails.keys()).copied().collect();
    rows.extend(bpm_rows.keys().copied());
    rows.extend(song.timing.labels.iter().map(|l| l.row));

    let columns = notes.num_tracks();
    let lane_header: Vec<String> = (0..columns)
        .map(|c| {
            if c + 1 == columns {
                "O".to_string()
            } else {
                (c + 1).to_string()
            }
        })
        .collect();

    writeln!(
        out,
        "{:?} {:?} ({} notes)",
        steps.steps_type,
        steps.difficulty,
        events.len()
    )?;
    writeln!(out, " Time(s) | {} | Info", lane_header.join(" "))?;
    writeln!(out, "---------|-{}-|------------------", "-".repeat(columns * 2 - 1))?;

    let mut holding = vec![false; columns];
    for row in rows {
        let mut lanes: Vec<char> = holding.iter().map(|h| if *h { '|' } else { '.' }).collect();

        for event in tails.get(&row).into_iter().flatten() {
            lanes[event.track] = '#';
            holding[event.track] = false;
        }
        for event in heads.get(&row).into_iter().flatten() {
            lanes[event.track] = head_char(event.note.category);
            if event.note.is_held() {
                holding[event.track] = true;
            }
        }

        let mut info = Vec::new();
        if let Some(bpm) = bpm_rows.get(&row) {
            info.push(format!("BPM: {bpm:.1}"));
        }
        for label in song.timing.labels.iter().filter(|l| l.row == row) {
            info.push(label.text.clone());
        }

        let lane_str: String = lanes
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            out,
            "{:8.3} | {} | {}",
            song.timing.elapsed_seconds_at_row(row),
            lane_str,
            info.join(", ")
        )?;
    }

    Ok(())
}
