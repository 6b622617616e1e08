use std::path::PathBuf;

use fret_schema::{Difficulty, NoteCategory, NoteData, TapNote, TimeSignatureSegment, Tick};

use super::lexer::ChartReader;
use super::notes::{parse_note_section, NoteRecord, NoteSectionState};
use super::{parse_chart, parse_chart_steps};
use crate::config::SongIni;
use crate::LoadOptions;

const RES: Tick = 192;

fn section(body: &str, threshold: Tick) -> NoteData {
    let src = format!("{{\n{body}\n}}\n");
    parse_note_section(&mut ChartReader::new(&src), RES, threshold)
}

fn category(notes: &NoteData, track: usize, row: i32) -> Option<NoteCategory> {
    notes.tap_note(track, row).map(|n| n.category)
}

#[test]
fn close_notes_on_different_lanes_become_hopo() {
    let notes = section("0 = N 0 0\n48 = N 1 0", 48);
    assert_eq!(category(&notes, 0, 0), Some(NoteCategory::Strum));
    assert_eq!(category(&notes, 1, 12), Some(NoteCategory::Hopo));
}

#[test]
fn hopo_window_is_inclusive_of_the_rounding_tick() {
    let notes = section("0 = N 0 0\n96 = N 1 0", 48);
    assert_eq!(category(&notes, 1, 24), Some(NoteCategory::Strum));

    let notes = section("0 = N 0 0\n96 = N 1 0", 95);
    assert_eq!(category(&notes, 1, 24), Some(NoteCategory::Hopo));
}

#[test]
fn repeated_lane_is_never_hopo() {
    let notes = section("0 = N 2 0\n24 = N 2 0", 48);
    assert_eq!(category(&notes, 2, 6), Some(NoteCategory::Strum));
}

#[test]
fn forced_marker_after_note_toggles_it() {
    let notes = section("0 = N 0 0\n48 = N 1 0\n48 = N 5 0\n96 = N 2 0", 48);
    assert_eq!(category(&notes, 1, 12), Some(NoteCategory::Strum));
    // The second pair is unaffected by the earlier marker.
    assert_eq!(category(&notes, 2, 24), Some(NoteCategory::Hopo));
}

#[test]
fn forced_event_before_note_inverts_decision() {
    let notes = section("0 = N 0 0\n48 = E *\n48 = N 1 0", 48);
    assert_eq!(category(&notes, 1, 12), Some(NoteCategory::Strum));

    let notes = section("0 = N 0 0\n96 = E *\n96 = N 1 0", 48);
    assert_eq!(category(&notes, 1, 24), Some(NoteCategory::Hopo));
}

#[test]
fn forced_marker_only_reaches_coincident_notes() {
    let notes = section("0 = E *\n0 = N 0 0\n48 = N 1 0", 48);
    assert_eq!(category(&notes, 0, 0), Some(NoteCategory::Hopo));
    assert_eq!(category(&notes, 1, 12), Some(NoteCategory::Hopo));
}

#[test]
fn two_forced_markers_invert_independently() {
    let notes = section(
        "0 = N 0 0\n48 = N 1 0\n48 = E *\n96 = N 2 0\n96 = E *\n144 = N 3 0",
        48,
    );
    assert_eq!(category(&notes, 0, 0), Some(NoteCategory::Strum));
    assert_eq!(category(&notes, 1, 12), Some(NoteCategory::Strum));
    assert_eq!(category(&notes, 2, 24), Some(NoteCategory::Strum));
    assert_eq!(category(&notes, 3, 36), Some(NoteCategory::Hopo));
}

#[test]
fn markers_stay_within_a_narrow_timeline() {
    let mut notes = NoteData::new(2);
    let mut state = NoteSectionState::new(RES, 48);
    state.apply(&mut notes, NoteRecord::Note { tick: 0, lane: 0, length: 0 });
    state.apply(&mut notes, NoteRecord::Note { tick: 48, lane: 1, length: 0 });
    state.apply(&mut notes, NoteRecord::Note { tick: 48, lane: 3, length: 0 });
    state.apply(&mut notes, NoteRecord::Forced { tick: 48 });
    state.apply(&mut notes, NoteRecord::TapOverride { tick: 0 });

    assert_eq!(notes.num_tracks(), 2);
    assert_eq!(category(&notes, 0, 0), Some(NoteCategory::Tap));
    assert_eq!(category(&notes, 1, 12), Some(NoteCategory::Hopo));
    assert_eq!(notes.len(), 2);
}

#[test]
fn oversized_ticks_do_not_abort_the_section() {
    let notes = section("9223372036854775807 = N 0 10", 48);
    assert_eq!(notes.len(), 1);
    assert!(notes.events()[0].note.is_held());

    let notes = section(
        "-9223372036854775807 = N 0 0\n9223372036854775807 = N 1 0\n99999999999999999999 = N 1 -99999999999999999999",
        48,
    );
    let events = notes.events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.note.category == NoteCategory::Strum));
}

#[test]
fn chord_demotes_earlier_hopo() {
    let notes = section("0 = N 0 0\n48 = N 1 0\n48 = N 2 0", 48);
    assert_eq!(category(&notes, 1, 12), Some(NoteCategory::Strum));
    assert_eq!(category(&notes, 2, 12), Some(NoteCategory::Strum));

    // One tick of rounding still counts as a chord.
    let notes = section("0 = N 0 0\n48 = N 1 0\n49 = N 2 0", 48);
    assert_eq!(category(&notes, 1, 12), Some(NoteCategory::Strum));
}

#[test]
fn note_after_chord_it_belonged_to_is_strum() {
    let notes = section("0 = N 0 0\n0 = N 1 0\n48 = N 0 0", 48);
    assert_eq!(category(&notes, 0, 12), Some(NoteCategory::Strum));

    let notes = section("0 = N 0 0\n0 = N 1 0\n48 = N 2 0", 48);
    assert_eq!(category(&notes, 2, 12), Some(NoteCategory::Hopo));
}

#[test]
fn tap_marker_dominates() {
    let notes = section("0 = N 0 0\n48 = E T\n48 = N 1 0", 48);
    assert_eq!(category(&notes, 1, 12), Some(NoteCategory::Tap));

    let notes = section("0 = N 0 0\n48 = N 1 96\n48 = E T", 48);
    assert_eq!(notes.tap_note(1, 12), Some(TapNote::new(NoteCategory::Tap, 24)));

    let notes = section("0 = N 0 0\n48 = N 5 0\n48 = E T\n48 = N 1 0\n48 = N 5 0", 48);
    assert_eq!(category(&notes, 1, 12), Some(NoteCategory::Tap));
}

#[test]
fn positive_length_makes_a_hold() {
    let notes = section("0 = N 3 96\n192 = N 4 1", 48);
    assert_eq!(notes.tap_note(3, 0), Some(TapNote::new(NoteCategory::Strum, 24)));

    let short = notes.tap_note(4, 48).unwrap();
    assert!(short.is_held());
}

#[test]
fn overlapping_sustain_is_shortened() {
    let notes = section("0 = N 0 192\n192 = N 0 0", 48);
    let first = notes.tap_note(0, 0).unwrap();
    assert_eq!(first, TapNote::new(NoteCategory::Strum, 42));
    assert!(first.duration < 48);
    assert_eq!(category(&notes, 0, 48), Some(NoteCategory::Strum));
}

#[test]
fn sustain_correction_keeps_tap_category() {
    let notes = section("0 = E T\n0 = N 0 192\n192 = N 0 0", 48);
    assert_eq!(notes.tap_note(0, 0), Some(TapNote::new(NoteCategory::Tap, 42)));
}

#[test]
fn malformed_records_are_skipped() {
    let notes = section("junk\n12 = N\n= =\n24 = N 9 0\n0 = S 2 100\n30 = N 1 0", 48);
    assert_eq!(notes.len(), 1);
    assert_eq!(category(&notes, 1, 8), Some(NoteCategory::Strum));
}

const FULL_CHART: &str = "\
[Song]
{
  Name = \"Test Song\"
  Artist = \"Some Band\"
  Charter = \"Someone\"
  Offset = 0.5
  Resolution = 192
  PreviewStart = 10
  PreviewEnd = 40
  MusicStream = \"song.ogg\"
}
[SyncTrack]
{
  0 = TS 4
  0 = B 120000
  768 = TS 6 3
  768 = B 90500
}
[Events]
{
  0 = E \"section Intro\"
  384 = E \"v1\"
  768 = E \"section Verse 1\"
}
[ExpertSingle]
{
\t0 = N 0 0
\t48 = N 1 0
}
[ExpertDoubleBass]
{
  0 = N 0 0
}
[WeirdSingle]
{
  0 = N 0 0
}
[HardSingle]
{
  0 = N 2 96
}
";

#[test]
fn full_chart_populates_song() {
    let song = parse_chart(FULL_CHART, &LoadOptions::default());

    assert_eq!(song.title, "Test Song");
    assert_eq!(song.artist, "Some Band");
    assert_eq!(song.credit, "Someone");
    assert_eq!(song.music_file.as_deref(), Some("song.ogg"));
    assert_eq!(song.timing.offset_seconds, -0.5);
    assert_eq!(song.sample_start_seconds, 10.0);
    assert_eq!(song.sample_length_seconds, 30.0);
    assert_eq!(song.timing.tickcounts.len(), 1);
    assert_eq!(song.timing.tickcounts[0].ticks, 48);

    let bpms: Vec<(f64, f64)> = song
        .timing
        .bpm_segments
        .iter()
        .map(|s| (s.beat, s.bpm))
        .collect();
    assert_eq!(bpms, vec![(0.0, 120.0), (4.0, 90.5)]);
    assert_eq!(
        song.timing.time_signatures,
        vec![
            TimeSignatureSegment { row: 0, numerator: 4, denominator: 4 },
            TimeSignatureSegment { row: 192, numerator: 6, denominator: 8 },
        ]
    );

    let labels: Vec<(i32, &str)> = song
        .timing
        .labels
        .iter()
        .map(|l| (l.row, l.text.as_str()))
        .collect();
    assert_eq!(labels, vec![(0, "Intro"), (192, "Verse 1")]);

    let difficulties: Vec<Difficulty> = song.steps.iter().map(|s| s.difficulty).collect();
    assert_eq!(difficulties, vec![Difficulty::Challenge, Difficulty::Hard]);
    for steps in &song.steps {
        assert_eq!(steps.credit, "Someone");
        assert_eq!(steps.description, "Someone");
        assert_eq!(steps.music_file.as_deref(), Some("song.ogg"));
        assert_eq!(steps.notes.num_tracks(), 6);
    }

    let expert = &song.steps[0].notes;
    assert_eq!(category(expert, 1, 12), Some(NoteCategory::Hopo));
    let hard = &song.steps[1].notes;
    assert_eq!(hard.tap_note(2, 0), Some(TapNote::new(NoteCategory::Strum, 24)));
}

#[test]
fn music_stream_is_resolved_against_base_dir() {
    let options = LoadOptions {
        base_dir: Some(PathBuf::from("/songs/test")),
        ..LoadOptions::default()
    };
    let song = parse_chart(FULL_CHART, &options);
    assert_eq!(song.music_file.as_deref(), Some("/songs/test/song.ogg"));
}

#[test]
fn short_preview_falls_back_to_default_length() {
    let src = "[Song]\n{\n  PreviewStart = 10\n  PreviewEnd = 15\n}\n";
    let song = parse_chart(src, &LoadOptions::default());
    assert_eq!(song.sample_length_seconds, 12.0);
}

#[test]
fn reparse_is_identical() {
    let options = LoadOptions::default();
    assert_eq!(parse_chart(FULL_CHART, &options), parse_chart(FULL_CHART, &options));
}

#[test]
fn song_ini_frequency_narrows_the_window() {
    let options = LoadOptions {
        song_ini: Some(SongIni::parse("[song]\nhopofreq = 4\n")),
        ..LoadOptions::default()
    };
    let song = parse_chart(FULL_CHART, &options);
    assert_eq!(category(&song.steps[0].notes, 1, 12), Some(NoteCategory::Strum));
}

#[test]
fn explicit_threshold_overrides_song_ini() {
    let options = LoadOptions {
        song_ini: Some(SongIni::parse("[song]\nhopofreq = 4\n")),
        hopo_threshold: Some(100),
        ..LoadOptions::default()
    };
    let song = parse_chart(FULL_CHART, &options);
    assert_eq!(category(&song.steps[0].notes, 1, 12), Some(NoteCategory::Hopo));
}

#[test]
fn single_difficulty_lookup() {
    let options = LoadOptions::default();
    let hard = parse_chart_steps(FULL_CHART, Difficulty::Hard, &options).unwrap();
    assert_eq!(hard.tap_note(2, 0), Some(TapNote::new(NoteCategory::Strum, 24)));
    assert!(parse_chart_steps(FULL_CHART, Difficulty::Easy, &options).is_none());
}

#[test]
fn missing_resolution_uses_default() {
    let src = "[ExpertSingle]\n{\n0 = N 0 0\n48 = N 1 0\n}\n";
    let song = parse_chart(src, &LoadOptions::default());
    assert_eq!(category(&song.steps[0].notes, 1, 12), Some(NoteCategory::Hopo));
    assert!(song.timing.tickcounts.is_empty());
}

#[test]
fn byte_order_mark_does_not_hide_header() {
    let src = "\u{feff}[Song]\n{\n  Resolution = 480\n}\n[ExpertSingle]\n{\n0 = N 0 0\n480 = N 1 0\n}\n";
    let song = parse_chart(src, &LoadOptions::default());
    let notes = &song.steps[0].notes;
    assert_eq!(category(notes, 1, 48), Some(NoteCategory::Strum));
    assert_eq!(category(notes, 1, 120), None);
    assert_eq!(song.timing.tickcounts[0].ticks, 48);
}
