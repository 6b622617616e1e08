use serde::{Deserialize, Serialize};

use crate::{row_to_beat, Row};

const DEFAULT_BPM: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpmSegment {
    pub beat: f64,
    pub bpm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignatureSegment {
    pub row: Row,
    pub numerator: u32,
    pub denominator: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSegment {
    pub row: Row,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickcountSegment {
    pub row: Row,
    pub ticks: u32,
}

/// Tempo map and timing metadata. Segments are kept sorted; adding a segment at an
/// existing position replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingData {
    /// Beat 0 offset in seconds (the negated chart offset).
    pub offset_seconds: f64,
    pub bpm_segments: Vec<BpmSegment>,
    pub time_signatures: Vec<TimeSignatureSegment>,
    pub labels: Vec<LabelSegment>,
    pub tickcounts: Vec<TickcountSegment>,
}

impl TimingData {
    pub fn set_offset(&mut self, seconds: f64) {
        self.offset_seconds = seconds;
    }

    pub fn add_tempo_change(&mut self, beat: f64, bpm: f64) {
        if !(bpm > 0.0) || !beat.is_finite() {
            return;
        }
        match self
            .bpm_segments
            .binary_search_by(|s| s.beat.total_cmp(&beat))
        {
            Ok(i) => self.bpm_segments[i].bpm = bpm,
            Err(i) => self.bpm_segments.insert(i, BpmSegment { beat, bpm }),
        }
    }

    pub fn add_time_signature(&mut self, row: Row, numerator: u32, denominator: u32) {
        let seg = TimeSignatureSegment {
            row,
            numerator,
            denominator,
        };
        match self.time_signatures.binary_search_by_key(&row, |s| s.row) {
            Ok(i) => self.time_signatures[i] = seg,
            Err(i) => self.time_signatures.insert(i, seg),
        }
    }

    /// Labels at the same row are kept in insertion order.
    pub fn add_label(&mut self, row: Row, text: impl Into<String>) {
        let idx = self.labels.partition_point(|l| l.row <= row);
        self.labels.insert(
            idx,
            LabelSegment {
                row,
                text: text.into(),
            },
        );
    }

    pub fn set_tickcount(&mut self, row: Row, ticks: u32) {
        let seg = TickcountSegment { row, ticks };
        match self.tickcounts.binary_search_by_key(&row, |s| s.row) {
            Ok(i) => self.tickcounts[i] = seg,
            Err(i) => self.tickcounts.insert(i, seg),
        }
    }

    pub fn bpm_at_beat(&self, beat: f64) -> f64 {
        self.bpm_segments
            .iter()
            .take_while(|s| s.beat <= beat)
            .last()
            .or_else(|| self.bpm_segments.first())
            .map(|s| s.bpm)
            .unwrap_or(DEFAULT_BPM)
    }

    pub fn elapsed_seconds_at_beat(&self, beat: f64) -> f64 {
        let mut seconds = 0.0;
        let mut cursor = 0.0;
        let mut bpm = self.bpm_segments.first().map(|s| s.bpm).unwrap_or(DEFAULT_BPM);

        for seg in &self.bpm_segments {
            if seg.beat >= beat {
                break;
            }
            if seg.beat > cursor {
                seconds += (seg.beat - cursor) * 60.0 / bpm;
                cursor = seg.beat;
            }
            bpm = seg.bpm;
        }
        seconds += (beat - cursor) * 60.0 / bpm;
        seconds - self.offset_seconds
    }

    pub fn elapsed_seconds_at_row(&self, row: Row) -> f64 {
        self.elapsed_seconds_at_beat(row_to_beat(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_time_integrates_tempo_changes() {
        let mut td = TimingData::default();
        td.add_tempo_change(0.0, 120.0);
        td.add_tempo_change(4.0, 60.0);

        assert_eq!(td.elapsed_seconds_at_beat(2.0), 1.0);
        assert_eq!(td.elapsed_seconds_at_beat(4.0), 2.0);
        assert_eq!(td.elapsed_seconds_at_beat(6.0), 4.0);
        assert_eq!(td.bpm_at_beat(5.0), 60.0);
        assert_eq!(td.elapsed_seconds_at_row(96), 1.0);
    }

    #[test]
    fn offset_shifts_elapsed_time() {
        let mut td = TimingData::default();
        td.add_tempo_change(0.0, 60.0);
        td.set_offset(-0.5);
        assert_eq!(td.elapsed_seconds_at_beat(1.0), 1.5);
    }

    #[test]
    fn segments_at_same_position_replace() {
        let mut td = TimingData::default();
        td.add_tempo_change(0.0, 120.0);
        td.add_tempo_change(0.0, 150.0);
        td.add_tempo_change(1.0, -3.0);
        assert_eq!(td.bpm_segments, vec![BpmSegment { beat: 0.0, bpm: 150.0 }]);

        td.add_time_signature(0, 4, 4);
        td.add_time_signature(0, 3, 4);
        assert_eq!(td.time_signatures.len(), 1);
        assert_eq!(td.time_signatures[0].numerator, 3);
    }

    #[test]
    fn labels_keep_insertion_order_within_a_row() {
        let mut td = TimingData::default();
        td.add_label(96, "chorus");
        td.add_label(0, "intro");
        td.add_label(96, "solo");
        let texts: Vec<&str> = td.labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["intro", "chorus", "solo"]);
    }

    #[test]
    fn empty_tempo_map_uses_default_bpm() {
        let td = TimingData::default();
        assert_eq!(td.bpm_at_beat(3.0), DEFAULT_BPM);
        assert_eq!(td.elapsed_seconds_at_beat(2.0), 1.0);
    }
}
