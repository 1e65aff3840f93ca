//! Fretboard
//!
//! Precomputed map of the tone sounding at every string and fret, built once
//! from the open-string tuning by transposing each open tone fret by fret.

use std::collections::BTreeSet;
use std::ops::{Bound, RangeBounds};

use crate::tone::{PitchClass, Tone, ToneError, Transposed};

/// Strings on the instrument. String 1 is the highest pitched.
pub const STRING_COUNT: usize = 6;

/// Highest fret included in the map unless configured otherwise.
pub const DEFAULT_MAX_FRET: u8 = 15;

/// Standard tuning E B G D A E, string 1 first.
pub const STANDARD_TUNING: [&str; STRING_COUNT] = ["3.", "7", "5", "2", ".6", ".3"];

/// [`STANDARD_TUNING`] as tones.
pub const STANDARD_TONES: [Tone; STRING_COUNT] = [
    Tone::new(PitchClass::natural(3), 1),
    Tone::new(PitchClass::natural(7), 0),
    Tone::new(PitchClass::natural(5), 0),
    Tone::new(PitchClass::natural(2), 0),
    Tone::new(PitchClass::natural(6), -1),
    Tone::new(PitchClass::natural(3), -1),
];

/// Tones at every `(string, fret)` for frets `0..=max_fret`
#[derive(Debug, Clone)]
pub struct Fretboard {
    tuning: [Tone; STRING_COUNT],
    max_fret: u8,
    cells: Vec<Vec<Transposed>>,
}

impl Fretboard {
    /// Build the map for `tuning` (string 1 first) up to `max_fret`.
    pub fn new(tuning: [Tone; STRING_COUNT], max_fret: u8) -> Self {
        let cells = tuning
            .iter()
            .map(|open| {
                (0..=max_fret)
                    .map(|fret| open.transpose(i32::from(fret)))
                    .collect()
            })
            .collect();

        Fretboard {
            tuning,
            max_fret,
            cells,
        }
    }

    /// Parse the open-string spellings and build the map.
    pub fn from_spellings<S: AsRef<str>>(
        tuning: &[S; STRING_COUNT],
        max_fret: u8,
    ) -> Result<Self, ToneError> {
        let mut tones = [Tone::default(); STRING_COUNT];
        for (tone, spelling) in tones.iter_mut().zip(tuning) {
            *tone = spelling.as_ref().parse()?;
        }
        Ok(Fretboard::new(tones, max_fret))
    }

    /// Standard tuning up to [`DEFAULT_MAX_FRET`].
    pub fn standard() -> Self {
        Fretboard::new(STANDARD_TONES, DEFAULT_MAX_FRET)
    }

    /// Open-string tones, string 1 first.
    pub fn tuning(&self) -> &[Tone; STRING_COUNT] {
        &self.tuning
    }

    /// Highest mapped fret.
    pub fn max_fret(&self) -> u8 {
        self.max_fret
    }

    /// Tone(s) at `string` (1-based) and `fret`, if both are on the board.
    pub fn tones_at(&self, string: usize, fret: u8) -> Option<&Transposed> {
        self.string_cells(string)?.get(usize::from(fret))
    }

    /// Frets on `string` within `frets` whose tone matches `pitch` in either
    /// spelling, octave ignored. Ascending; `..` searches the whole string.
    pub fn find_frets<R: RangeBounds<u8>>(
        &self,
        pitch: PitchClass,
        string: usize,
        frets: R,
    ) -> Vec<u8> {
        let Some(cells) = self.string_cells(string) else {
            return Vec::new();
        };

        let lo = match frets.start_bound() {
            Bound::Included(&f) => usize::from(f),
            Bound::Excluded(&f) => usize::from(f) + 1,
            Bound::Unbounded => 0,
        };
        let hi = match frets.end_bound() {
            Bound::Included(&f) => usize::from(f) + 1,
            Bound::Excluded(&f) => usize::from(f),
            Bound::Unbounded => cells.len(),
        }
        .min(cells.len());

        (lo..hi)
            .filter(|&fret| cells[fret].contains_pitch(pitch))
            .map(|fret| fret as u8)
            .collect()
    }

    /// Every fret on any string where `pitch` sounds.
    pub fn frets_for(&self, pitch: PitchClass) -> BTreeSet<u8> {
        (1..=STRING_COUNT)
            .flat_map(|string| self.find_frets(pitch, string, ..))
            .collect()
    }

    fn string_cells(&self, string: usize) -> Option<&[Transposed]> {
        string
            .checked_sub(1)
            .and_then(|idx| self.cells.get(idx))
            .map(Vec::as_slice)
    }
}

impl Default for Fretboard {
    fn default() -> Self {
        Fretboard::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pc(s: &str) -> PitchClass {
        s.parse().unwrap()
    }

    #[test]
    fn open_strings_sound_the_tuning() {
        let board = Fretboard::standard();
        for (string, spelling) in STANDARD_TUNING.iter().enumerate() {
            let open = board.tones_at(string + 1, 0).unwrap();
            assert_eq!(*open, Transposed::One(spelling.parse().unwrap()));
        }
        assert_eq!(board.max_fret(), DEFAULT_MAX_FRET);
    }

    #[test]
    fn standard_tones_match_standard_spellings() {
        let parsed = Fretboard::from_spellings(&STANDARD_TUNING, DEFAULT_MAX_FRET).unwrap();
        assert_eq!(parsed.tuning(), &STANDARD_TONES);
        assert_eq!(Fretboard::standard().tuning(), &STANDARD_TONES);
        let spelled: Vec<String> = STANDARD_TONES.iter().map(ToString::to_string).collect();
        assert_eq!(spelled, STANDARD_TUNING);
    }

    #[test]
    fn cells_stop_at_max_fret() {
        let board = Fretboard::standard();
        assert!(board.tones_at(1, 15).is_some());
        assert!(board.tones_at(1, 16).is_none());
        assert!(board.tones_at(0, 0).is_none());
        assert!(board.tones_at(7, 0).is_none());
    }

    #[test]
    fn fifth_fret_of_low_e_is_a() {
        let board = Fretboard::standard();
        assert_eq!(
            *board.tones_at(6, 5).unwrap(),
            Transposed::One(".6".parse().unwrap())
        );
        assert_eq!(
            *board.tones_at(6, 12).unwrap(),
            Transposed::One("3".parse().unwrap())
        );
    }

    #[test]
    fn find_frets_over_whole_string() {
        let board = Fretboard::standard();
        // C on the A string
        assert_eq!(board.find_frets(pc("1"), 5, ..), vec![3, 15]);
        // E on the high E string, octave marks ignored
        assert_eq!(board.find_frets(pc("3."), 1, ..), vec![0, 12]);
    }

    #[test]
    fn find_frets_respects_window() {
        let board = Fretboard::standard();
        assert_eq!(board.find_frets(pc("1"), 5, 0..=5), vec![3]);
        assert_eq!(board.find_frets(pc("1"), 5, 4..=14), Vec::<u8>::new());
        assert_eq!(board.find_frets(pc("1"), 5, 3..=3), vec![3]);
        assert_eq!(board.find_frets(pc("1"), 5, 10..=40), vec![15]);
    }

    #[test]
    fn find_frets_checks_both_spellings() {
        let board = Fretboard::standard();
        // F#/Gb on the high E string
        assert_eq!(board.find_frets(pc("#4"), 1, ..), vec![2, 14]);
        assert_eq!(board.find_frets(pc("b5"), 1, ..), vec![2, 14]);
    }

    #[test]
    fn unknown_strings_have_no_frets() {
        let board = Fretboard::standard();
        assert!(board.find_frets(pc("1"), 0, ..).is_empty());
        assert!(board.find_frets(pc("1"), 7, ..).is_empty());
    }

    #[test]
    fn frets_for_collects_all_strings() {
        let board = Fretboard::standard();
        let frets = board.frets_for(pc("1"));
        // C: B string 1, G string 5, D string 10, A string 3, E strings 8
        for f in [1, 3, 5, 8, 10, 13, 15] {
            assert!(frets.contains(&f), "missing fret {f}");
        }
        assert!(!frets.contains(&0));
    }

    #[test]
    fn bad_tuning_spelling_is_reported() {
        let err = Fretboard::from_spellings(&["3.", "7", "5", "2", ".6", "b4"], 12).unwrap_err();
        assert_eq!(
            err,
            ToneError::InvalidPitchSpelling {
                spelling: "b4".into()
            }
        );
    }
}
