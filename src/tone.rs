//! Tone
//!
//! Numbered-notation pitch model. A tone is a scale degree (1-7) with an
//! optional accidental and an octave offset, written as e.g. `"5"`, `"#4"`,
//! `".6"` (one octave down) or `"3."` (one octave up).

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

/// Chromatic steps per octave.
pub const SEMITONES: usize = 12;

const SEMITONES_I64: i64 = SEMITONES as i64;

/// Leading marks lower a tone by one octave each, trailing marks raise it.
pub const OCTAVE_MARK: char = '.';

/// Semitones above degree 1 for each natural degree.
const NATURAL_SEMITONES: [i64; 7] = [0, 2, 4, 5, 7, 9, 11];

const SOLFEGE: [&str; 7] = ["do", "re", "mi", "fa", "sol", "la", "si"];

const LETTERS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

/// The twelve chromatic slots. Black-key slots carry both spellings: the
/// sharp of the lower degree first, the flat of the upper degree second.
const CHROMATIC: [Slot; SEMITONES] = [
    Slot::Single(PitchClass::natural(1)),
    Slot::Dual(PitchClass::sharp(1), PitchClass::flat(2)),
    Slot::Single(PitchClass::natural(2)),
    Slot::Dual(PitchClass::sharp(2), PitchClass::flat(3)),
    Slot::Single(PitchClass::natural(3)),
    Slot::Single(PitchClass::natural(4)),
    Slot::Dual(PitchClass::sharp(4), PitchClass::flat(5)),
    Slot::Single(PitchClass::natural(5)),
    Slot::Dual(PitchClass::sharp(5), PitchClass::flat(6)),
    Slot::Single(PitchClass::natural(6)),
    Slot::Dual(PitchClass::sharp(6), PitchClass::flat(7)),
    Slot::Single(PitchClass::natural(7)),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Slot {
    Single(PitchClass),
    Dual(PitchClass, PitchClass),
}

impl Slot {
    fn contains(self, pitch: PitchClass) -> bool {
        match self {
            Slot::Single(p) => p == pitch,
            Slot::Dual(sharp, flat) => sharp == pitch || flat == pitch,
        }
    }
}

/// Errors when reading tones
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToneError {
    /// The text does not spell any chromatic slot.
    #[error("invalid pitch spelling `{spelling}`")]
    InvalidPitchSpelling {
        /// The rejected spelling.
        spelling: String,
    },
}

/// Accidental applied to a scale degree
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Accidental {
    /// No accidental
    Natural,
    /// Lowered a semitone (`b`)
    Flat,
    /// Raised a semitone (`#`)
    Sharp,
}

impl Accidental {
    /// Prefix used in numbered notation.
    pub const fn symbol(self) -> &'static str {
        match self {
            Accidental::Natural => "",
            Accidental::Flat => "b",
            Accidental::Sharp => "#",
        }
    }

    const fn offset(self) -> i64 {
        match self {
            Accidental::Natural => 0,
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
        }
    }
}

/// A note identity without octave: degree plus accidental.
///
/// Two spellings of the same chromatic slot (`#4` and `b5`) are distinct pitch
/// classes; chord-tone matching is by spelling.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub struct PitchClass {
    degree: u8,
    accidental: Accidental,
}

impl PitchClass {
    pub(crate) const fn natural(degree: u8) -> Self {
        PitchClass {
            degree,
            accidental: Accidental::Natural,
        }
    }

    const fn sharp(degree: u8) -> Self {
        PitchClass {
            degree,
            accidental: Accidental::Sharp,
        }
    }

    const fn flat(degree: u8) -> Self {
        PitchClass {
            degree,
            accidental: Accidental::Flat,
        }
    }

    /// Build a pitch class, rejecting combinations with no chromatic slot
    /// (`b1`, `#3`, `b4`, `#7`) and degrees outside 1..=7.
    pub fn new(degree: u8, accidental: Accidental) -> Result<Self, ToneError> {
        let pitch = PitchClass { degree, accidental };
        if CHROMATIC.iter().any(|slot| slot.contains(pitch)) {
            Ok(pitch)
        } else {
            Err(ToneError::InvalidPitchSpelling {
                spelling: format!("{}{}", accidental.symbol(), degree),
            })
        }
    }

    /// Chromatic index (0-11) of any valid spelling, octave marks ignored.
    pub fn index_of(spelling: &str) -> Result<usize, ToneError> {
        Ok(spelling.parse::<PitchClass>()?.semitone())
    }

    /// Scale degree, 1-7.
    pub fn degree(self) -> u8 {
        self.degree
    }

    /// Accidental on the degree.
    pub fn accidental(self) -> Accidental {
        self.accidental
    }

    /// Position on the chromatic circle, 0-11.
    pub fn semitone(self) -> usize {
        let natural = NATURAL_SEMITONES[usize::from(self.degree - 1)];
        (natural + self.accidental.offset()).rem_euclid(SEMITONES_I64) as usize
    }

    /// Letter name in the key of C, e.g. `C#` for `#1` and `Db` for `b2`.
    pub fn letter_name(self) -> String {
        format!(
            "{}{}",
            LETTERS[usize::from(self.degree - 1)],
            self.accidental.symbol()
        )
    }
}

impl Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.accidental.symbol(), self.degree)
    }
}

impl FromStr for PitchClass {
    type Err = ToneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<Tone>()?.pitch())
    }
}

impl From<PitchClass> for String {
    fn from(pitch: PitchClass) -> Self {
        pitch.to_string()
    }
}

impl TryFrom<String> for PitchClass {
    type Error = ToneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A pitch class placed in an octave relative to the reference octave.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub struct Tone {
    pitch: PitchClass,
    octave: i64,
}

/// Result of moving a tone by some semitones: black-key targets have two
/// spellings and both are kept.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transposed {
    /// Unambiguous target
    One(Tone),
    /// Sharp spelling first, flat spelling second
    Two(Tone, Tone),
}

impl Transposed {
    /// The first (or only) spelling.
    pub fn first(&self) -> Tone {
        match *self {
            Transposed::One(t) | Transposed::Two(t, _) => t,
        }
    }

    /// Every spelling, sharp before flat.
    pub fn iter(&self) -> impl Iterator<Item = Tone> {
        let (first, second) = match *self {
            Transposed::One(t) => (t, None),
            Transposed::Two(a, b) => (a, Some(b)),
        };
        std::iter::once(first).chain(second)
    }

    /// Whether either spelling is `pitch`, octave ignored.
    pub fn contains_pitch(&self, pitch: PitchClass) -> bool {
        self.iter().any(|t| t.pitch == pitch)
    }
}

impl Tone {
    /// Place `pitch` at `octave` octaves from the reference octave.
    pub const fn new(pitch: PitchClass, octave: i64) -> Self {
        Tone { pitch, octave }
    }

    /// Octave-free identity.
    pub fn pitch(self) -> PitchClass {
        self.pitch
    }

    /// Signed octave offset.
    pub fn octave(self) -> i64 {
        self.octave
    }

    /// Semitones above degree 1 of the reference octave.
    pub fn sounding_semitone(self) -> i64 {
        self.pitch.semitone() as i64 + SEMITONES_I64 * self.octave
    }

    /// Movable-do syllable of the degree.
    pub fn solfege(self) -> &'static str {
        SOLFEGE[usize::from(self.pitch.degree - 1)]
    }

    /// Move by `semitones` (either sign), carrying whole octaves into the
    /// octave offset.
    pub fn transpose(self, semitones: i32) -> Transposed {
        let target = self.pitch.semitone() as i64 + i64::from(semitones);
        let octave = self.octave + target.div_euclid(SEMITONES_I64);
        match CHROMATIC[target.rem_euclid(SEMITONES_I64) as usize] {
            Slot::Single(p) => Transposed::One(Tone::new(p, octave)),
            Slot::Dual(sharp, flat) => {
                Transposed::Two(Tone::new(sharp, octave), Tone::new(flat, octave))
            }
        }
    }
}

impl Default for Tone {
    /// Degree 1 in the reference octave.
    fn default() -> Self {
        Tone::new(PitchClass::natural(1), 0)
    }
}

impl PartialOrd for Tone {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tone {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sounding_semitone()
            .cmp(&other.sounding_semitone())
            .then(self.pitch.cmp(&other.pitch))
    }
}

impl Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marks = OCTAVE_MARK.to_string().repeat(self.octave.unsigned_abs() as usize);
        if self.octave < 0 {
            write!(f, "{marks}{}", self.pitch)
        } else {
            write!(f, "{}{marks}", self.pitch)
        }
    }
}

impl FromStr for Tone {
    type Err = ToneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ToneError::InvalidPitchSpelling {
            spelling: s.to_string(),
        };

        let body = s.trim_start_matches(OCTAVE_MARK);
        let lowered = s.len() - body.len();
        let core = body.trim_end_matches(OCTAVE_MARK);
        let raised = body.len() - core.len();

        let (accidental, digit) = if let Some(rest) = core.strip_prefix('#') {
            (Accidental::Sharp, rest)
        } else if let Some(rest) = core.strip_prefix('b') {
            (Accidental::Flat, rest)
        } else {
            (Accidental::Natural, core)
        };
        let degree = match digit.as_bytes() {
            [d @ b'1'..=b'7'] => d - b'0',
            _ => return Err(invalid()),
        };
        let pitch = PitchClass::new(degree, accidental).map_err(|_| invalid())?;

        Ok(Tone::new(pitch, raised as i64 - lowered as i64))
    }
}

impl From<Tone> for String {
    fn from(tone: Tone) -> Self {
        tone.to_string()
    }
}

impl TryFrom<String> for Tone {
    type Error = ToneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
