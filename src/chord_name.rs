//! Chord Name
//!
//! Names a chord from the stacked thirds between its tones, root first.

use std::fmt::Display;
use thiserror::Error;

use crate::tone::{PitchClass, ToneError, SEMITONES};

/// Gap between two consecutive chord tones, measured upward
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Third {
    /// 2 semitones
    Diminished,
    /// 3 semitones
    Minor,
    /// 4 semitones
    Major,
    /// 5 semitones
    Augmented,
}

impl Third {
    /// Classify the upward gap from `lower` to `upper`, wrapping at the octave.
    pub fn between(lower: PitchClass, upper: PitchClass) -> Option<Third> {
        match (upper.semitone() + SEMITONES - lower.semitone()) % SEMITONES {
            2 => Some(Third::Diminished),
            3 => Some(Third::Minor),
            4 => Some(Third::Major),
            5 => Some(Third::Augmented),
            _ => None,
        }
    }
}

/// Supported chord qualities
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChordKind {
    /// Major triad (e.g., C-E-G)
    Major,
    /// Minor triad (e.g., C-Eb-G)
    Minor,
    /// Augmented triad (e.g., C-E-G#)
    Augmented,
    /// Diminished triad (e.g., C-Eb-Gb)
    Diminished,
    /// Suspended fourth (e.g., C-F-G)
    SuspendedFourth,
    /// Dominant seventh (e.g., C-E-G-Bb)
    DominantSeventh,
    /// Minor-major seventh (e.g., C-Eb-G-B)
    MinorMajorSeventh,
    /// Major seventh (e.g., C-E-G-B)
    MajorSeventh,
    /// Minor seventh (e.g., C-Eb-G-Bb)
    MinorSeventh,
    /// Diminished seventh (e.g., C-Eb-Gb-A)
    DiminishedSeventh,
    /// Half-diminished seventh (e.g., C-Eb-Gb-Bb)
    HalfDiminishedSeventh,
    /// Augmented dominant seventh (e.g., C-E-G#-Bb)
    AugmentedDominantSeventh,
    /// Augmented major seventh (e.g., C-E-G#-B)
    AugmentedMajorSeventh,
}

impl ChordKind {
    /// Recognise a chord from its stacked thirds.
    pub fn from_thirds(thirds: &[Third]) -> Option<ChordKind> {
        use Third::*;

        let kind = match thirds {
            [Major, Minor] => ChordKind::Major,
            [Minor, Major] => ChordKind::Minor,
            [Major, Major] => ChordKind::Augmented,
            [Minor, Minor] => ChordKind::Diminished,
            [Augmented, Diminished] => ChordKind::SuspendedFourth,
            [Major, Minor, Minor] => ChordKind::DominantSeventh,
            [Minor, Major, Major] => ChordKind::MinorMajorSeventh,
            [Major, Minor, Major] => ChordKind::MajorSeventh,
            [Minor, Major, Minor] => ChordKind::MinorSeventh,
            [Minor, Minor, Minor] => ChordKind::DiminishedSeventh,
            [Minor, Minor, Major] => ChordKind::HalfDiminishedSeventh,
            [Major, Major, Diminished] => ChordKind::AugmentedDominantSeventh,
            [Major, Major, Minor] => ChordKind::AugmentedMajorSeventh,
            _ => return None,
        };
        Some(kind)
    }

    /// Symbol written after the root letter.
    pub const fn suffix(self) -> &'static str {
        match self {
            ChordKind::Major => "",
            ChordKind::Minor => "m",
            ChordKind::Augmented => "aug",
            ChordKind::Diminished => "dim",
            ChordKind::SuspendedFourth => "sus4",
            ChordKind::DominantSeventh => "7",
            ChordKind::MinorMajorSeventh => "mM7",
            ChordKind::MajorSeventh => "maj7",
            ChordKind::MinorSeventh => "m7",
            ChordKind::DiminishedSeventh => "dim7",
            ChordKind::HalfDiminishedSeventh => "m7-5",
            ChordKind::AugmentedDominantSeventh => "7#5",
            ChordKind::AugmentedMajorSeventh => "aug7",
        }
    }
}

impl Display for ChordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A named chord
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChordName {
    /// Root tone (first chord tone).
    pub root: PitchClass,
    /// Recognised quality, if any.
    pub kind: Option<ChordKind>,
    /// Number of tones the name was inferred from.
    pub tone_count: usize,
}

/// Root letter plus suffix, e.g. `Dbm7`. Three- and four-tone chords with no
/// known quality show the bare root; other sizes show `...` after it.
impl Display for ChordName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suffix = match (self.kind, self.tone_count) {
            (Some(kind), _) => kind.suffix(),
            (None, 3 | 4) => "",
            (None, _) => "...",
        };
        write!(f, "{}{}", self.root.letter_name(), suffix)
    }
}

/// Errors when naming chords
#[derive(Debug, Error)]
pub enum ChordError {
    /// A chord tone could not be read.
    #[error(transparent)]
    Tone(#[from] ToneError),

    /// An invalid argument was provided to a naming function.
    #[error("invalid argument `{arg}`: {msg}")]
    InvalidArgument {
        /// The name of the invalid argument.
        arg: &'static str,
        /// A description of the invalid argument.
        msg: String,
    },
}

/// Name the chord spelled by `chord_tones`, root first.
///
/// Returns:
/// - `Err(Tone)` if a spelling is invalid.
/// - `Err(InvalidArgument)` if `chord_tones` is empty.
pub fn name_chord<S: AsRef<str>>(chord_tones: &[S]) -> Result<ChordName, ChordError> {
    let tones = chord_tones
        .iter()
        .map(|s| s.as_ref().parse::<PitchClass>())
        .collect::<Result<Vec<_>, _>>()?;
    name_pitches(&tones)
}

/// Name already-parsed chord tones, root first.
pub fn name_pitches(chord_tones: &[PitchClass]) -> Result<ChordName, ChordError> {
    let Some(&root) = chord_tones.first() else {
        return Err(ChordError::InvalidArgument {
            arg: "chord_tones",
            msg: "must hold at least one tone".to_string(),
        });
    };

    let kind = match chord_tones.len() {
        3 | 4 => chord_tones
            .windows(2)
            .map(|pair| Third::between(pair[0], pair[1]))
            .collect::<Option<Vec<_>>>()
            .and_then(|thirds| ChordKind::from_thirds(&thirds)),
        _ => None,
    };

    Ok(ChordName {
        root,
        kind,
        tone_count: chord_tones.len(),
    })
}
