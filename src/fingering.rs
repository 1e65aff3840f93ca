//! Fingering
//!
//! Derives playable six-string fingerings for a chord.
//!
//! The neck is scanned in fret windows. Inside each window a backtracking
//! search gives every string one chord tone, never the tone used on the string
//! just above it, and keeps every branch that reaches string 6. The chains it
//! produces then pass three filters in order: the bass is trimmed down to the
//! root, shapes needing too many fingers are dropped, and shapes missing a
//! chord tone are dropped.

use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::ops::RangeInclusive;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, trace};

use crate::fretboard::{Fretboard, DEFAULT_MAX_FRET, STANDARD_TUNING, STRING_COUNT};
use crate::tone::{PitchClass, ToneError};

/// Frets above the window start reachable from one hand position.
const WINDOW_SPAN: u8 = 4;

/// Open position gets one more fret since no barre is needed there.
const OPEN_POSITION_SPAN: u8 = WINDOW_SPAN + 1;

const DEFAULT_MAX_FINGERS: usize = 4;

const DEFAULT_MIN_SOUNDING_STRINGS: usize = 4;

/// Fewest distinct tones that make a chord.
const MIN_CHORD_TONES: usize = 3;

/// Errors when deriving fingerings
#[derive(Debug, Error)]
pub enum FingeringError {
    /// A chord tone or tuning spelling could not be read.
    #[error(transparent)]
    Tone(#[from] ToneError),

    /// The finder was configured with unusable limits.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// What one string does in a fingering
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "RawPosition", try_from = "RawPosition")
)]
pub enum Position {
    /// Not played
    Muted,
    /// Played open (fret 0) or fretted
    Played {
        /// Fret pressed, 0 for the open string.
        fret: u8,
        /// Chord tone sounding at that fret.
        tone: PitchClass,
    },
}

impl Position {
    /// Fret played, `None` when muted.
    pub fn fret(self) -> Option<u8> {
        match self {
            Position::Muted => None,
            Position::Played { fret, .. } => Some(fret),
        }
    }

    /// Tone played, `None` when muted.
    pub fn tone(self) -> Option<PitchClass> {
        match self {
            Position::Muted => None,
            Position::Played { tone, .. } => Some(tone),
        }
    }

    /// Whether the string is silent.
    pub fn is_muted(self) -> bool {
        self == Position::Muted
    }

    /// Whether the string is played without pressing a fret.
    pub fn is_open(self) -> bool {
        self.fret() == Some(0)
    }
}

/// `{ "fret": .., "key": .. }` form read by diagram renderers.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawPosition {
    fret: Option<u8>,
    key: Option<PitchClass>,
}

#[cfg(feature = "serde")]
impl From<Position> for RawPosition {
    fn from(position: Position) -> Self {
        RawPosition {
            fret: position.fret(),
            key: position.tone(),
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<RawPosition> for Position {
    type Error = &'static str;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        match (raw.fret, raw.key) {
            (None, None) => Ok(Position::Muted),
            (Some(fret), Some(tone)) => Ok(Position::Played { fret, tone }),
            _ => Err("fret and key must both be set or both be null"),
        }
    }
}

/// One fingering: a position for each string, string 1 (highest) first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Fingering {
    positions: [Position; STRING_COUNT],
}

impl Fingering {
    /// Wrap positions given string 1 first.
    pub fn new(positions: [Position; STRING_COUNT]) -> Self {
        Fingering { positions }
    }

    /// All positions, string 1 first.
    pub fn positions(&self) -> &[Position; STRING_COUNT] {
        &self.positions
    }

    /// Position on `string` (1-based).
    pub fn position(&self, string: usize) -> Option<Position> {
        string
            .checked_sub(1)
            .and_then(|idx| self.positions.get(idx))
            .copied()
    }

    /// Number of strings that sound.
    pub fn sounding_strings(&self) -> usize {
        self.positions.iter().filter(|p| !p.is_muted()).count()
    }

    /// Lowest fret among sounding strings.
    pub fn min_fret(&self) -> Option<u8> {
        self.positions.iter().filter_map(|p| p.fret()).min()
    }

    /// Fingers needed: one barre across the lowest fret unless it is open,
    /// plus one for every string fretted above it.
    pub fn fingers_required(&self) -> usize {
        let Some(min) = self.min_fret() else {
            return 0;
        };
        let above = self
            .positions
            .iter()
            .filter_map(|p| p.fret())
            .filter(|&fret| fret > min)
            .count();
        usize::from(min > 0) + above
    }

    /// Distinct tones that sound.
    pub fn tones(&self) -> BTreeSet<PitchClass> {
        self.positions.iter().filter_map(|p| p.tone()).collect()
    }

    /// Lowest sounding string and its tone.
    pub fn bass(&self) -> Option<(usize, PitchClass)> {
        self.positions
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, p)| p.tone().map(|tone| (idx + 1, tone)))
    }

    /// Mute low strings until the lowest sounding one plays `root`.
    fn trim_to_root(&mut self, root: PitchClass) {
        for position in self.positions.iter_mut().rev() {
            match position.tone() {
                None => continue,
                Some(tone) if tone == root => break,
                Some(_) => *position = Position::Muted,
            }
        }
    }
}

/// Written low string first, e.g. `x-3-2-0-1-0` for open C.
impl Display for Fingering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, position) in self.positions.iter().rev().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            match position.fret() {
                Some(fret) => write!(f, "{fret}")?,
                None => f.write_str("x")?,
            }
        }
        Ok(())
    }
}

/// Chord tones with duplicates removed, root first.
#[derive(Debug, Clone)]
struct ChordTones {
    ordered: Vec<PitchClass>,
    distinct: BTreeSet<PitchClass>,
}

impl ChordTones {
    /// `None` when fewer than three distinct tones remain.
    fn new(tones: &[PitchClass]) -> Option<Self> {
        let mut ordered = Vec::with_capacity(tones.len());
        for &tone in tones {
            if !ordered.contains(&tone) {
                ordered.push(tone);
            }
        }
        if ordered.len() < MIN_CHORD_TONES {
            return None;
        }
        let distinct = ordered.iter().copied().collect();
        Some(ChordTones { ordered, distinct })
    }

    fn root(&self) -> PitchClass {
        self.ordered[0]
    }
}

/// A tone placed on one string, linked to the choice on the string above.
#[derive(Debug, Copy, Clone)]
struct SearchNode {
    string: usize,
    fret: u8,
    tone: usize,
    parent: Option<usize>,
}

/// Backtracking search over strings 1..=6 inside one fret window.
///
/// Nodes live in a flat arena; a branch that cannot reach string 6 is
/// truncated away, so every node left belongs to at least one full chain.
struct WindowSearch<'a> {
    fretboard: &'a Fretboard,
    tones: &'a [PitchClass],
    window: RangeInclusive<u8>,
    nodes: Vec<SearchNode>,
}

impl<'a> WindowSearch<'a> {
    fn new(fretboard: &'a Fretboard, tones: &'a [PitchClass], window: RangeInclusive<u8>) -> Self {
        WindowSearch {
            fretboard,
            tones,
            window,
            nodes: Vec::new(),
        }
    }

    /// Try each tone on `string` except the one used on the string above.
    /// Returns true if any choice completes a chain.
    fn descend(&mut self, string: usize, above: Option<usize>, parent: Option<usize>) -> bool {
        let mut complete_any = false;

        for tone in 0..self.tones.len() {
            if Some(tone) == above {
                continue;
            }
            let frets = self
                .fretboard
                .find_frets(self.tones[tone], string, self.window.clone());
            let Some(&fret) = frets.first() else {
                continue;
            };

            let id = self.nodes.len();
            self.nodes.push(SearchNode {
                string,
                fret,
                tone,
                parent,
            });

            let complete = string == STRING_COUNT || self.descend(string + 1, Some(tone), Some(id));
            if !complete {
                self.nodes.truncate(id);
            }
            complete_any |= complete;
        }

        complete_any
    }

    /// Walk back from every string-6 node to rebuild its chain.
    fn chains(&self) -> Vec<Fingering> {
        self.nodes
            .iter()
            .filter(|node| node.string == STRING_COUNT)
            .map(|leaf| {
                let mut positions = [Position::Muted; STRING_COUNT];
                let mut cursor = Some(*leaf);
                while let Some(node) = cursor {
                    positions[node.string - 1] = Position::Played {
                        fret: node.fret,
                        tone: self.tones[node.tone],
                    };
                    cursor = node.parent.map(|id| self.nodes[id]);
                }
                Fingering::new(positions)
            })
            .collect()
    }
}

/// Filters applied, in this order, to the chains of one window
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum FilterStage {
    RootTone,
    FingerCount,
    Completeness,
}

impl FilterStage {
    const PIPELINE: [FilterStage; 3] = [
        FilterStage::RootTone,
        FilterStage::FingerCount,
        FilterStage::Completeness,
    ];

    fn admit(self, fingering: &mut Fingering, chord: &ChordTones, finder: &FingeringFinder) -> bool {
        match self {
            FilterStage::RootTone => {
                fingering.trim_to_root(chord.root());
                fingering.sounding_strings() >= finder.min_sounding_strings
            }
            FilterStage::FingerCount => fingering.fingers_required() <= finder.max_fingers,
            FilterStage::Completeness => fingering.tones() == chord.distinct,
        }
    }
}

/// Builder for `FingeringFinder` to customize tuning and playability limits
pub struct FingeringFinderBuilder {
    tuning: [String; STRING_COUNT],
    max_fret: u8,
    max_fingers: usize,
    min_sounding_strings: usize,
}

impl FingeringFinderBuilder {
    /// Start from standard tuning, 15 frets, 4 fingers, 4 sounding strings.
    pub fn new() -> Self {
        FingeringFinderBuilder {
            tuning: STANDARD_TUNING.map(String::from),
            max_fret: DEFAULT_MAX_FRET,
            max_fingers: DEFAULT_MAX_FINGERS,
            min_sounding_strings: DEFAULT_MIN_SOUNDING_STRINGS,
        }
    }

    /// Set the open-string spellings, string 1 first.
    pub fn tuning<S: AsRef<str>>(mut self, tuning: &[S; STRING_COUNT]) -> Self {
        self.tuning = std::array::from_fn(|i| tuning[i].as_ref().to_string());
        self
    }

    /// Set the highest usable fret.
    pub fn max_fret(mut self, fret: u8) -> Self {
        self.max_fret = fret;
        self
    }

    /// Set the most fingers a shape may need.
    pub fn max_fingers(mut self, n: usize) -> Self {
        self.max_fingers = n;
        self
    }

    /// Set the fewest strings a shape must sound after bass trimming.
    pub fn min_sounding_strings(mut self, n: usize) -> Self {
        self.min_sounding_strings = n;
        self
    }

    /// Validate the limits, parse the tuning and build the fretboard.
    pub fn build(self) -> Result<FingeringFinder, FingeringError> {
        if self.max_fingers == 0 {
            return Err(FingeringError::Configuration(
                "max_fingers must be at least 1".into(),
            ));
        }
        if !(1..=STRING_COUNT).contains(&self.min_sounding_strings) {
            return Err(FingeringError::Configuration(format!(
                "min_sounding_strings must be within 1..={STRING_COUNT}"
            )));
        }

        let fretboard = Fretboard::from_spellings(&self.tuning, self.max_fret)?;
        Ok(FingeringFinder {
            fretboard,
            max_fingers: self.max_fingers,
            min_sounding_strings: self.min_sounding_strings,
        })
    }
}

impl Default for FingeringFinderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Main fingering finder
#[derive(Debug, Clone)]
pub struct FingeringFinder {
    fretboard: Fretboard,
    max_fingers: usize,
    min_sounding_strings: usize,
}

impl FingeringFinder {
    /// Return a builder to customize tuning and limits
    pub fn builder() -> FingeringFinderBuilder {
        FingeringFinderBuilder::new()
    }

    /// Create a finder for standard tuning with default limits
    pub fn new() -> Self {
        FingeringFinder {
            fretboard: Fretboard::standard(),
            max_fingers: DEFAULT_MAX_FINGERS,
            min_sounding_strings: DEFAULT_MIN_SOUNDING_STRINGS,
        }
    }

    /// The fretboard searched.
    pub fn fretboard(&self) -> &Fretboard {
        &self.fretboard
    }

    /// Parse `chord_tones` (root first) and derive every fingering.
    ///
    /// Returns:
    /// - `Err(Tone)` if any spelling is invalid.
    /// - `Ok` with an empty set when the chord has fewer than three distinct
    ///   tones or nothing is playable.
    pub fn fingerings<S: AsRef<str>>(
        &self,
        chord_tones: &[S],
    ) -> Result<BTreeSet<Fingering>, FingeringError> {
        let tones = chord_tones
            .iter()
            .map(|s| s.as_ref().parse::<PitchClass>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.fingerings_for(&tones))
    }

    /// Derive every fingering for already-parsed chord tones, root first.
    pub fn fingerings_for(&self, chord_tones: &[PitchClass]) -> BTreeSet<Fingering> {
        let Some(chord) = ChordTones::new(chord_tones) else {
            debug!(tones = chord_tones.len(), "fewer than {MIN_CHORD_TONES} distinct chord tones");
            return BTreeSet::new();
        };

        let windows = self.windows(&chord);

        #[cfg(feature = "rayon")]
        let per_window: Vec<BTreeSet<Fingering>> = windows
            .par_iter()
            .map(|window| self.search_window(&chord, window.clone()))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let per_window: Vec<BTreeSet<Fingering>> = windows
            .iter()
            .map(|window| self.search_window(&chord, window.clone()))
            .collect();

        let result: BTreeSet<Fingering> = per_window.into_iter().flatten().collect();
        debug!(
            tones = chord.ordered.len(),
            windows = windows.len(),
            fingerings = result.len(),
            "derived fingerings"
        );
        result
    }

    /// Fret windows starting at every fret where a chord tone sounds.
    fn windows(&self, chord: &ChordTones) -> Vec<RangeInclusive<u8>> {
        let max_fret = self.fretboard.max_fret();
        let starts: BTreeSet<u8> = chord
            .ordered
            .iter()
            .flat_map(|&tone| self.fretboard.frets_for(tone))
            .collect();

        starts
            .into_iter()
            .filter_map(|start| {
                let span = if start == 0 { OPEN_POSITION_SPAN } else { WINDOW_SPAN };
                let end = start.checked_add(span)?;
                (end <= max_fret).then_some(start..=end)
            })
            .collect()
    }

    fn search_window(&self, chord: &ChordTones, window: RangeInclusive<u8>) -> BTreeSet<Fingering> {
        let (start, end) = (*window.start(), *window.end());
        let mut search = WindowSearch::new(&self.fretboard, &chord.ordered, window);
        if !search.descend(1, None, None) {
            trace!(start, end, "no chain in window");
            return BTreeSet::new();
        }

        let mut survivors: BTreeSet<Fingering> = search.chains().into_iter().collect();
        trace!(start, end, nodes = search.nodes.len(), chains = survivors.len(), "searched window");

        for stage in FilterStage::PIPELINE {
            survivors = survivors
                .into_iter()
                .filter_map(|mut fingering| stage.admit(&mut fingering, chord, self).then_some(fingering))
                .collect();
            trace!(start, end, ?stage, remaining = survivors.len(), "filtered");
        }
        survivors
    }
}

impl Default for FingeringFinder {
    fn default() -> Self {
        FingeringFinder::new()
    }
}

/// Derive every playable fingering of `chord_tones` (root first) on an
/// instrument tuned to `tuning` (string 1 first) with frets up to `max_fret`.
///
/// Fewer than three distinct chord tones, or a chord that fits in no window,
/// gives an empty set.
pub fn derive_fingerings<S: AsRef<str>, T: AsRef<str>>(
    chord_tones: &[S],
    tuning: &[T; STRING_COUNT],
    max_fret: u8,
) -> Result<BTreeSet<Fingering>, FingeringError> {
    FingeringFinder::builder()
        .tuning(tuning)
        .max_fret(max_fret)
        .build()?
        .fingerings(chord_tones)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pc(s: &str) -> PitchClass {
        s.parse().unwrap()
    }

    /// Shape written low string first, `x` for muted, with tones per string.
    fn shape(frets: [Option<u8>; STRING_COUNT], tones: [&str; STRING_COUNT]) -> Fingering {
        let mut positions = [Position::Muted; STRING_COUNT];
        for (i, (fret, tone)) in frets.iter().zip(tones).enumerate() {
            if let Some(fret) = fret {
                positions[STRING_COUNT - 1 - i] = Position::Played {
                    fret: *fret,
                    tone: pc(tone),
                };
            }
        }
        Fingering::new(positions)
    }

    fn open_c() -> Fingering {
        shape(
            [None, Some(3), Some(2), Some(0), Some(1), Some(0)],
            ["1", "1", "3", "5", "1", "3"],
        )
    }

    #[test]
    fn position_accessors() {
        let open = Position::Played {
            fret: 0,
            tone: pc("3"),
        };
        assert!(open.is_open());
        assert!(!open.is_muted());
        assert_eq!(open.tone(), Some(pc("3")));
        assert_eq!(Position::Muted.fret(), None);
        assert!(!Position::Muted.is_open());
    }

    #[test]
    fn open_c_shape_queries() {
        let c = open_c();
        assert_eq!(c.to_string(), "x-3-2-0-1-0");
        assert_eq!(c.sounding_strings(), 5);
        assert_eq!(c.min_fret(), Some(0));
        assert_eq!(c.fingers_required(), 3);
        assert_eq!(c.bass(), Some((5, pc("1"))));
        assert_eq!(c.tones(), [pc("1"), pc("3"), pc("5")].into_iter().collect());
        assert_eq!(c.position(6), Some(Position::Muted));
        assert_eq!(c.position(7), None);
        assert_eq!(c.position(0), None);
    }

    #[test]
    fn barre_counts_as_one_finger() {
        // F major barre: 1-3-3-2-1-1
        let f = shape(
            [Some(1), Some(3), Some(3), Some(2), Some(1), Some(1)],
            ["4", "1", "4", "6", "1", "4"],
        );
        assert_eq!(f.fingers_required(), 4);
        assert_eq!(Fingering::new([Position::Muted; STRING_COUNT]).fingers_required(), 0);
    }

    #[test]
    fn trim_mutes_low_strings_until_root() {
        // A minor with the low E left ringing
        let mut chain = shape(
            [Some(0), Some(0), Some(2), Some(2), Some(1), Some(0)],
            ["3", "6", "3", "6", "1", "3"],
        );
        chain.trim_to_root(pc("6"));
        assert_eq!(chain.to_string(), "x-0-2-2-1-0");
        assert_eq!(chain.bass(), Some((5, pc("6"))));
    }

    #[test]
    fn trim_without_root_mutes_everything() {
        let mut chain = open_c();
        chain.trim_to_root(pc("2"));
        assert_eq!(chain.sounding_strings(), 0);
    }

    #[test]
    fn chord_tones_deduplicate_and_need_three() {
        assert!(ChordTones::new(&[pc("1"), pc("5")]).is_none());
        assert!(ChordTones::new(&[pc("1"), pc("5"), pc("1")]).is_none());
        let chord = ChordTones::new(&[pc("5"), pc("7"), pc("5"), pc("2")]).unwrap();
        assert_eq!(chord.ordered, vec![pc("5"), pc("7"), pc("2")]);
        assert_eq!(chord.root(), pc("5"));
    }

    #[test]
    fn search_keeps_only_complete_branches() {
        let board = Fretboard::standard();
        let tones = [pc("1"), pc("3"), pc("5")];
        let mut search = WindowSearch::new(&board, &tones, 0..=5);
        assert!(search.descend(1, None, None));

        let chains = search.chains();
        assert!(!chains.is_empty());
        for chain in &chains {
            assert_eq!(chain.sounding_strings(), STRING_COUNT);
            for pair in chain.positions().windows(2) {
                assert_ne!(pair[0].tone(), pair[1].tone());
            }
        }
        // every arena node is on some chain
        let leaves = search.nodes.iter().filter(|n| n.string == STRING_COUNT).count();
        assert_eq!(leaves, chains.len());
    }

    #[test]
    fn search_fails_when_a_string_has_no_tone() {
        let board = Fretboard::standard();
        // the G string holds none of C, D, E within frets 0..=1
        let tones = [pc("1"), pc("2"), pc("3")];
        let mut search = WindowSearch::new(&board, &tones, 0..=1);
        assert!(!search.descend(1, None, None));
        assert!(search.nodes.is_empty());
    }

    #[test]
    fn windows_widen_in_open_position_and_stop_at_max_fret() {
        let finder = FingeringFinder::new();
        let chord = ChordTones::new(&[pc("1"), pc("3"), pc("5")]).unwrap();
        let windows = finder.windows(&chord);
        assert_eq!(windows.first(), Some(&(0..=5)));
        assert!(windows.contains(&(1..=5)));
        assert!(windows.iter().all(|w| *w.end() <= DEFAULT_MAX_FRET));
        assert!(!windows.iter().any(|w| *w.start() > DEFAULT_MAX_FRET - WINDOW_SPAN));
    }

    #[test]
    fn open_window_yields_open_c() {
        let finder = FingeringFinder::new();
        let chord = ChordTones::new(&[pc("1"), pc("3"), pc("5")]).unwrap();
        let found = finder.search_window(&chord, 0..=5);
        assert!(found.contains(&open_c()), "got {found:?}");
    }

    #[test]
    fn builder_rejects_bad_limits() {
        assert!(matches!(
            FingeringFinder::builder().max_fingers(0).build(),
            Err(FingeringError::Configuration(_))
        ));
        assert!(matches!(
            FingeringFinder::builder().min_sounding_strings(7).build(),
            Err(FingeringError::Configuration(_))
        ));
        assert!(matches!(
            FingeringFinder::builder().tuning(&["3.", "7", "5", "2", ".6", "#7"]).build(),
            Err(FingeringError::Tone(ToneError::InvalidPitchSpelling { .. }))
        ));
    }

    #[test]
    fn invalid_chord_tone_is_an_error() {
        let err = FingeringFinder::new().fingerings(&["1", "#3", "5"]).unwrap_err();
        assert_eq!(err.to_string(), "invalid pitch spelling `#3`");
    }
}
