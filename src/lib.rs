//! # chord_fingering
//!
//! Derive playable guitar fingerings for any chord written in numbered
//! notation, and name chords from the thirds they stack.
//!
//! ## Example
//! ```rust
//! use chord_fingering::{name_chord, FingeringFinder};
//!
//! fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1) Build a finder (standard tuning, 15 frets, at most 4 fingers)
//!     let finder = FingeringFinder::builder()
//!         .max_fret(12)
//!         .build()?;
//!
//!     // 2) Chord tones, root first: C major
//!     let tones = ["1", "3", "5"];
//!     let name = name_chord(&tones)?;
//!
//!     // 3) Every playable shape, low string first in the printout
//!     for fingering in finder.fingerings(&tones)? {
//!         println!("{name}: {fingering}");
//!     }
//!
//!     Ok(())
//! }
//! # run().unwrap();
//! ```
//!
//! ## Features
//! - `serde`: serialize tones and fingerings (`{ "fret": .., "key": .. }` per string)
//! - `rayon`: search fret windows in parallel

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

/// Numbered-notation pitch model.
pub use tone::{Accidental, PitchClass, Tone, ToneError, Transposed, OCTAVE_MARK, SEMITONES};

/// Fretboard map and position lookup.
pub use fretboard::{Fretboard, DEFAULT_MAX_FRET, STANDARD_TONES, STANDARD_TUNING, STRING_COUNT};

/// Fingering search API.
pub use fingering::{
    derive_fingerings, Fingering, FingeringError, FingeringFinder, FingeringFinderBuilder,
    Position,
};

/// Chord naming API.
pub use chord_name::{name_chord, name_pitches, ChordError, ChordKind, ChordName, Third};

/// Tone module.
pub mod tone;

/// Fretboard module.
pub mod fretboard;

/// Fingering search module.
pub mod fingering;

/// Chord naming module.
pub mod chord_name;
