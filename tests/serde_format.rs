//! Wire format of fingerings as read by diagram renderers.
#![cfg(feature = "serde")]

use chord_fingering::{Fingering, FingeringFinder, Position, Tone};
use pretty_assertions::assert_eq;
use serde_json::json;

fn open_c() -> Fingering {
    FingeringFinder::new()
        .fingerings(&["1", "3", "5"])
        .unwrap()
        .into_iter()
        .find(|f| f.to_string() == "x-3-2-0-1-0")
        .expect("open C shape")
}

#[test]
fn fingering_serializes_string_one_first() {
    let value = serde_json::to_value(open_c()).unwrap();
    assert_eq!(
        value,
        json!([
            { "fret": 0, "key": "3" },
            { "fret": 1, "key": "1" },
            { "fret": 0, "key": "5" },
            { "fret": 2, "key": "3" },
            { "fret": 3, "key": "1" },
            { "fret": null, "key": null },
        ])
    );
}

#[test]
fn fingering_reads_back() {
    let text = serde_json::to_string(&open_c()).unwrap();
    let back: Fingering = serde_json::from_str(&text).unwrap();
    assert_eq!(back, open_c());
}

#[test]
fn half_muted_position_is_rejected() {
    let err = serde_json::from_value::<Position>(json!({ "fret": 3, "key": null }));
    assert!(err.is_err());
}

#[test]
fn tones_use_numbered_notation() {
    let tone: Tone = serde_json::from_value(json!("..#4")).unwrap();
    assert_eq!(tone.octave(), -2);
    assert_eq!(serde_json::to_value(tone).unwrap(), json!("..#4"));
    assert!(serde_json::from_value::<Tone>(json!("#3")).is_err());
}
