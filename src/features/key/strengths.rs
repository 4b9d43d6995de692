//! Key strength presentation helpers

use crate::analysis::result::{Key, KEY_COUNT};

/// Keys around the circle of fifths, majors from F# going flatwards, then
/// the relative minors in the same order
const FIFTHS_ORDER: [Key; KEY_COUNT] = [
    Key::Major(6),
    Key::Major(11),
    Key::Major(4),
    Key::Major(9),
    Key::Major(2),
    Key::Major(7),
    Key::Major(0),
    Key::Major(5),
    Key::Major(10),
    Key::Major(3),
    Key::Major(8),
    Key::Major(1),
    Key::Minor(3),
    Key::Minor(8),
    Key::Minor(1),
    Key::Minor(6),
    Key::Minor(11),
    Key::Minor(4),
    Key::Minor(9),
    Key::Minor(2),
    Key::Minor(7),
    Key::Minor(0),
    Key::Minor(5),
    Key::Minor(10),
];

/// Reorder detector key strengths around the circle of fifths
///
/// `strengths` is indexed like [`crate::KeyDetector::key_strengths`]
/// (`[0..12]` C..B major, `[12..24]` C..B minor). Neighbouring keys in the
/// result share all but one pitch class, which makes the strengths easy to
/// plot.
///
/// # Example
///
/// ```
/// use keytrack::{strengths_in_fifths_order, Key};
///
/// let mut strengths = [0.0; 24];
/// strengths[0] = 1.0; // C major
/// let ordered = strengths_in_fifths_order(&strengths);
/// assert_eq!(ordered[6], (Key::Major(0), 1.0));
/// assert_eq!(ordered[18].0, Key::Minor(9)); // A minor lines up under C
/// ```
pub fn strengths_in_fifths_order(strengths: &[f64; KEY_COUNT]) -> [(Key, f64); KEY_COUNT] {
    let mut ordered = [(Key::Major(0), 0.0); KEY_COUNT];
    for (slot, key) in ordered.iter_mut().zip(FIFTHS_ORDER.iter()) {
        *slot = (*key, strengths[key.index() as usize - 1]);
    }
    ordered
}
