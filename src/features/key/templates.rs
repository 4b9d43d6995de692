//! Constant tables for both key strategies
//!
//! Chord and scale tables are indexed by semitone above the root (0 = root).
//! The 36-bin key profiles are indexed by sub-semitone bin above the tonic,
//! three bins per semitone with the tonic's center bin at index 0.

/// Major triad weights, also tolerant of power chords and single notes
pub const MAJOR_CHORD: [f64; 12] = [
    1.0, -0.5, 0.0, -0.5, 0.7, 0.0, -0.5, 0.7, -0.5, 0.0, -0.5, 0.0,
];

/// Minor triad weights
pub const MINOR_CHORD: [f64; 12] = [
    1.0, -0.5, 0.0, 0.7, -0.5, 0.0, -0.5, 0.7, 0.0, -0.5, 0.0, -0.5,
];

/// Likelihood of a chord occurring in a major key, indexed by chord root
/// relative to the key tonic; the first 12 entries are major chords, the
/// last 12 minor chords
///
/// I, IV and V weigh most; ii, iii and vi count for less; the diminished
/// vii is not detected.
pub const CHORD_TO_MAJOR_KEY: [f64; 24] = [
    1.8, -1.0, -1.0, -1.0, -1.0, 1.4, -1.0, 1.4, -1.0, -1.0, -1.0, 0.0, // major chords
    -1.0, -1.0, 0.5, -1.0, 0.5, -1.0, -1.0, -1.0, -1.0, 0.5, -1.0, -1.0, // minor chords
];

/// Likelihood of a chord occurring in a minor key, same layout
///
/// Major chords (III, VI, VII) are common in minor music too, so the minor
/// tonic, subdominant and dominant carry the extra weight.
pub const CHORD_TO_MINOR_KEY: [f64; 24] = [
    -1.0, -1.0, -1.0, 0.5, -1.0, -1.0, -1.0, -1.0, 0.5, -1.0, 0.5, 0.5, // major chords
    2.0, -1.0, 0.5, -1.0, -1.0, 1.5, -1.0, 1.5, -1.0, -1.0, -1.0, -1.0, // minor chords
];

/// Likelihood of a single note or power chord in a major key, by interval
/// above the tonic
pub const NOTE_TO_KEY: [f64; 12] = [
    0.6, -1.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, -1.0, 0.0, -1.0, 0.0,
];

/// Scale masks relative to a minor tonic: 0 = in scale, -1 = out of scale
///
/// Natural, melodic, harmonic and gypsy minor, in that order.
pub const MINOR_SCALES: [[f64; 12]; 4] = [
    // natural
    [0.0, -1.0, 0.0, 0.0, -1.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, -1.0],
    // melodic
    [0.0, -1.0, 0.0, 0.0, -1.0, 0.0, -1.0, 0.0, -1.0, 0.0, -1.0, 0.0],
    // harmonic
    [0.0, -1.0, 0.0, 0.0, -1.0, 0.0, -1.0, 0.0, 0.0, -1.0, -1.0, 0.0],
    // gypsy
    [0.0, -1.0, 0.0, 0.0, -1.0, -1.0, 0.0, 0.0, 0.0, -1.0, -1.0, 0.0],
];

/// Semitones from a minor tonic up to its relative major tonic
///
/// The scale masks are rotated by this, so scale transposition `k` names
/// the relative major tonic.
pub const RELATIVE_MAJOR_OFFSET: usize = 3;

/// Empirical major key profile, 36 bins, C major
pub const MAJOR_PROFILE: [f64; 36] = [
    0.0629, 0.0258, 0.0121, 0.0146, 0.0106, 0.0364, // C, C#
    0.0610, 0.0267, 0.0126, 0.0121, 0.0086, 0.0364, // D, D#
    0.0623, 0.0279, 0.0275, 0.0414, 0.0186, 0.0173, // E, F
    0.0248, 0.0145, 0.0364, 0.0631, 0.0262, 0.0129, // F#, G
    0.0150, 0.0098, 0.0312, 0.0521, 0.0235, 0.0129, // G#, A
    0.0142, 0.0095, 0.0289, 0.0478, 0.0239, 0.0384, // A#, B
];

/// Empirical minor key profile, 36 bins, C minor
pub const MINOR_PROFILE: [f64; 36] = [
    0.0682, 0.0299, 0.0119, 0.0138, 0.0093, 0.0296, // C, C#
    0.0543, 0.0257, 0.0292, 0.0519, 0.0246, 0.0159, // D, D#
    0.0234, 0.0135, 0.0291, 0.0544, 0.0223, 0.0169, // E, F
    0.0217, 0.0122, 0.0229, 0.0487, 0.0234, 0.0173, // F#, G
    0.0200, 0.0114, 0.0352, 0.0670, 0.0303, 0.0134, // G#, A
    0.0159, 0.0090, 0.0400, 0.0714, 0.0298, 0.0375, // A#, B
];

/// Key templates for the profile correlator, mean-removed
#[derive(Debug, Clone)]
pub struct KeyTemplates {
    /// Zero-mean major profile
    pub major: [f64; 36],

    /// Zero-mean minor profile
    pub minor: [f64; 36],
}

impl KeyTemplates {
    /// Mean-removed copies of [`MAJOR_PROFILE`] and [`MINOR_PROFILE`]
    pub fn new() -> Self {
        Self {
            major: zero_mean(&MAJOR_PROFILE),
            minor: zero_mean(&MINOR_PROFILE),
        }
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new()
    }
}

fn zero_mean(profile: &[f64; 36]) -> [f64; 36] {
    let mean = profile.iter().sum::<f64>() / profile.len() as f64;
    let mut out = *profile;
    for x in out.iter_mut() {
        *x -= mean;
    }
    out
}
