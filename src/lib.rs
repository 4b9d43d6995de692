//! # keytrack
//!
//! Streaming musical key estimation for audio analysis hosts, reporting the
//! key of the music as it plays.
//!
//! ## Features
//!
//! - **Progression tracking**: scale fit and chord-progression evidence,
//!   robust on pop and dance music with borrowed chords
//! - **Profile correlation**: empirical key profiles against a smoothed
//!   chromagram, with median smoothing of the decisions
//! - **Constant-Q chroma**: decimation and a sparse constant-Q kernel
//!   folded into 36 sub-semitone bins per octave
//! - **Key changes**: turn per-block estimates into a list of modulations
//!
//! ## Quick Start
//!
//! ```
//! use keytrack::{DetectorConfig, KeyDetector, KeyMethod};
//!
//! let config = DetectorConfig::new(KeyMethod::Progression, 44100.0);
//! let mut detector = KeyDetector::new(config)?;
//!
//! // Feed overlapping blocks: block_size() samples, hop_size() apart
//! let samples = vec![0.0f64; detector.block_size() + 4 * detector.hop_size()];
//! for block in samples.windows(detector.block_size()).step_by(detector.hop_size()) {
//!     match detector.process_key(block)? {
//!         Some(key) => println!("{}", key.label()),
//!         None => println!("no key"),
//!     }
//! }
//! # Ok::<(), keytrack::KeyError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Samples → Decimation → Constant-Q → Chroma (36 bins) → Key strategy → Key index
//! ```
//!
//! Key indices are `0` for no key, `1..=12` for C..B major and `13..=24` for
//! C..B minor; [`Key`] decodes them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod detector;
pub mod error;
pub mod features;
pub mod io;

// Re-export main types
pub use analysis::result::{Key, KEY_COUNT, NO_KEY};
pub use config::{DetectorConfig, KeyMethod};
pub use detector::KeyDetector;
pub use error::KeyError;
pub use features::chroma::{ChromaExtractor, ChromaFrontEnd};
pub use features::key::{
    detect_key_changes, strengths_in_fifths_order, KeyChange, KeyChangeTracker, KeyStrategy,
};
pub use io::BlockFramer;
