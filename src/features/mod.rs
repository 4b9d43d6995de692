//! Feature extraction modules
//!
//! - Chroma extraction (decimation, constant-Q, octave folding)
//! - Key estimation from chroma
pub mod chroma;
pub mod key;
