//! Audio I/O modules
//!
//! Framing of sample streams into the overlapping blocks a detector consumes.

pub mod sample_buffer;

pub use sample_buffer::BlockFramer;
