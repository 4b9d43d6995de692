//! Result types shared by the detectors

pub mod result;
