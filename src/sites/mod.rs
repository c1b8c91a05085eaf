//! Per-site course extractors.
//!
//! Each extractor drives a shared `Session` through one course URL at a time
//! and turns what it reads into a flat record.

pub mod coursera;
pub mod udemy;
