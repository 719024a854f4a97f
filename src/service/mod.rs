//! Service layer module.
//!
//! Contains the sequence numbering logic.

pub mod sequence;

pub use sequence::SequenceService;
