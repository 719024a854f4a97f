//! Domain models for the sequencer.
//!
//! This module contains the counter key, counter record and formatted
//! identifier types, plus the API contracts.

pub mod dto;
pub mod key;
pub mod sequence;

pub use dto::{ApiResponse, CurrentResponse, NextIdResponse, SequenceRequest};
pub use key::{CounterKey, DEFAULT_CLASS, SequenceClass, TenantId};
pub use sequence::{CounterRecord, FormattedId, SEQ_WIDTH};
