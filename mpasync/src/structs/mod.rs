//! Data structures representing format components.
//!
//! Contains the MPEG audio frame header and the container/tag signatures
//! recognized ahead of the first frame.

pub mod header;
pub mod marker;
