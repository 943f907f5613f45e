//! Utility functions and supporting infrastructure.
//!
//! Provides bit-level field reading and the error types shared by the
//! header decoder and the stream prober.

pub mod bitstream_io;
pub mod errors;
