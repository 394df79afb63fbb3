//! Constants for the download module.

/// Capacity of the buffered writer that chunks are copied through.
pub const WRITE_BUFFER_BYTES: usize = 8192;
