//! Input and output plumbing: line reading, decompression and JSON array writers.

pub mod compression;
pub mod json_array;
pub mod lines;
