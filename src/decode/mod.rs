//! Record decoder module
//!
//! Turns raw JSON input files into Arrow record batches with a fixed schema.
//!
//! # Overview
//!
//! Input files hold JSON objects separated by whitespace: one object per
//! line for event logs, a single (possibly pretty-printed) object per file
//! for catalog records. A top-level array contributes each of its objects.
//! Keys missing from a record become null and keys absent from the schema
//! are ignored. Malformed JSON fails the whole run.

mod json;

pub use json::JsonRecordDecoder;

#[cfg(test)]
mod tests;
