//! Object storage access
//!
//! Wraps `object_store` so inputs and outputs can live on S3, R2, GCS,
//! Azure or the local filesystem behind one [`Location`] type.

mod glob;
mod location;

pub use glob::Glob;
pub use location::Location;

#[cfg(test)]
mod tests;
