//! # Fundos Ext File
//!
//! File-based implementations of the fundos source and sink traits.
//!
//! This crate provides:
//! - CSV directory source for extracted CVM disclosure members
//! - ZIP archive source, reading the archive from disk or over HTTP
//! - Filesystem object store writing Parquet, CSV or column-oriented JSON
//! - In-memory source and sink for tests and dry runs

#![warn(missing_docs)]
#![warn(clippy::all)]

mod archive;
mod memory;
mod source;
mod store;

pub use archive::*;
pub use memory::*;
pub use source::*;
pub use store::*;
