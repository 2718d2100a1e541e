//! Artifact emitters
//!
//! - `snapshot`: Rust module with every value fully expanded (name-sorted)
//! - `makefile`: make variables in dependency order plus standard rules
//!
//! Emitters only format text into an `io::Write`; file handling lives in
//! [`crate::configure`].

pub mod makefile;
pub mod snapshot;
