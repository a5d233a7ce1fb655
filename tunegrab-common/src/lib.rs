//! # tunegrab Common Library
//!
//! Shared code for the tunegrab service crates:
//! - Error types
//! - Configuration loading and temp folder resolution
//! - Filename sanitizing and output naming

pub mod config;
pub mod error;
pub mod naming;

pub use error::{Error, Result};
pub use naming::{sanitize_filename, track_file_stem};
